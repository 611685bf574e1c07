//! The 128-bit common header shared by every packet type.
//!
//! Bit layout (LSB-first, little-endian on the wire):
//!
//! ```text
//! 0..4    version
//! 4..16   packet_id
//! 16..19  packet_type
//! 19..20  weather_flag
//! 20..21  temperature_flag
//! 21..22  pop_flag
//! 22..23  alert_flag
//! 23..24  disaster_flag
//! 24..25  ex_flag
//! 25..26  request_auth
//! 26..27  response_auth
//! 27..30  day
//! 30..32  reserved
//! 32..96  timestamp
//! 96..116 area_code
//! 116..128 checksum
//! ```

use super::bit_utils::{bytes_to_u128_le, extract_bits, set_bits, u128_to_bytes_le};
use super::checksum::{embed_checksum12, verify_checksum12};
use super::error::{BitFieldError, WipResult};

pub const HEADER_BYTES: usize = 16;
pub const WIP_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PacketType {
    LocationRequest = 0,
    LocationResponse = 1,
    QueryRequest = 2,
    QueryResponse = 3,
    ReportRequest = 4,
    ReportResponse = 5,
    Error = 7,
}

impl PacketType {
    pub fn from_u8(value: u8) -> WipResult<Self> {
        match value {
            0 => Ok(PacketType::LocationRequest),
            1 => Ok(PacketType::LocationResponse),
            2 => Ok(PacketType::QueryRequest),
            3 => Ok(PacketType::QueryResponse),
            4 => Ok(PacketType::ReportRequest),
            5 => Ok(PacketType::ReportResponse),
            7 => Ok(PacketType::Error),
            other => Err(BitFieldError::new(format!("unknown packet type {other}")).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonHeader {
    pub version: u8,
    pub packet_id: u16,
    pub packet_type: PacketType,
    pub weather_flag: bool,
    pub temperature_flag: bool,
    pub pop_flag: bool,
    pub alert_flag: bool,
    pub disaster_flag: bool,
    pub ex_flag: bool,
    pub request_auth: bool,
    pub response_auth: bool,
    pub day: u8,
    pub timestamp: u64,
    pub area_code: u32,
}

impl CommonHeader {
    pub fn new(packet_id: u16, packet_type: PacketType, area_code: u32, timestamp: u64) -> Self {
        Self {
            version: WIP_VERSION,
            packet_id,
            packet_type,
            weather_flag: false,
            temperature_flag: false,
            pop_flag: false,
            alert_flag: false,
            disaster_flag: false,
            ex_flag: false,
            request_auth: false,
            response_auth: false,
            day: 0,
            timestamp,
            area_code,
        }
    }

    /// Serializes the header into a 16-byte buffer with a valid checksum.
    pub fn to_bytes(&self) -> [u8; HEADER_BYTES] {
        let mut bits: u128 = 0;
        set_bits(&mut bits, 0, 4, self.version as u128);
        set_bits(&mut bits, 4, 12, self.packet_id as u128);
        set_bits(&mut bits, 16, 3, self.packet_type as u128);
        set_bits(&mut bits, 19, 1, self.weather_flag as u128);
        set_bits(&mut bits, 20, 1, self.temperature_flag as u128);
        set_bits(&mut bits, 21, 1, self.pop_flag as u128);
        set_bits(&mut bits, 22, 1, self.alert_flag as u128);
        set_bits(&mut bits, 23, 1, self.disaster_flag as u128);
        set_bits(&mut bits, 24, 1, self.ex_flag as u128);
        set_bits(&mut bits, 25, 1, self.request_auth as u128);
        set_bits(&mut bits, 26, 1, self.response_auth as u128);
        set_bits(&mut bits, 27, 3, self.day as u128);
        // 30..32 reserved, left zero.
        set_bits(&mut bits, 32, 64, self.timestamp as u128);
        set_bits(&mut bits, 96, 20, self.area_code as u128);

        let mut out = [0u8; HEADER_BYTES];
        u128_to_bytes_le(bits, &mut out);
        embed_checksum12(&mut out);
        out
    }

    /// Parses the first 16 bytes of `data` and verifies the checksum.
    pub fn from_bytes(data: &[u8]) -> WipResult<Self> {
        if data.len() < HEADER_BYTES {
            return Err(BitFieldError::new(format!(
                "insufficient data: need {HEADER_BYTES} bytes, got {}",
                data.len()
            ))
            .into());
        }
        if !verify_checksum12(&data[..HEADER_BYTES]) {
            return Err(BitFieldError::new("checksum mismatch").into());
        }

        let bits = bytes_to_u128_le(&data[..HEADER_BYTES]);
        let version = extract_bits(bits, 0, 4) as u8;
        if version != WIP_VERSION {
            return Err(BitFieldError::new(format!("unsupported version {version}")).into());
        }

        Ok(Self {
            version,
            packet_id: extract_bits(bits, 4, 12) as u16,
            packet_type: PacketType::from_u8(extract_bits(bits, 16, 3) as u8)?,
            weather_flag: extract_bits(bits, 19, 1) != 0,
            temperature_flag: extract_bits(bits, 20, 1) != 0,
            pop_flag: extract_bits(bits, 21, 1) != 0,
            alert_flag: extract_bits(bits, 22, 1) != 0,
            disaster_flag: extract_bits(bits, 23, 1) != 0,
            ex_flag: extract_bits(bits, 24, 1) != 0,
            request_auth: extract_bits(bits, 25, 1) != 0,
            response_auth: extract_bits(bits, 26, 1) != 0,
            day: extract_bits(bits, 27, 3) as u8,
            timestamp: extract_bits(bits, 32, 64) as u64,
            area_code: extract_bits(bits, 96, 20) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let mut header = CommonHeader::new(0xABC, PacketType::QueryRequest, 130010, 1_700_000_000);
        header.weather_flag = true;
        header.alert_flag = true;
        header.day = 3;

        let bytes = header.to_bytes();
        let parsed = CommonHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn rejects_short_buffers() {
        assert!(CommonHeader::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn rejects_bad_checksum() {
        let header = CommonHeader::new(1, PacketType::LocationRequest, 1, 1);
        let mut bytes = header.to_bytes();
        bytes[0] ^= 0xFF;
        assert!(CommonHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn packet_id_wraps_within_twelve_bits() {
        let header = CommonHeader::new(0x0FFF, PacketType::ReportRequest, 1, 1);
        let bytes = header.to_bytes();
        let parsed = CommonHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.packet_id, 0x0FFF);
    }
}
