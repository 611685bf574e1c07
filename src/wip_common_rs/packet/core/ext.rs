//! Variable-length TLV extension area.
//!
//! Each entry is a 16-bit little-endian header (6-bit key id, 10-bit byte
//! length) followed by that many value bytes. `alert`/`disaster` repeat as
//! separate entries to represent lists; `latitude`/`longitude` are 4-byte
//! little-endian signed fixed-point (degrees * 1e6); `source` is a utf-8
//! `"ip:port"` string; `auth_hash` is 16 raw bytes.

use super::error::{BitFieldError, WipResult};

const KEY_ALERT: u16 = 1;
const KEY_DISASTER: u16 = 2;
const KEY_LATITUDE: u16 = 33;
const KEY_LONGITUDE: u16 = 34;
const KEY_SOURCE: u16 = 40;
const KEY_AUTH_HASH: u16 = 41;

const KEY_BITS: u16 = 6;
const KEY_MASK: u16 = (1 << KEY_BITS) - 1;
const MAX_LEN: usize = (1 << 10) - 1;

const COORD_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    pub alerts: Vec<String>,
    pub disasters: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: Option<String>,
    pub auth_hash: Option<[u8; 16]>,
}

impl Extensions {
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
            && self.disasters.is_empty()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.source.is_none()
            && self.auth_hash.is_none()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for alert in &self.alerts {
            push_entry(&mut out, KEY_ALERT, alert.as_bytes());
        }
        for disaster in &self.disasters {
            push_entry(&mut out, KEY_DISASTER, disaster.as_bytes());
        }
        if let Some(lat) = self.latitude {
            push_entry(&mut out, KEY_LATITUDE, &encode_coord(lat));
        }
        if let Some(lon) = self.longitude {
            push_entry(&mut out, KEY_LONGITUDE, &encode_coord(lon));
        }
        if let Some(source) = &self.source {
            push_entry(&mut out, KEY_SOURCE, source.as_bytes());
        }
        if let Some(hash) = &self.auth_hash {
            push_entry(&mut out, KEY_AUTH_HASH, hash);
        }
        out
    }

    pub fn decode(data: &[u8]) -> WipResult<Self> {
        let mut ext = Extensions::default();
        let mut offset = 0usize;

        while offset < data.len() {
            if offset + 2 > data.len() {
                return Err(BitFieldError::new("truncated TLV entry header").into());
            }
            let raw = u16::from_le_bytes([data[offset], data[offset + 1]]);
            let key = raw & KEY_MASK;
            let len = (raw >> KEY_BITS) as usize;
            offset += 2;

            if offset + len > data.len() {
                return Err(BitFieldError::new(format!(
                    "TLV entry for key {key} declares {len} bytes but only {} remain",
                    data.len() - offset
                ))
                .into());
            }
            let value = &data[offset..offset + len];
            offset += len;

            match key {
                KEY_ALERT => ext.alerts.push(decode_utf8(value)?),
                KEY_DISASTER => ext.disasters.push(decode_utf8(value)?),
                KEY_LATITUDE => ext.latitude = Some(decode_coord(value)?),
                KEY_LONGITUDE => ext.longitude = Some(decode_coord(value)?),
                KEY_SOURCE => ext.source = Some(decode_utf8(value)?),
                KEY_AUTH_HASH => {
                    let hash: [u8; 16] = value
                        .try_into()
                        .map_err(|_| BitFieldError::new("auth_hash must be exactly 16 bytes"))?;
                    ext.auth_hash = Some(hash);
                }
                other => return Err(BitFieldError::new(format!("unknown extension key {other}")).into()),
            }
        }

        Ok(ext)
    }
}

fn push_entry(out: &mut Vec<u8>, key: u16, value: &[u8]) {
    debug_assert!(value.len() <= MAX_LEN, "extension value too long for 10-bit length field");
    let header = (key & KEY_MASK) | ((value.len() as u16) << KEY_BITS);
    out.extend_from_slice(&header.to_le_bytes());
    out.extend_from_slice(value);
}

fn decode_utf8(value: &[u8]) -> WipResult<String> {
    String::from_utf8(value.to_vec()).map_err(|e| BitFieldError::new(format!("non-utf8 extension value: {e}")).into())
}

fn encode_coord(degrees: f64) -> [u8; 4] {
    let fixed = (degrees * COORD_SCALE).round() as i32;
    fixed.to_le_bytes()
}

fn decode_coord(value: &[u8]) -> WipResult<f64> {
    let bytes: [u8; 4] = value
        .try_into()
        .map_err(|_| BitFieldError::new("coordinate value must be exactly 4 bytes"))?;
    Ok(i32::from_le_bytes(bytes) as f64 / COORD_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_extensions_round_trip() {
        let ext = Extensions::default();
        assert!(ext.is_empty());
        let encoded = ext.encode();
        assert!(encoded.is_empty());
        assert_eq!(Extensions::decode(&encoded).unwrap(), ext);
    }

    #[test]
    fn coordinates_round_trip_to_six_decimal_places() {
        let ext = Extensions {
            latitude: Some(35.681236),
            longitude: Some(139.767125),
            ..Default::default()
        };
        let decoded = Extensions::decode(&ext.encode()).unwrap();
        assert!((decoded.latitude.unwrap() - 35.681236).abs() < 1e-6);
        assert!((decoded.longitude.unwrap() - 139.767125).abs() < 1e-6);
    }

    #[test]
    fn negative_coordinates_round_trip() {
        let ext = Extensions {
            latitude: Some(-33.868_82),
            longitude: Some(-70.0),
            ..Default::default()
        };
        let decoded = Extensions::decode(&ext.encode()).unwrap();
        assert!((decoded.latitude.unwrap() + 33.868_82).abs() < 1e-6);
        assert!((decoded.longitude.unwrap() + 70.0).abs() < 1e-6);
    }

    #[test]
    fn alert_list_preserves_order_and_repeats() {
        let ext = Extensions {
            alerts: vec!["heavy-rain".into(), "flood-watch".into()],
            ..Default::default()
        };
        let decoded = Extensions::decode(&ext.encode()).unwrap();
        assert_eq!(decoded.alerts, ext.alerts);
    }

    #[test]
    fn source_and_auth_hash_round_trip() {
        let ext = Extensions {
            source: Some("127.0.0.1:9999".into()),
            auth_hash: Some([0xAB; 16]),
            ..Default::default()
        };
        let decoded = Extensions::decode(&ext.encode()).unwrap();
        assert_eq!(decoded.source, ext.source);
        assert_eq!(decoded.auth_hash, ext.auth_hash);
    }

    #[test]
    fn truncated_entry_is_rejected() {
        let raw = [(1u16 | (10u16 << KEY_BITS)).to_le_bytes()[0], (1u16 | (10u16 << KEY_BITS)).to_le_bytes()[1], 1, 2];
        assert!(Extensions::decode(&raw).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut data = Vec::new();
        push_entry(&mut data, 63, b"x");
        assert!(Extensions::decode(&data).is_err());
    }
}
