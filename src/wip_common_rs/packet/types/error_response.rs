//! Error response packets (type 7). A string error code (not raw bytes)
//! identifies the failure so every service emits the same taxonomy.

use crate::wip_common_rs::packet::core::header::{CommonHeader, PacketType};
use crate::wip_common_rs::packet::core::{BitFieldError, Extensions, WipError, WipResult};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Wire error codes, matching the taxonomy exactly: no HTTP-status reuse.
pub const CODE_MALFORMED_PACKET: &str = "400";
pub const CODE_AUTH_FAILED: &str = "401";
pub const CODE_AUTH_REQUIRED: &str = "402";
pub const CODE_UNKNOWN_TYPE: &str = "403";
pub const CODE_AREA_NOT_FOUND: &str = "405";
pub const CODE_VALUE_OUT_OF_RANGE: &str = "406";
pub const CODE_PACKET_TOO_LARGE: &str = "413";
pub const CODE_TIMEOUT: &str = "421";
pub const CODE_RATE_LIMITED: &str = "420";
pub const CODE_VALIDATION_FAILED: &str = "422";
pub const CODE_UPSTREAM_UNAVAILABLE: &str = "520";

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub header: CommonHeader,
    pub error_code: String,
    pub source: Option<String>,
}

impl ErrorResponse {
    pub fn new(packet_id: u16, error_code: impl Into<String>) -> Self {
        let header = CommonHeader::new(packet_id, PacketType::Error, 0, now_unix());
        Self { header, error_code: error_code.into(), source: None }
    }

    pub fn from_error(packet_id: u16, error: &WipError) -> Self {
        Self::new(packet_id, error.wire_code())
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.header.ex_flag = true;
        self.source = Some(source.into());
        self
    }

    /// Errors in the 5xx-equivalent range are retryable; client-fault errors are not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.error_code.as_str(), CODE_TIMEOUT | CODE_RATE_LIMITED | CODE_UPSTREAM_UNAVAILABLE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.to_bytes().to_vec();
        out.extend((self.error_code.len() as u16).to_le_bytes());
        out.extend(self.error_code.as_bytes());

        let ext = Extensions { source: self.source.clone(), ..Default::default() };
        out.extend(ext.encode());
        out
    }

    pub fn from_bytes(data: &[u8]) -> WipResult<Self> {
        let header = CommonHeader::from_bytes(data)?;
        if header.packet_type != PacketType::Error {
            return Err(BitFieldError::new("not an error response packet").into());
        }
        if data.len() < 18 {
            return Err(BitFieldError::new("error response missing code length field").into());
        }
        let code_len = u16::from_le_bytes([data[16], data[17]]) as usize;
        let code_start = 18;
        let code_end = code_start + code_len;
        if data.len() < code_end {
            return Err(BitFieldError::new("error response code truncated").into());
        }
        let error_code = String::from_utf8(data[code_start..code_end].to_vec())
            .map_err(|e| BitFieldError::new(format!("non-utf8 error code: {e}")))?;
        let ext = if data.len() > code_end { Extensions::decode(&data[code_end..])? } else { Extensions::default() };
        Ok(Self { header, error_code, source: ext.source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_code_and_source() {
        let err = ErrorResponse::new(9, CODE_AREA_NOT_FOUND).with_source("10.0.0.1:4111");
        let bytes = err.to_bytes();
        let parsed = ErrorResponse::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.error_code, CODE_AREA_NOT_FOUND);
        assert_eq!(parsed.source.as_deref(), Some("10.0.0.1:4111"));
    }

    #[test]
    fn timeout_and_upstream_errors_are_not_fatal() {
        assert!(!ErrorResponse::new(1, CODE_TIMEOUT).is_fatal());
        assert!(!ErrorResponse::new(1, CODE_UPSTREAM_UNAVAILABLE).is_fatal());
        assert!(ErrorResponse::new(1, CODE_MALFORMED_PACKET).is_fatal());
    }

    #[test]
    fn maps_from_wip_error_variants() {
        let err = WipError::validation("temperature out of range");
        let resp = ErrorResponse::from_error(1, &err);
        assert_eq!(resp.error_code, CODE_VALIDATION_FAILED);
    }
}
