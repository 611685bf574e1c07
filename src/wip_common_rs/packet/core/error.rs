//! Crate-wide error taxonomy.
//!
//! Every failure surfaces as one of five tagged kinds so callers can branch
//! on `match` instead of string comparison. Codec failures in particular
//! collapse to a single `BitFieldError(message)` per the wire format's own
//! error model; there is no per-field error type to pattern-match against.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A codec-level failure: malformed header, bad checksum, an extension value
/// outside its declared range, or a TLV stream that ends mid-entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitFieldError(pub String);

impl BitFieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for BitFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BitFieldError {}

#[derive(Debug, Error)]
pub enum WipError {
    #[error("codec error: {0}")]
    Codec(#[from] BitFieldError),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl WipError {
    pub fn codec(message: impl Into<String>) -> Self {
        WipError::Codec(BitFieldError::new(message))
    }

    pub fn auth(message: impl Into<String>) -> Self {
        WipError::Auth(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        WipError::Validation(message.into())
    }

    /// The string error code this failure maps to on the wire (type-7 packets).
    pub fn wire_code(&self) -> &'static str {
        match self {
            WipError::Codec(_) => "400",
            WipError::Auth(_) => "401",
            WipError::Validation(_) => "422",
            WipError::Io(_) => "520",
            WipError::Timeout(_) => "421",
        }
    }
}

pub type WipResult<T> = Result<T, WipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_code_mapping() {
        assert_eq!(WipError::codec("bad checksum").wire_code(), "400");
        assert_eq!(WipError::auth("missing hash").wire_code(), "401");
        assert_eq!(WipError::validation("temp out of range").wire_code(), "422");
        assert_eq!(WipError::Timeout(Duration::from_secs(1)).wire_code(), "421");
    }

    #[test]
    fn bitfield_error_displays_message() {
        let e = BitFieldError::new("insufficient data: need 16, got 4");
        assert_eq!(e.to_string(), "insufficient data: need 16, got 4");
    }
}
