//! Packet core: bit utilities, the common header codec, the TLV extension
//! codec, the checksum, and the crate-wide error type.

pub mod bit_utils;
pub mod checksum;
pub mod error;
pub mod ext;
pub mod header;

pub use bit_utils::{bytes_to_u128_le, extract_bits, set_bits, u128_to_bytes_le};
pub use checksum::{calc_checksum12, embed_checksum12, verify_checksum12};
pub use error::{BitFieldError, WipError, WipResult};
pub use ext::Extensions;
pub use header::{CommonHeader, PacketType, HEADER_BYTES, WIP_VERSION};
