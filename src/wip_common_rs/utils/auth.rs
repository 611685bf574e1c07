//! Per-packet authentication: `MD5(packet_id_be ∥ timestamp_be ∥ passphrase)`.
//!
//! There is no session state here — each request/response pair is
//! authenticated independently against the passphrase configured for that
//! service, per [`crate::wip_common_rs::packet::core::header::CommonHeader`]'s
//! `request_auth`/`response_auth` flags.

use subtle::ConstantTimeEq;

pub struct WipAuth;

impl WipAuth {
    /// Computes the 16-byte MD5 digest over `packet_id` (big-endian u16),
    /// `timestamp` (big-endian u64), and the passphrase's utf-8 bytes.
    pub fn calculate_auth_hash(packet_id: u16, timestamp: u64, passphrase: &str) -> [u8; 16] {
        let mut buf = Vec::with_capacity(2 + 8 + passphrase.len());
        buf.extend_from_slice(&packet_id.to_be_bytes());
        buf.extend_from_slice(&timestamp.to_be_bytes());
        buf.extend_from_slice(passphrase.as_bytes());
        md5::compute(&buf).0
    }

    /// Constant-time comparison against a freshly computed hash.
    pub fn verify_auth_hash(packet_id: u16, timestamp: u64, passphrase: &str, received_hash: &[u8; 16]) -> bool {
        let expected = Self::calculate_auth_hash(packet_id, timestamp, passphrase);
        expected.ct_eq(received_hash).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = WipAuth::calculate_auth_hash(42, 1_700_000_000, "secret");
        let b = WipAuth::calculate_auth_hash(42, 1_700_000_000, "secret");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_produce_different_hashes() {
        let a = WipAuth::calculate_auth_hash(42, 1_700_000_000, "secret");
        let b = WipAuth::calculate_auth_hash(43, 1_700_000_000, "secret");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_accepts_matching_hash_and_rejects_tampered_one() {
        let hash = WipAuth::calculate_auth_hash(7, 99, "hunter2");
        assert!(WipAuth::verify_auth_hash(7, 99, "hunter2", &hash));
        let mut tampered = hash;
        tampered[0] ^= 0xFF;
        assert!(!WipAuth::verify_auth_hash(7, 99, "hunter2", &tampered));
    }

    #[test]
    fn wrong_passphrase_fails_verification() {
        let hash = WipAuth::calculate_auth_hash(7, 99, "hunter2");
        assert!(!WipAuth::verify_auth_hash(7, 99, "wrong", &hash));
    }
}
