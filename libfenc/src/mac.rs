//! Keyed authentication — HMAC-SHA-256
//!
//! One primitive serves two roles: with the MAC subkey it authenticates a
//! file's ciphertext, with the term subkey it blinds search-index tokens.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::schedule::SUBKEY_LEN;

/// Tag length in bytes (SHA-256 digest size).
pub const TAG_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA-256 of `msg` under a 16-byte subkey.
pub fn authenticate(key: &[u8; SUBKEY_LEN], msg: &[u8]) -> [u8; TAG_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(msg);
    mac.finalize().into_bytes().into()
}

/// Tag as lowercase hex, the form stored in sidecars and compared against
/// them. Both sides of such comparisons are already public to anyone
/// holding the sidecar.
pub fn authenticate_hex(key: &[u8; SUBKEY_LEN], msg: &[u8]) -> String {
    hex::encode(authenticate(key, msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let key = [0x42u8; SUBKEY_LEN];
        assert_eq!(authenticate(&key, b"payload"), authenticate(&key, b"payload"));
    }

    #[test]
    fn test_key_sensitivity() {
        let a = authenticate(&[1u8; SUBKEY_LEN], b"payload");
        let b = authenticate(&[2u8; SUBKEY_LEN], b"payload");
        assert_ne!(a, b);
    }

    #[test]
    fn test_message_sensitivity() {
        let key = [9u8; SUBKEY_LEN];
        let a = authenticate(&key, b"payload");
        let b = authenticate(&key, b"payloae");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_shape() {
        let tag = authenticate_hex(&[0u8; SUBKEY_LEN], b"");
        assert_eq!(tag.len(), 64);
        assert!(tag.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
