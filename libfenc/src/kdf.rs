//! Password-based key derivation
//!
//! A (password, salt) pair is stretched into a 32-byte master key with
//! PBKDF2-HMAC-SHA-256 at a fixed iteration count. The master key is
//! ephemeral: it exists only while a single file is being processed and is
//! zeroized on drop. Only the salt is ever persisted.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// PBKDF2 iteration count. Fixed: sidecars written under one count cannot
/// be opened under another.
pub const PBKDF2_ITERATIONS: u32 = 250_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Master key length in bytes.
pub const MASTER_KEY_LEN: usize = 32;

/// Salt parsing errors
#[derive(Error, Debug)]
pub enum SaltError {
    /// The sidecar field is not valid hex
    #[error("salt is not valid hex")]
    InvalidHex,

    /// The decoded salt has the wrong length
    #[error("salt must be {SALT_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Per-file random salt, persisted in the sidecar as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Generate a fresh random salt.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap raw salt bytes.
    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the lowercase-hex sidecar field.
    pub fn from_hex(s: &str) -> Result<Self, SaltError> {
        let raw = hex::decode(s).map_err(|_| SaltError::InvalidHex)?;
        if raw.len() != SALT_LEN {
            return Err(SaltError::InvalidLength(raw.len()));
        }
        let mut bytes = [0u8; SALT_LEN];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    /// Lowercase hex, the sidecar form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

/// 32-byte master key derived from (password, salt). Never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
    /// Derive the master key for a password and salt.
    ///
    /// The password is UTF-8 encoded; there are no length limits beyond
    /// PBKDF2's own.
    pub fn derive(password: &str, salt: &Salt) -> Self {
        let mut key = [0u8; MASTER_KEY_LEN];
        pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            salt.as_bytes(),
            PBKDF2_ITERATIONS,
            &mut key,
        );
        Self(key)
    }

    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }

    /// Lowercase hex, for the optional JSON key dump.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // PBKDF2-HMAC-SHA-256 vector from RFC 7914, section 11.
    #[test]
    fn test_pbkdf2_reference_vector() {
        let mut out = [0u8; 64];
        pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc\
             49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let salt = Salt::from_bytes([7u8; SALT_LEN]);
        let a = MasterKey::derive("password", &salt);
        let b = MasterKey::derive("password", &salt);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_salt_changes_key() {
        let a = MasterKey::derive("password", &Salt::from_bytes([1u8; SALT_LEN]));
        let b = MasterKey::derive("password", &Salt::from_bytes([2u8; SALT_LEN]));
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_password_changes_key() {
        let salt = Salt::from_bytes([1u8; SALT_LEN]);
        let a = MasterKey::derive("password", &salt);
        let b = MasterKey::derive("Password", &salt);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn test_salt_hex_roundtrip() {
        let salt = Salt::generate();
        let parsed = Salt::from_hex(&salt.to_hex()).unwrap();
        assert_eq!(salt, parsed);
    }

    #[test]
    fn test_salt_rejects_bad_hex() {
        assert!(matches!(
            Salt::from_hex("not hex at all"),
            Err(SaltError::InvalidHex)
        ));
        assert!(matches!(
            Salt::from_hex("00112233"),
            Err(SaltError::InvalidLength(4))
        ));
    }
}
