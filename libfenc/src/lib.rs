//! fenc cryptographic engine
//!
//! Core primitives for `fenc`, the in-place password file encryptor:
//!
//! - **Key Derivation**: PBKDF2-HMAC-SHA-256 stretches (password, salt)
//!   into a 32-byte master key
//! - **Key Schedule**: AES-128-CTR expands the master key into seven
//!   16-byte subkeys
//! - **Cipher**: four-round balanced Feistel construction over the whole
//!   file, built from AES-128-CTR and HMAC-SHA-256
//! - **Authentication**: HMAC-SHA-256 tag binding ciphertext to metadata
//! - **Search Index**: blinded word and prefix tokens, equality-searchable
//!   without decryption
//!
//! Everything here is a pure in-memory transformation. File handling,
//! batch validation, and the CLI live in the `fenc-vault` crate.

#![warn(missing_docs)]

pub mod feistel;
pub mod index;
pub mod kdf;
pub mod mac;
pub mod schedule;
pub mod sidecar;

pub use kdf::{MasterKey, Salt};
pub use schedule::SubkeyBundle;
pub use sidecar::{Sidecar, SIDECAR_PREFIX};

/// Engine crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_engine_roundtrip() {
        // password -> master -> subkeys -> encrypt -> decrypt
        let salt = Salt::generate();
        let master = MasterKey::derive("correct horse battery staple", &salt);
        let subkeys = SubkeyBundle::expand(&master);

        let plaintext = b"a block of at least thirty-two bytes of text".to_vec();
        let mut block = plaintext.clone();

        feistel::encrypt(&subkeys, &mut block).unwrap();
        assert_ne!(block, plaintext);

        feistel::decrypt(&subkeys, &mut block).unwrap();
        assert_eq!(block, plaintext);
    }
}
