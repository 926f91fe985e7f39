//! Per-file key material
//!
//! Everything derived from (password, salt) for one file operation. The
//! whole hierarchy is dropped — and zeroized by the underlying types — as
//! soon as the operation finishes; nothing derived outlives it.

use std::fmt;

use fenc_core::{MasterKey, Salt, SubkeyBundle};

/// The derived key hierarchy for a single file.
pub struct FileKeys {
    /// 32-byte PBKDF2 output.
    pub master: MasterKey,
    /// The seven scheduled subkeys.
    pub subkeys: SubkeyBundle,
}

// `MasterKey`/`SubkeyBundle` deliberately have no `Debug` impl since they hold
// secret key material; redact here instead of deriving.
impl fmt::Debug for FileKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileKeys").field("master", &"<redacted>").field("subkeys", &"<redacted>").finish()
    }
}

impl FileKeys {
    /// Derive master key and subkey bundle for (password, salt).
    pub fn derive(password: &str, salt: &Salt) -> Self {
        let master = MasterKey::derive(password, salt);
        let subkeys = SubkeyBundle::expand(&master);
        Self { master, subkeys }
    }

    /// True when this password reproduces the stored validator.
    pub fn matches_validator(&self, validator_hex: &str) -> bool {
        self.subkeys.validator_hex() == validator_hex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_roundtrip() {
        let salt = Salt::generate();
        let keys = FileKeys::derive("hunter2", &salt);
        let stored = keys.subkeys.validator_hex();

        assert!(FileKeys::derive("hunter2", &salt).matches_validator(&stored));
        assert!(!FileKeys::derive("hunter3", &salt).matches_validator(&stored));
    }
}
