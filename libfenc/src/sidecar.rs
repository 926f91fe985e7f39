//! Sidecar metadata — the JSON blob stored next to each encrypted file
//!
//! # Layout
//!
//! ```text
//! {
//!   "salt":      32 lowercase hex chars  (16-byte per-file salt)
//!   "validator": 32 lowercase hex chars  (first subkey of the schedule)
//!   "mac":       64 lowercase hex chars  (HMAC-SHA-256 of the ciphertext)
//!   "terms":     array of 64-hex entries (blinded search tokens)
//! }
//! ```
//!
//! The sidecar of `report.txt` is `.fenc-meta.report.txt` in the same
//! directory. Sidecar present ⇔ the file's bytes are ciphertext; that
//! invariant is what encrypt/decrypt pre-flight checks lean on.
//!
//! Serialization is plain `serde_json`; readers accept any JSON whitespace.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filename prefix marking a sidecar.
pub const SIDECAR_PREFIX: &str = ".fenc-meta.";

/// Sidecar load/store errors
#[derive(Error, Debug)]
pub enum SidecarError {
    /// Filesystem failure reading or writing the sidecar
    #[error("sidecar I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sidecar is not the expected JSON object
    #[error("malformed sidecar JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A hex field has the wrong shape
    #[error("sidecar field `{field}` is not {expected} lowercase hex chars")]
    FieldShape {
        /// Offending field name
        field: &'static str,
        /// Expected hex length
        expected: usize,
    },
}

/// Per-file metadata persisted while the file is encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    /// Per-file salt, lowercase hex.
    pub salt: String,
    /// Password validator (first subkey), lowercase hex.
    pub validator: String,
    /// HMAC-SHA-256 tag over the ciphertext, lowercase hex.
    pub mac: String,
    /// Blinded search tokens, sorted and unique.
    pub terms: Vec<String>,
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s.bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl Sidecar {
    /// Path of the sidecar belonging to `file`.
    pub fn path_for(file: &Path) -> PathBuf {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file.with_file_name(format!("{SIDECAR_PREFIX}{name}"))
    }

    /// Original filename for a sidecar path, or `None` if the path is not
    /// a sidecar.
    pub fn original_name(sidecar: &Path) -> Option<String> {
        sidecar
            .file_name()?
            .to_str()?
            .strip_prefix(SIDECAR_PREFIX)
            .filter(|rest| !rest.is_empty())
            .map(str::to_owned)
    }

    /// True when `file` currently has a sidecar.
    pub fn exists_for(file: &Path) -> bool {
        Self::path_for(file).is_file()
    }

    /// Load and shape-check a sidecar by its own path.
    pub fn load(path: &Path) -> Result<Self, SidecarError> {
        let raw = fs::read_to_string(path)?;
        let sidecar: Self = serde_json::from_str(&raw)?;
        sidecar.validate_shape()?;
        Ok(sidecar)
    }

    /// Load the sidecar belonging to `file`.
    pub fn load_for(file: &Path) -> Result<Self, SidecarError> {
        Self::load(&Self::path_for(file))
    }

    /// Serialize and write this sidecar next to `file`.
    pub fn store_for(&self, file: &Path) -> Result<(), SidecarError> {
        let json = serde_json::to_string(self)?;
        fs::write(Self::path_for(file), json)?;
        Ok(())
    }

    /// Remove the sidecar belonging to `file`.
    pub fn remove_for(file: &Path) -> Result<(), SidecarError> {
        fs::remove_file(Self::path_for(file))?;
        Ok(())
    }

    /// All sidecar paths directly inside `dir`, sorted by file name.
    pub fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>, SidecarError> {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_sidecar = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(SIDECAR_PREFIX));
            if is_sidecar && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    fn validate_shape(&self) -> Result<(), SidecarError> {
        if !is_lower_hex(&self.salt, 32) {
            return Err(SidecarError::FieldShape {
                field: "salt",
                expected: 32,
            });
        }
        if !is_lower_hex(&self.validator, 32) {
            return Err(SidecarError::FieldShape {
                field: "validator",
                expected: 32,
            });
        }
        if !is_lower_hex(&self.mac, 64) {
            return Err(SidecarError::FieldShape {
                field: "mac",
                expected: 64,
            });
        }
        for term in &self.terms {
            if !is_lower_hex(term, 64) {
                return Err(SidecarError::FieldShape {
                    field: "terms",
                    expected: 64,
                });
            }
        }
        Ok(())
    }
}
