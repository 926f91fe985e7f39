//! Batch orchestration and pre-flight validation
//!
//! A single invocation may name many files. Every pre-flight check
//! (existence, size, sidecar presence or absence, and the decrypt password
//! validator) runs against *all* files before *any* file is mutated. One
//! failing file aborts the whole batch untouched.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use fenc_core::{feistel, Salt, Sidecar};

use crate::envelope::{self, display_name};
use crate::error::{VaultError, VaultResult};
use crate::keys::FileKeys;

/// Key material retained for one processed file, for the JSON dump.
pub struct FileReport {
    /// The filename as the user named it (bare name in search mode).
    pub name: String,
    /// Derived key hierarchy.
    pub keys: FileKeys,
}

// `FileKeys` holds secret key material and deliberately has no `Debug` impl;
// redact it here rather than deriving, so debug output never carries key bytes.
impl fmt::Debug for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReport")
            .field("name", &self.name)
            .field("keys", &"<redacted>")
            .finish()
    }
}

/// Outcome of one file inside a decrypt batch.
pub enum DecryptReport {
    /// Decrypted in place; sidecar removed.
    Decrypted(FileReport),
    /// MAC mismatch; file and sidecar left untouched.
    Tampered(String),
}

impl fmt::Debug for DecryptReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decrypted(r) => f.debug_tuple("Decrypted").field(r).finish(),
            Self::Tampered(name) => f.debug_tuple("Tampered").field(name).finish(),
        }
    }
}

/// Result of a directory-wide search.
pub struct SearchOutcome {
    /// Password-matching sidecars, by bare filename.
    pub reports: Vec<FileReport>,
    /// `(query, matching bare filenames)` in query order.
    pub matches: Vec<(String, Vec<String>)>,
    /// Bare filenames skipped because the password did not match.
    pub skipped: Vec<String>,
}

impl fmt::Debug for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOutcome")
            .field("reports", &self.reports)
            .field("matches", &self.matches)
            .field("skipped", &self.skipped)
            .finish()
    }
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn check_regular_files(files: &[PathBuf]) -> VaultResult<()> {
    let invalid: Vec<String> = files
        .iter()
        .filter(|f| !f.is_file())
        .map(|f| display_name(f))
        .collect();
    if !invalid.is_empty() {
        return Err(VaultError::InvalidPaths(join_names(&invalid)));
    }
    Ok(())
}

/// Encrypt a batch of files under one password.
pub fn encrypt_batch(files: &[PathBuf], password: &str) -> VaultResult<Vec<FileReport>> {
    check_regular_files(files)?;

    let small: Vec<String> = files
        .iter()
        .filter(|f| {
            fs::metadata(f)
                .map(|m| m.len() < feistel::MIN_BLOCK_LEN as u64)
                .unwrap_or(true)
        })
        .map(|f| display_name(f))
        .collect();
    if !small.is_empty() {
        return Err(VaultError::FileTooSmall(join_names(&small)));
    }

    let already: Vec<String> = files
        .iter()
        .filter(|f| Sidecar::exists_for(f))
        .map(|f| display_name(f))
        .collect();
    if !already.is_empty() {
        return Err(VaultError::AlreadyEncrypted(join_names(&already)));
    }

    debug!("encrypting {} file(s)", files.len());
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let keys = envelope::encrypt_file(file, password)?;
        reports.push(FileReport {
            name: display_name(file),
            keys,
        });
    }
    Ok(reports)
}

/// Decrypt a batch of files under one password.
///
/// Tampered files are reported in place of their result; every other
/// failure aborts the batch before any file is written.
pub fn decrypt_batch(files: &[PathBuf], password: &str) -> VaultResult<Vec<DecryptReport>> {
    check_regular_files(files)?;

    let missing: Vec<String> = files
        .iter()
        .filter(|f| !Sidecar::exists_for(f))
        .map(|f| display_name(f))
        .collect();
    if !missing.is_empty() {
        return Err(VaultError::NotEncrypted(join_names(&missing)));
    }

    // Derive and validate the password for every file before touching any.
    let mut prepared = Vec::with_capacity(files.len());
    let mut mismatched = Vec::new();
    for file in files {
        let sidecar = Sidecar::load_for(file)?;
        let salt = Salt::from_hex(&sidecar.salt)?;
        let keys = FileKeys::derive(password, &salt);
        if !keys.matches_validator(&sidecar.validator) {
            mismatched.push(display_name(file));
        }
        prepared.push((file.as_path(), sidecar, keys));
    }
    if !mismatched.is_empty() {
        return Err(VaultError::PasswordMismatch(join_names(&mismatched)));
    }

    debug!("decrypting {} file(s)", files.len());
    let mut reports = Vec::with_capacity(prepared.len());
    for (file, sidecar, keys) in prepared {
        match envelope::decrypt_prepared(file, &sidecar, keys) {
            Ok(keys) => reports.push(DecryptReport::Decrypted(FileReport {
                name: display_name(file),
                keys,
            })),
            Err(VaultError::Tampered(name)) => reports.push(DecryptReport::Tampered(name)),
            Err(e) => return Err(e),
        }
    }
    Ok(reports)
}

/// Search every sidecar in `dir` for `queries` under one password.
///
/// Sidecars the password does not open are skipped with a warning; zero
/// opened sidecars is an error.
pub fn search_batch(dir: &Path, queries: &[String], password: &str) -> VaultResult<SearchOutcome> {
    let mut opened: Vec<(String, Sidecar, FileKeys)> = Vec::new();
    let mut skipped = Vec::new();

    for sidecar_path in Sidecar::scan_dir(dir)? {
        let name = match Sidecar::original_name(&sidecar_path) {
            Some(n) => n,
            None => continue,
        };
        let sidecar = Sidecar::load(&sidecar_path)?;
        let salt = Salt::from_hex(&sidecar.salt)?;
        let keys = FileKeys::derive(password, &salt);
        if keys.matches_validator(&sidecar.validator) {
            opened.push((name, sidecar, keys));
        } else {
            warn!("{name}: password does not match, skipping");
            skipped.push(name);
        }
    }

    if opened.is_empty() {
        return Err(VaultError::NoSidecarsMatched);
    }

    let matches = queries
        .iter()
        .map(|query| {
            let hits: Vec<String> = opened
                .iter()
                .filter(|(_, sidecar, keys)| envelope::query_matches(sidecar, keys, query))
                .map(|(name, _, _)| name.clone())
                .collect();
            (query.clone(), hits)
        })
        .collect();

    let reports = opened
        .into_iter()
        .map(|(name, _, keys)| FileReport { name, keys })
        .collect();

    Ok(SearchOutcome {
        reports,
        matches,
        skipped,
    })
}
