//! Single-file envelope operations
//!
//! In-place encrypt and decrypt of one file plus membership search against
//! its sidecar. Write ordering is part of the contract: on encrypt the
//! ciphertext lands before the sidecar; on decrypt the plaintext lands
//! before the sidecar is removed. A crash between the two steps leaves a
//! state the sidecar invariant (sidecar present ⇔ ciphertext) identifies.
//!
//! File writes go through a temp file in the same directory, fsync, then
//! rename, so an interrupted write never leaves a half-written file.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;

use fenc_core::{feistel, index, mac, Salt, Sidecar};

use crate::error::{VaultError, VaultResult};
use crate::keys::FileKeys;

/// The filename as reported in user-facing messages: the path as given.
pub(crate) fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn write_replacing(path: &Path, data: &[u8]) -> VaultResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".fenc-tmp-")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| VaultError::Io(e.error))?;
    Ok(())
}

/// Encrypt `path` in place under `password` and write its sidecar.
///
/// Returns the derived key material for the optional JSON dump.
pub fn encrypt_file(path: &Path, password: &str) -> VaultResult<FileKeys> {
    let salt = Salt::generate();
    let keys = FileKeys::derive(password, &salt);

    let mut block = fs::read(path)?;
    if block.len() < feistel::MIN_BLOCK_LEN {
        return Err(VaultError::FileTooSmall(display_name(path)));
    }

    let terms = index::blind_terms(&keys.subkeys.term_key, &block);
    debug!("{}: {} blinded terms", path.display(), terms.len());

    feistel::encrypt(&keys.subkeys, &mut block)?;
    let tag = mac::authenticate_hex(&keys.subkeys.mac_key, &block);

    write_replacing(path, &block)?;
    Sidecar {
        salt: salt.to_hex(),
        validator: keys.subkeys.validator_hex(),
        mac: tag,
        terms,
    }
    .store_for(path)?;

    debug!("{}: encrypted ({} bytes)", path.display(), block.len());
    Ok(keys)
}

/// Decrypt `path` using a sidecar and keys already validated by the
/// caller. Authenticates the current file bytes before any write; a MAC
/// mismatch returns [`VaultError::Tampered`] and touches nothing.
pub fn decrypt_prepared(path: &Path, sidecar: &Sidecar, keys: FileKeys) -> VaultResult<FileKeys> {
    let mut block = fs::read(path)?;

    let tag = mac::authenticate_hex(&keys.subkeys.mac_key, &block);
    if tag != sidecar.mac {
        return Err(VaultError::Tampered(display_name(path)));
    }

    feistel::decrypt(&keys.subkeys, &mut block)?;
    write_replacing(path, &block)?;
    Sidecar::remove_for(path)?;

    debug!("{}: decrypted ({} bytes)", path.display(), block.len());
    Ok(keys)
}

/// Decrypt `path` in place under `password`.
///
/// Full single-file flow: load sidecar, derive keys, check the validator
/// before the file is read, then authenticate and decrypt.
pub fn decrypt_file(path: &Path, password: &str) -> VaultResult<FileKeys> {
    let sidecar = Sidecar::load_for(path)?;
    let salt = Salt::from_hex(&sidecar.salt)?;
    let keys = FileKeys::derive(password, &salt);
    if !keys.matches_validator(&sidecar.validator) {
        return Err(VaultError::PasswordMismatch(display_name(path)));
    }
    decrypt_prepared(path, &sidecar, keys)
}

/// True when `query`, normalized and blinded, appears in the sidecar's
/// term set.
pub fn query_matches(sidecar: &Sidecar, keys: &FileKeys, query: &str) -> bool {
    let blinded = index::blind_query(&keys.subkeys.term_key, query);
    sidecar.terms.iter().any(|t| t == &blinded)
}
