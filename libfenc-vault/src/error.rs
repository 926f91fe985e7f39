//! Error taxonomy for envelope operations
//!
//! Pre-flight errors (paths, sizes, sidecar state, password) abort a whole
//! batch before any file is touched. [`VaultError::Tampered`] is the one
//! per-file error: the affected file is skipped and the batch proceeds.
//! Non-UTF-8 plaintext is not an error anywhere; it only empties the
//! search-term set.

use thiserror::Error;

/// Result alias for envelope operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Envelope and batch errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Missing or non-regular input paths. Pre-flight, batch-aborting.
    #[error("Invalid filepaths for the following filenames: {0}")]
    InvalidPaths(String),

    /// Inputs below the 32-byte block minimum. Pre-flight, batch-aborting.
    #[error("File size should be greater than 31 bytes for the following filenames: {0}")]
    FileTooSmall(String),

    /// Decrypt requested for files without a sidecar.
    #[error("{0} are unencrypted, \nNo files were decrypted")]
    NotEncrypted(String),

    /// Encrypt requested for files that already have a sidecar.
    #[error("{0} are already encrypted, \nNo files were encrypted")]
    AlreadyEncrypted(String),

    /// Password validator mismatch during batch decrypt.
    #[error("The password did not match for the following filenames: {0}")]
    PasswordMismatch(String),

    /// Search found no sidecar the password opens.
    #[error("No encrypted files matched the password")]
    NoSidecarsMatched,

    /// The password read from the user was empty.
    #[error("Password must not be empty")]
    EmptyPassword,

    /// Ciphertext failed authentication. Per-file, non-fatal: the file and
    /// its sidecar are left untouched.
    #[error("{0} has been tampered with and has not been decrypted")]
    Tampered(String),

    /// Sidecar parse or shape failure.
    #[error(transparent)]
    Sidecar(#[from] fenc_core::sidecar::SidecarError),

    /// Salt field failure.
    #[error(transparent)]
    Salt(#[from] fenc_core::kdf::SaltError),

    /// Block geometry failure.
    #[error(transparent)]
    Block(#[from] fenc_core::feistel::BlockError),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
