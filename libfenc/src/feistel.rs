//! Four-round balanced Feistel cipher over a whole-file block
//!
//! # Block Layout
//!
//! ```text
//! block = L ‖ R      |L| = 16      |R| = len − 16 ≥ 16
//! ```
//!
//! The whole file is one block; the right half grows with the file.
//!
//! # Rounds
//!
//! Two round shapes alternate:
//!
//! - **stream round** — the right half is XORed with an AES-128-CTR
//!   keystream keyed by the round key, with nonce `L[0..8]` and big-endian
//!   initial counter `L[8..16]`. The left half is unchanged.
//! - **hash round** — the left half is XORed with the first 16 bytes of
//!   `HMAC-SHA-256(round key, R)`. The right half is unchanged.
//!
//! Each round is an involution when the untouched half is held constant,
//! so decryption is the same rounds in reverse order with reversed keys;
//! there is no separate inverse algorithm.

use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr64BE;
use thiserror::Error;

use crate::mac;
use crate::schedule::{SubkeyBundle, SUBKEY_LEN};

/// Left-half length in bytes.
pub const LEFT_LEN: usize = 16;

/// Minimum block length: a full left half plus at least as long a right half.
pub const MIN_BLOCK_LEN: usize = 32;

/// Block shape errors
#[derive(Error, Debug)]
pub enum BlockError {
    /// The block is shorter than the minimum the geometry allows
    #[error("block must be at least {MIN_BLOCK_LEN} bytes, got {0}")]
    TooShort(usize),
}

fn check_len(block: &[u8]) -> Result<(), BlockError> {
    if block.len() < MIN_BLOCK_LEN {
        return Err(BlockError::TooShort(block.len()));
    }
    Ok(())
}

/// Stream round: mask the right half with a keystream seeded from the left.
fn round_stream(block: &mut [u8], key: &[u8; SUBKEY_LEN]) {
    let (left, right) = block.split_at_mut(LEFT_LEN);
    let mut cipher = Ctr64BE::<Aes128>::new(
        GenericArray::from_slice(key),
        GenericArray::from_slice(left),
    );
    cipher.apply_keystream(right);
}

/// Hash round: mask the left half with a keyed hash of the right.
fn round_hash(block: &mut [u8], key: &[u8; SUBKEY_LEN]) {
    let (left, right) = block.split_at_mut(LEFT_LEN);
    let tag = mac::authenticate(key, right);
    for (l, t) in left.iter_mut().zip(&tag[..LEFT_LEN]) {
        *l ^= t;
    }
}

/// Encrypt a block in place: stream(round1), hash(round2), stream(round3),
/// hash(round4).
pub fn encrypt(keys: &SubkeyBundle, block: &mut [u8]) -> Result<(), BlockError> {
    check_len(block)?;
    round_stream(block, &keys.round1);
    round_hash(block, &keys.round2);
    round_stream(block, &keys.round3);
    round_hash(block, &keys.round4);
    Ok(())
}

/// Decrypt a block in place: the encrypt sequence reversed, keys reversed.
pub fn decrypt(keys: &SubkeyBundle, block: &mut [u8]) -> Result<(), BlockError> {
    check_len(block)?;
    round_hash(block, &keys.round4);
    round_stream(block, &keys.round3);
    round_hash(block, &keys.round2);
    round_stream(block, &keys.round1);
    Ok(())
}
