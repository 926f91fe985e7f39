//! Key schedule — master-key expansion into the seven-subkey bundle
//!
//! The 32-byte master key is split into AES-128-CTR parameters and the
//! keystream over a 112-byte zero buffer is cut into seven 16-byte subkeys:
//!
//! ```text
//! master[0..16]   AES-128 key
//! master[16..24]  8-byte nonce
//! master[24..32]  8-byte big-endian initial counter
//!
//! keystream[0..16]    validator  (password check, stored in the sidecar)
//! keystream[16..32]   round1     (Feistel round 1)
//! keystream[32..48]   round2     (Feistel round 2)
//! keystream[48..64]   round3     (Feistel round 3)
//! keystream[64..80]   round4     (Feistel round 4)
//! keystream[80..96]   mac_key    (ciphertext authentication)
//! keystream[96..112]  term_key   (search term blinding)
//! ```
//!
//! The key/nonce/counter split and the slice order are load-bearing:
//! a sidecar written by one build must validate under any other.

use aes::Aes128;
use cipher::generic_array::GenericArray;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr64BE;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::kdf::MasterKey;

/// Subkey length in bytes.
pub const SUBKEY_LEN: usize = 16;

/// Number of subkeys in a bundle.
pub const SUBKEY_COUNT: usize = 7;

type ScheduleCipher = Ctr64BE<Aes128>;

/// The seven 16-byte subkeys derived from one master key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SubkeyBundle {
    /// Password validator, stored in the sidecar verbatim.
    pub validator: [u8; SUBKEY_LEN],
    /// First Feistel round key.
    pub round1: [u8; SUBKEY_LEN],
    /// Second Feistel round key.
    pub round2: [u8; SUBKEY_LEN],
    /// Third Feistel round key.
    pub round3: [u8; SUBKEY_LEN],
    /// Fourth Feistel round key.
    pub round4: [u8; SUBKEY_LEN],
    /// Ciphertext MAC key.
    pub mac_key: [u8; SUBKEY_LEN],
    /// Search-term blinding key.
    pub term_key: [u8; SUBKEY_LEN],
}

impl SubkeyBundle {
    /// Expand a master key into the full bundle. Deterministic: identical
    /// masters yield identical bundles.
    pub fn expand(master: &MasterKey) -> Self {
        let m = master.as_bytes();

        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&m[16..24]);
        iv[8..].copy_from_slice(&m[24..32]);

        let mut keystream = [0u8; SUBKEY_LEN * SUBKEY_COUNT];
        let mut cipher = ScheduleCipher::new(
            GenericArray::from_slice(&m[..16]),
            GenericArray::from_slice(&iv),
        );
        cipher.apply_keystream(&mut keystream);

        let slice = |i: usize| {
            let mut k = [0u8; SUBKEY_LEN];
            k.copy_from_slice(&keystream[i * SUBKEY_LEN..(i + 1) * SUBKEY_LEN]);
            k
        };

        let bundle = Self {
            validator: slice(0),
            round1: slice(1),
            round2: slice(2),
            round3: slice(3),
            round4: slice(4),
            mac_key: slice(5),
            term_key: slice(6),
        };
        keystream.zeroize();
        bundle
    }

    /// Validator as lowercase hex, the sidecar form.
    pub fn validator_hex(&self) -> String {
        hex::encode(self.validator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::MASTER_KEY_LEN;

    fn master(byte: u8) -> MasterKey {
        MasterKey::from_bytes([byte; MASTER_KEY_LEN])
    }

    #[test]
    fn test_expand_is_deterministic() {
        let a = SubkeyBundle::expand(&master(9));
        let b = SubkeyBundle::expand(&master(9));
        assert_eq!(a.validator, b.validator);
        assert_eq!(a.round1, b.round1);
        assert_eq!(a.round4, b.round4);
        assert_eq!(a.term_key, b.term_key);
    }

    #[test]
    fn test_subkeys_pairwise_distinct() {
        let b = SubkeyBundle::expand(&master(3));
        let keys = [
            b.validator,
            b.round1,
            b.round2,
            b.round3,
            b.round4,
            b.mac_key,
            b.term_key,
        ];
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i], keys[j], "subkeys {i} and {j} collide");
            }
        }
    }

    #[test]
    fn test_different_masters_different_bundles() {
        let a = SubkeyBundle::expand(&master(0));
        let b = SubkeyBundle::expand(&master(1));
        assert_ne!(a.validator, b.validator);
        assert_ne!(a.term_key, b.term_key);
    }

    // Guards the slice order: the bundle must equal the raw keystream over
    // a zero buffer, cut in declaration order.
    #[test]
    fn test_bundle_matches_keystream_slices() {
        let mk = master(0x5a);
        let m = mk.as_bytes();

        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&m[16..24]);
        iv[8..].copy_from_slice(&m[24..32]);
        let mut keystream = [0u8; SUBKEY_LEN * SUBKEY_COUNT];
        let mut cipher = ScheduleCipher::new(
            GenericArray::from_slice(&m[..16]),
            GenericArray::from_slice(&iv),
        );
        cipher.apply_keystream(&mut keystream);

        let b = SubkeyBundle::expand(&mk);
        assert_eq!(b.validator, keystream[0..16]);
        assert_eq!(b.round1, keystream[16..32]);
        assert_eq!(b.round2, keystream[32..48]);
        assert_eq!(b.round3, keystream[48..64]);
        assert_eq!(b.round4, keystream[64..80]);
        assert_eq!(b.mac_key, keystream[80..96]);
        assert_eq!(b.term_key, keystream[96..112]);
    }

    #[test]
    fn test_validator_hex_shape() {
        let b = SubkeyBundle::expand(&master(0));
        let v = b.validator_hex();
        assert_eq!(v.len(), 32);
        assert!(v.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
