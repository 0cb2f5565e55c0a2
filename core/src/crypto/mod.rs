// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key derivation and wrapping
//!
//! The master key is wrapped as `IV || AES-128-CBC(KEK, master_key)` under a
//! KEK derived from a secret and the card salt. Unwrapping never fails, a
//! wrong KEK yields a garbage candidate which is rejected by comparing its
//! SHA-256 against the stored integrity hash with [`check_key`].
//!
//! Secret-bearing types ([`Kek`], [`MasterKey`]) are zeroized on drop.

use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub(crate) mod cbc;

mod kdf;
pub use kdf::{derive_kek, KdfKind, PBKDF2_ROUNDS};

/// Salt length
pub const SALT_LEN: usize = 16;

/// Master key / KEK length (AES-128)
pub const KEY_LEN: usize = 16;

/// CBC IV length
pub const IV_LEN: usize = 16;

/// Wrapped key length (`IV || ciphertext`)
pub const WRAPPED_KEY_LEN: usize = IV_LEN + KEY_LEN;

/// Master key integrity hash length
pub const KEY_HASH_LEN: usize = 32;

/// Key-encryption-key, derived from a PIN or admin secret
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Kek([u8; KEY_LEN]);

impl Kek {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Master key protecting the encrypted profile
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Generate a new random master key
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        let mut k = Self([0u8; KEY_LEN]);
        rng.fill_bytes(&mut k.0);
        k
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Key material is never printed
impl core::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MasterKey(..)")
    }
}

/// Wrap the master key under a KEK with a fresh random IV
pub fn wrap(
    master_key: &MasterKey,
    kek: &Kek,
    rng: &mut impl CryptoRngCore,
) -> [u8; WRAPPED_KEY_LEN] {
    let mut wrapped = [0u8; WRAPPED_KEY_LEN];

    let (iv, ct) = wrapped.split_at_mut(IV_LEN);
    rng.fill_bytes(iv);
    ct.copy_from_slice(&master_key.0);

    let mut i = [0u8; IV_LEN];
    i.copy_from_slice(iv);
    cbc::encrypt(&kek.0, &i, ct);

    wrapped
}

/// Unwrap a master key candidate, check it with [`check_key`] before use
pub fn unwrap(wrapped: &[u8; WRAPPED_KEY_LEN], kek: &Kek) -> MasterKey {
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&wrapped[..IV_LEN]);

    let mut k = MasterKey([0u8; KEY_LEN]);
    k.0.copy_from_slice(&wrapped[IV_LEN..]);

    cbc::decrypt(&kek.0, &iv, &mut k.0);

    k
}

/// Compute the integrity hash of a master key
pub fn key_hash(master_key: &MasterKey) -> [u8; KEY_HASH_LEN] {
    Sha256::digest(&master_key.0).into()
}

/// Check a master key candidate against the stored integrity hash
/// (constant time)
pub fn check_key(candidate: &MasterKey, hash: &[u8; KEY_HASH_LEN]) -> bool {
    key_hash(candidate)[..].ct_eq(&hash[..]).into()
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;

    #[test]
    fn wrap_unwrap() {
        let salt = [0x11; SALT_LEN];

        for kind in [KdfKind::Simple, KdfKind::Strong] {
            for pin in [&b"1234"[..], &b"0000000000000000"[..], &b"hunter22"[..]] {
                let master = MasterKey::random(&mut OsRng);
                let kek = derive_kek(kind, pin, &salt);

                let wrapped = wrap(&master, &kek, &mut OsRng);
                let unwrapped = unwrap(&wrapped, &derive_kek(kind, pin, &salt));

                assert_eq!(master.as_bytes(), unwrapped.as_bytes());
                assert!(check_key(&unwrapped, &key_hash(&master)));
            }
        }
    }

    #[test]
    fn wrap_uses_fresh_iv() {
        let master = MasterKey::random(&mut OsRng);
        let kek = derive_kek(KdfKind::Simple, b"1234", &[0u8; SALT_LEN]);

        let a = wrap(&master, &kek, &mut OsRng);
        let b = wrap(&master, &kek, &mut OsRng);

        assert_ne!(a, b);
    }

    #[test]
    fn wrong_kek_fails_hash_check() {
        let salt = [0x22; SALT_LEN];
        let master = MasterKey::random(&mut OsRng);

        let wrapped = wrap(&master, &derive_kek(KdfKind::Simple, b"1234", &salt), &mut OsRng);
        let candidate = unwrap(&wrapped, &derive_kek(KdfKind::Simple, b"4321", &salt));

        assert!(!check_key(&candidate, &key_hash(&master)));
    }
}
