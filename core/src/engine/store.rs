// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Persistent secret store
//!
//! Everything in a [`Store`] survives power loss (and is what a host
//! serialises as the card image). Nothing in here is plaintext secret
//! material: master keys are only held wrapped, and the profile only
//! encrypted.

use heapless::Vec;
use zeroize::Zeroize;

use gamecard_apdu::IDENTITY_LEN;

use super::{blob::Blob, record::PROFILE_CAPACITY};
use crate::crypto::{KdfKind, KEY_HASH_LEN, SALT_LEN, WRAPPED_KEY_LEN};

#[cfg(feature = "signer")]
use super::signer::IdentityKey;

/// Verification attempt limit, for both holder and admin
pub const PIN_TRY_LIMIT: u8 = 3;

/// Per-principal retry counter and sticky lock flag
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryState {
    pub(crate) remaining: u8,
    pub(crate) locked: bool,
}

impl RetryState {
    pub const fn new() -> Self {
        Self {
            remaining: PIN_TRY_LIMIT,
            locked: false,
        }
    }

    /// Remaining attempts
    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Lockout flag, set when the counter reaches zero
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Consume an attempt, setting the lock flag on the last one
    pub(crate) fn consume(&mut self) -> u8 {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.locked = true;
        }
        self.remaining
    }

    /// Reset counter and clear lock flag
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistent card state
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Store {
    pub(crate) initialized: bool,

    pub(crate) identity: [u8; IDENTITY_LEN],
    pub(crate) salt: [u8; SALT_LEN],
    pub(crate) kdf: KdfKind,

    /// Master key wrapped under the holder PIN
    pub(crate) holder_key: [u8; WRAPPED_KEY_LEN],
    /// Master key wrapped under the admin secret
    pub(crate) admin_key: [u8; WRAPPED_KEY_LEN],
    /// SHA-256 of the master key
    pub(crate) key_hash: [u8; KEY_HASH_LEN],

    pub(crate) holder_retry: RetryState,
    pub(crate) admin_retry: RetryState,

    /// Encrypted profile, `IV || ciphertext`
    pub(crate) profile: Vec<u8, PROFILE_CAPACITY>,

    pub(crate) blob: Blob,

    #[cfg(feature = "signer")]
    pub(crate) signer: Option<IdentityKey>,
}

impl Store {
    /// Create a blank (unprovisioned) store
    pub const fn new() -> Self {
        Self {
            initialized: false,
            identity: [0u8; IDENTITY_LEN],
            salt: [0u8; SALT_LEN],
            kdf: KdfKind::Simple,
            holder_key: [0u8; WRAPPED_KEY_LEN],
            admin_key: [0u8; WRAPPED_KEY_LEN],
            key_hash: [0u8; KEY_HASH_LEN],
            holder_retry: RetryState::new(),
            admin_retry: RetryState::new(),
            profile: Vec::new(),
            blob: Blob::new(),
            #[cfg(feature = "signer")]
            signer: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Card identity, `None` on a blank card
    pub fn identity(&self) -> Option<&[u8; IDENTITY_LEN]> {
        match self.initialized {
            true => Some(&self.identity),
            false => None,
        }
    }

    /// KDF used for both wrapped keys
    pub fn kdf(&self) -> KdfKind {
        self.kdf
    }

    pub fn holder_retry(&self) -> &RetryState {
        &self.holder_retry
    }

    pub fn admin_retry(&self) -> &RetryState {
        &self.admin_retry
    }

    /// Check whether an identity signing key is present
    pub fn has_signer(&self) -> bool {
        #[cfg(feature = "signer")]
        return self.signer.is_some();

        #[cfg(not(feature = "signer"))]
        return false;
    }

    /// Wipe all persistent state back to a blank card
    pub fn wipe(&mut self) {
        self.identity.zeroize();
        self.salt.zeroize();
        self.holder_key.zeroize();
        self.admin_key.zeroize();
        self.key_hash.zeroize();
        self.profile.as_mut_slice().zeroize();
        self.blob.wipe();

        // Dropping the identity key zeroizes it
        *self = Self::new();
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retry_counter_locks_at_zero() {
        let mut r = RetryState::new();

        assert_eq!(r.consume(), 2);
        assert_eq!(r.consume(), 1);
        assert!(!r.locked());

        assert_eq!(r.consume(), 0);
        assert!(r.locked());

        // Saturates, stays locked
        assert_eq!(r.consume(), 0);
        assert!(r.locked());

        r.reset();
        assert_eq!(r, RetryState::new());
    }

    #[test]
    fn wipe_resets_store() {
        let mut s = Store::new();
        s.initialized = true;
        s.identity = [0xaa; IDENTITY_LEN];
        s.holder_retry.consume();
        s.profile.extend_from_slice(&[0x55; 32]).unwrap();

        s.wipe();

        assert_eq!(s, Store::new());
        assert_eq!(s.identity(), None);
    }
}
