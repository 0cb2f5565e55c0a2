// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Provisioning and PIN verification
//!
//! Both principals share a single master key, wrapped independently under a
//! KEK derived from each secret and the card salt. A verification attempt is
//! charged against the retry counter _before_ the key is checked, and only
//! refunded (reset) on success.

use rand_core::CryptoRngCore;

use gamecard_apdu::IDENTITY_LEN;

use super::{record::Record, Driver, Engine, Error, Output, Principal, Store};
use crate::crypto::{
    check_key, derive_kek, key_hash, unwrap, wrap, KdfKind, MasterKey, SALT_LEN,
};

#[cfg(feature = "signer")]
use super::signer::IdentityKey;

/// Minimum holder PIN length
pub const PIN_MIN_LEN: usize = 4;

/// Maximum holder PIN length
pub const PIN_MAX_LEN: usize = 16;

/// Minimum admin secret length
pub const ADMIN_PIN_MIN_LEN: usize = 8;

/// Maximum admin secret length
pub const ADMIN_PIN_MAX_LEN: usize = 32;

/// Check a secret length for the provided principal
fn check_len(p: Principal, secret: &[u8]) -> Result<(), Error> {
    let (min, max) = match p {
        Principal::Holder => (PIN_MIN_LEN, PIN_MAX_LEN),
        Principal::Admin => (ADMIN_PIN_MIN_LEN, ADMIN_PIN_MAX_LEN),
    };

    match (min..=max).contains(&secret.len()) {
        true => Ok(()),
        false => Err(Error::InvalidPin),
    }
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Provision a blank card.
    ///
    /// The new store is built in full before it replaces the blank one.
    pub(crate) fn provision(
        &mut self,
        pin: &[u8],
        identity: &[u8; IDENTITY_LEN],
    ) -> Result<Output, Error> {
        if self.store.is_initialized() {
            return Err(Error::AlreadyInitialized);
        }

        check_len(Principal::Holder, pin)?;
        check_len(Principal::Admin, &self.config.admin_secret)?;

        let kdf = self.caps.kdf();

        let mut salt = [0u8; SALT_LEN];
        self.rng.fill_bytes(&mut salt);

        let master_key = MasterKey::random(&mut self.rng);

        let holder_key = wrap(&master_key, &derive_kek(kdf, pin, &salt), &mut self.rng);
        let admin_key = wrap(
            &master_key,
            &derive_kek(kdf, &self.config.admin_secret, &salt),
            &mut self.rng,
        );

        let profile = Record::fresh().seal(&master_key, &mut self.rng)?;

        let mut s = Store::new();
        s.identity = *identity;
        s.salt = salt;
        s.kdf = kdf;
        s.holder_key = holder_key;
        s.admin_key = admin_key;
        s.key_hash = key_hash(&master_key);
        s.profile = profile;
        s.initialized = true;

        #[cfg(feature = "signer")]
        let key = match self.caps.signer {
            true => {
                let k = IdentityKey::generate(&mut self.rng, self.config.rsa_bits)?;
                let p = k.public_key()?;
                s.signer = Some(k);
                Some(p)
            }
            false => None,
        };
        #[cfg(not(feature = "signer"))]
        let key = None;

        // Commit
        self.session.clear();
        self.store = s;

        #[cfg(feature = "log")]
        log::info!("provisioned card ({} kdf)", kdf);

        Ok(Output::Provisioned { key })
    }

    /// Verify a principal's secret, opening a session on success
    pub(crate) fn verify(&mut self, p: Principal, secret: &[u8]) -> Result<Output, Error> {
        if !self.store.is_initialized() {
            return Err(Error::NotInitialized);
        }

        // Any verification attempt drops the current session for the principal
        self.session.close(p);

        let wrapped = match p {
            Principal::Holder => &self.store.holder_key,
            Principal::Admin => &self.store.admin_key,
        };
        let retry = match p {
            Principal::Holder => &mut self.store.holder_retry,
            Principal::Admin => &mut self.store.admin_retry,
        };

        // Locked principals answer blocked whatever the secret
        if retry.locked() {
            return Err(Error::Blocked);
        }

        check_len(p, secret)?;

        if self.store.kdf == KdfKind::Strong && !self.caps.strong_kdf {
            return Err(Error::NotSupported);
        }

        let remaining = retry.consume();

        let kek = derive_kek(self.store.kdf, secret, &self.store.salt);
        let candidate = unwrap(wrapped, &kek);

        if !check_key(&candidate, &self.store.key_hash) {
            #[cfg(feature = "log")]
            log::warn!("{} verification failed, {} attempts remaining", p, remaining);

            return match remaining {
                0 => Err(Error::Blocked),
                n => Err(Error::WrongPin(n)),
            };
        }

        retry.reset();
        self.session.open(p, candidate);

        Ok(Output::None)
    }

    /// Admin-issued holder unlock, optionally re-wrapping the master key
    /// under a new holder PIN
    pub(crate) fn admin_unlock(&mut self, new_pin: Option<&[u8]>) -> Result<Output, Error> {
        self.require(Principal::Admin)?;

        if let Some(pin) = new_pin {
            self.rewrap_holder(Principal::Admin, pin)?;
        }

        self.store.holder_retry.reset();

        #[cfg(feature = "log")]
        log::info!("holder unlocked (pin replaced: {})", new_pin.is_some());

        Ok(Output::None)
    }

    /// Replace the holder PIN from a verified holder session
    pub(crate) fn change_pin(&mut self, new_pin: &[u8]) -> Result<Output, Error> {
        self.require(Principal::Holder)?;

        self.rewrap_holder(Principal::Holder, new_pin)?;
        self.store.holder_retry.reset();

        Ok(Output::None)
    }

    /// Wrap the session master key under a new holder PIN, the admin
    /// wrapping and salt are untouched
    fn rewrap_holder(&mut self, via: Principal, pin: &[u8]) -> Result<(), Error> {
        check_len(Principal::Holder, pin)?;

        if self.store.kdf == KdfKind::Strong && !self.caps.strong_kdf {
            return Err(Error::NotSupported);
        }

        let master_key = self
            .session
            .master_key(via)
            .ok_or(Error::VerificationRequired)?;

        let kek = derive_kek(self.store.kdf, pin, &self.store.salt);
        self.store.holder_key = wrap(master_key, &kek, &mut self.rng);

        Ok(())
    }
}
