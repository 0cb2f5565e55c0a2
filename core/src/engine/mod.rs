// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] provides the game card application logic.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for APDU protocol / encoding definitions.
//!
//! Persistent state lives in a [Store] owned by the engine, transient
//! authentication state in a [Session] which is cleared on every
//! `SELECT` / [Engine::deselect].

use heapless::Vec;
use rand_core::{CryptoRngCore, OsRng};

use gamecard_apdu::app_info::AppFlags;

use crate::crypto::KdfKind;

mod auth;
pub use auth::{ADMIN_PIN_MAX_LEN, ADMIN_PIN_MIN_LEN, PIN_MAX_LEN, PIN_MIN_LEN};

mod blob;
pub use blob::{Blob, BLOB_CAPACITY, MAX_CHUNK};

mod dispatch;

mod economy;

mod error;
pub use error::Error;

mod event;
pub use event::{Event, Secret};

mod output;
pub use output::{Output, PublicKey, Signature, MAX_EXPONENT_LEN, MAX_MODULUS_LEN};

mod record;
pub use record::{MAX_OWNED_GAMES, PROFILE_CAPACITY, RECORD_SIZE};

mod session;
pub use session::{Principal, Session};

#[cfg(feature = "signer")]
mod signer;
#[cfg(feature = "signer")]
pub use signer::IdentityKey;

mod store;
pub use store::{RetryState, Store, PIN_TRY_LIMIT};

/// Largest supported identity key size
pub const MAX_RSA_BITS: usize = 1024;

/// Default identity key size
pub const RSA_BITS: usize = 1024;

/// Admin recovery secret installed at provisioning unless configured otherwise
pub const DEFAULT_ADMIN_SECRET: &[u8] = b"gamecard-admin-recovery";

/// Platform capabilities, resolved once when the [Engine] is created
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CapabilitySet {
    /// Iterated (PBKDF2) KDF available
    pub strong_kdf: bool,
    /// RSA identity signer available
    pub signer: bool,
}

impl CapabilitySet {
    /// All capabilities supported by this build
    pub const fn all() -> Self {
        Self {
            strong_kdf: true,
            signer: cfg!(feature = "signer"),
        }
    }

    /// KDF used when provisioning
    pub fn kdf(&self) -> KdfKind {
        match self.strong_kdf {
            true => KdfKind::Strong,
            false => KdfKind::Simple,
        }
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::all()
    }
}

/// Engine policy configuration
#[derive(Clone, PartialEq, Debug)]
pub struct Config {
    /// Admin secret wrapped at provisioning
    pub admin_secret: Vec<u8, ADMIN_PIN_MAX_LEN>,

    /// Require a verified holder session for `BlobStart`
    pub blob_start_auth: bool,

    /// Identity key size in bits
    pub rsa_bits: usize,
}

impl Config {
    /// Replace the admin secret installed at provisioning
    pub fn with_admin_secret(mut self, secret: &[u8]) -> Result<Self, Error> {
        if !(ADMIN_PIN_MIN_LEN..=ADMIN_PIN_MAX_LEN).contains(&secret.len()) {
            return Err(Error::InvalidPin);
        }

        self.admin_secret = Vec::from_slice(secret).map_err(|_| Error::InvalidPin)?;

        Ok(self)
    }

    /// Set whether `BlobStart` requires a verified holder session
    pub fn with_blob_start_auth(mut self, enabled: bool) -> Self {
        self.blob_start_auth = enabled;
        self
    }

    /// Set the identity key size
    pub fn with_rsa_bits(mut self, bits: usize) -> Self {
        self.rsa_bits = bits;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut admin_secret = Vec::new();
        // Default secret always fits
        let _ = admin_secret.extend_from_slice(DEFAULT_ADMIN_SECRET);

        Self {
            admin_secret,
            blob_start_auth: false,
            rsa_bits: RSA_BITS,
        }
    }
}

/// [Engine] provides hardware-independent game card operations
pub struct Engine<DRV: Driver, RNG: CryptoRngCore = OsRng> {
    store: Store,
    session: Session,

    config: Config,
    caps: CapabilitySet,

    drv: DRV,
    rng: RNG,
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    /// Report the capabilities of the platform
    fn capabilities(&self) -> CapabilitySet;
}

impl<T: Driver> Driver for &mut T {
    fn capabilities(&self) -> CapabilitySet {
        T::capabilities(self)
    }
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance with the provided driver,
    /// using the default [OsRng]
    pub fn new(drv: DRV) -> Self {
        Self::new_with_rng(drv, OsRng {})
    }
}

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Create a new engine instance with the provided driver and rng
    pub fn new_with_rng(drv: DRV, rng: RNG) -> Self {
        let mut caps = drv.capabilities();
        caps.signer &= cfg!(feature = "signer");

        #[cfg(feature = "log")]
        log::debug!("capabilities: {:?}", caps);

        Self {
            store: Store::new(),
            session: Session::new(),
            config: Config::default(),
            caps,
            drv,
            rng,
        }
    }

    /// Apply an engine configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load persistent state (for example a saved card image)
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self.session.clear();
        self
    }

    /// Fetch persistent state
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fetch session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch resolved capabilities
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.caps
    }

    /// Fetch the platform driver
    pub fn driver(&self) -> &DRV {
        &self.drv
    }

    /// End the physical session, dropping all verification and the
    /// cached master key
    pub fn deselect(&mut self) {
        #[cfg(feature = "log")]
        log::debug!("deselect");

        self.session.clear();
    }

    /// Handle incoming events
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {}", evt.name());

        let r = match evt {
            // Empty event, do nothing
            Event::None => Ok(Output::None),

            // New physical session
            Event::Select => {
                self.session.clear();
                Ok(Output::None)
            }

            Event::GetAppInfo => Ok(self.app_info()),

            Event::Provision { pin, identity } => self.provision(pin.0, identity),

            Event::VerifyPin { pin } => self.verify(Principal::Holder, pin.0),
            Event::VerifyAdmin { secret } => self.verify(Principal::Admin, secret.0),
            Event::AdminUnlock { new_pin } => self.admin_unlock(new_pin.map(|p| p.0)),
            Event::ChangePin { new_pin } => self.change_pin(new_pin.0),

            Event::ReadField { tag } => self.read_field(*tag),
            Event::WriteFields(req) => self.write_fields(req),

            Event::TopUp { amount } => self.top_up(*amount),
            Event::PlayGame { game, price } => self.play_game(*game, *price),
            Event::PurchaseBundle { games, price } => self.purchase_bundle(games, *price),

            Event::BlobStart {
                total_size,
                kind,
                chunk,
            } => self.blob_start(*total_size, *kind, chunk),
            Event::BlobContinue { offset, chunk } => self.blob_continue(*offset, chunk),
            Event::BlobRead { offset, length } => self.blob_read(*offset, *length),
            Event::BlobInfo => self.blob_info(),

            Event::SignChallenge { challenge } => self.sign_challenge(challenge),

            Event::ReadIdentity => match self.store.identity() {
                Some(identity) => Ok(Output::Identity {
                    identity: *identity,
                }),
                None => Err(Error::NotInitialized),
            },

            Event::Wipe => {
                self.session.clear();
                self.store.wipe();
                Ok(Output::None)
            }
        };

        #[cfg(feature = "log")]
        if let Err(e) = &r {
            log::debug!("{} failed: {:?}", evt.name(), e);
        }

        r
    }

    /// Build application info
    fn app_info(&self) -> Output {
        let mut flags = AppFlags::empty();

        flags.set(AppFlags::INITIALIZED, self.store.is_initialized());
        flags.set(
            AppFlags::HOLDER_VERIFIED,
            self.session.is_verified(Principal::Holder),
        );
        flags.set(
            AppFlags::ADMIN_VERIFIED,
            self.session.is_verified(Principal::Admin),
        );
        flags.set(AppFlags::HOLDER_LOCKED, self.store.holder_retry().locked());
        flags.set(AppFlags::ADMIN_LOCKED, self.store.admin_retry().locked());
        flags.set(AppFlags::HAS_SIGNER, self.store.has_signer());
        flags.set(AppFlags::STRONG_KDF, self.caps.strong_kdf);

        Output::AppInfo {
            flags,
            holder_tries: self.store.holder_retry().remaining(),
            admin_tries: self.store.admin_retry().remaining(),
        }
    }

    /// Start a blob transfer, optionally gated on a holder session
    fn blob_start(&mut self, total_size: u16, kind: u8, chunk: &[u8]) -> Result<Output, Error> {
        if self.config.blob_start_auth {
            self.require(Principal::Holder)?;
        }

        self.store.blob.start(total_size, kind, chunk)?;

        Ok(Output::None)
    }

    fn blob_continue(&mut self, offset: u16, chunk: &[u8]) -> Result<Output, Error> {
        self.require(Principal::Holder)?;

        self.store.blob.write(offset, chunk)?;

        Ok(Output::None)
    }

    fn blob_read(&mut self, offset: u16, length: u16) -> Result<Output, Error> {
        self.require(Principal::Holder)?;

        let data = self.store.blob.read(offset, length);

        Ok(Output::BlobChunk {
            data: Vec::from_slice(data).map_err(|_| Error::Unknown)?,
        })
    }

    fn blob_info(&mut self) -> Result<Output, Error> {
        self.require(Principal::Holder)?;

        Ok(Output::BlobInfo {
            total_size: self.store.blob.total_size(),
            kind: self.store.blob.kind(),
        })
    }

    /// Sign a challenge with the identity key
    fn sign_challenge(&mut self, challenge: &[u8]) -> Result<Output, Error> {
        if challenge.is_empty() {
            return Err(Error::InvalidLength);
        }

        #[cfg(feature = "signer")]
        if let (true, Some(k)) = (self.caps.signer, &self.store.signer) {
            let signature = k.sign(challenge)?;
            return Ok(Output::Signature { signature });
        }

        Err(Error::NotSupported)
    }

    /// Check the card is provisioned and a principal is verified
    fn require(&self, p: Principal) -> Result<(), Error> {
        if !self.store.is_initialized() {
            return Err(Error::NotInitialized);
        }

        match self.session.is_verified(p) {
            true => Ok(()),
            false => Err(Error::VerificationRequired),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Caps(CapabilitySet);

    impl Driver for Caps {
        fn capabilities(&self) -> CapabilitySet {
            self.0
        }
    }

    #[test]
    fn config_admin_secret_bounds() {
        assert_eq!(
            Config::default().with_admin_secret(b"short").map(|_| ()),
            Err(Error::InvalidPin)
        );
        assert_eq!(
            Config::default()
                .with_admin_secret(&[0x55; ADMIN_PIN_MAX_LEN + 1])
                .map(|_| ()),
            Err(Error::InvalidPin)
        );

        let c = Config::default().with_admin_secret(b"operator-secret").unwrap();
        assert_eq!(&c.admin_secret[..], b"operator-secret");
        assert_eq!(&Config::default().admin_secret[..], DEFAULT_ADMIN_SECRET);
    }

    #[test]
    fn blank_card_state() {
        let mut e = Engine::new(Caps(CapabilitySet::all()));

        assert_eq!(
            e.update(&Event::ReadIdentity),
            Err(Error::NotInitialized)
        );
        assert_eq!(
            e.update(&Event::BlobRead {
                offset: 0,
                length: 16
            }),
            Err(Error::NotInitialized)
        );
        assert_eq!(
            e.update(&Event::SignChallenge { challenge: &[1, 2, 3] }),
            Err(Error::NotSupported)
        );

        match e.update(&Event::GetAppInfo) {
            Ok(Output::AppInfo {
                flags,
                holder_tries,
                admin_tries,
            }) => {
                assert!(!flags.contains(AppFlags::INITIALIZED));
                assert!(flags.contains(AppFlags::STRONG_KDF));
                assert_eq!(holder_tries, PIN_TRY_LIMIT);
                assert_eq!(admin_tries, PIN_TRY_LIMIT);
            }
            r => panic!("unexpected response: {r:?}"),
        }
    }
}
