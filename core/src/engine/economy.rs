// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Profile access and economic operations
//!
//! Every operation here decrypts the profile into a single working
//! [`Record`], applies all changes to it, then seals and commits the result
//! once. Errors are returned before the commit, leaving the stored profile
//! untouched.

use heapless::Vec;
use rand_core::CryptoRngCore;

use gamecard_apdu::profile::WriteFieldsReq;

use super::{record::Record, Driver, Engine, Error, Output, Principal};

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Open the profile under the holder session key, apply `f`, then
    /// seal and commit the updated record
    fn with_record<T>(
        &mut self,
        f: impl FnOnce(&mut Record) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.require(Principal::Holder)?;

        let key = self
            .session
            .master_key(Principal::Holder)
            .ok_or(Error::VerificationRequired)?;

        let mut r = Record::open(&self.store.profile, key)?;

        let v = f(&mut r)?;

        self.store.profile = r.seal(key, &mut self.rng)?;

        Ok(v)
    }

    pub(crate) fn read_field(&mut self, tag: u8) -> Result<Output, Error> {
        self.require(Principal::Holder)?;

        let key = self
            .session
            .master_key(Principal::Holder)
            .ok_or(Error::VerificationRequired)?;

        let r = Record::open(&self.store.profile, key)?;
        let value = Vec::from_slice(r.get(tag)?).map_err(|_| Error::Unknown)?;

        Ok(Output::Field { value })
    }

    /// Apply all fields to one snapshot
    pub(crate) fn write_fields(&mut self, req: &WriteFieldsReq) -> Result<Output, Error> {
        if req.is_empty() {
            return Err(Error::InvalidLength);
        }

        self.with_record(|r| {
            for f in req.fields() {
                let (tag, value) = f?;
                r.set(tag, value)?;
            }
            Ok(())
        })?;

        Ok(Output::None)
    }

    pub(crate) fn top_up(&mut self, amount: u16) -> Result<Output, Error> {
        self.with_record(|r| {
            let b = r.balance()?.checked_add(amount).ok_or(Error::InvalidData)?;
            r.set_balance(b)
        })?;

        #[cfg(feature = "log")]
        log::debug!("top up: {}", amount);

        Ok(Output::None)
    }

    /// Play a game, free when owned, otherwise charging `price` and
    /// recording ownership
    pub(crate) fn play_game(&mut self, game: u8, price: u16) -> Result<Output, Error> {
        let charged = self.with_record(|r| {
            let mut games = r.games()?;
            if games.contains(&game) {
                return Ok(false);
            }

            let b = r.balance()?;
            if b < price {
                return Err(Error::InsufficientFunds);
            }

            games.push(game).map_err(|_| Error::NotEnoughMemory)?;

            r.set_balance(b - price)?;
            r.set_games(&games)?;

            Ok(true)
        })?;

        Ok(Output::Played { charged })
    }

    /// Purchase a bundle, merging new games into the owned list and
    /// charging `price` once
    pub(crate) fn purchase_bundle(&mut self, bundle: &[u8], price: u32) -> Result<Output, Error> {
        let price = u16::try_from(price).map_err(|_| Error::InsufficientFunds)?;

        self.with_record(|r| {
            let b = r.balance()?;
            if b < price {
                return Err(Error::InsufficientFunds);
            }

            let mut games = r.games()?;
            for g in bundle {
                if !games.contains(g) {
                    games.push(*g).map_err(|_| Error::NotEnoughMemory)?;
                }
            }

            r.set_balance(b - price)?;
            r.set_games(&games)?;

            Ok(())
        })?;

        Ok(Output::None)
    }
}
