// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Prepaid game card core
//!
//! This provides a hardware-independent [Engine][engine] implementing the
//! on-card credential store and encrypted profile for a prepaid game card.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s and
//! [Output][engine::Output]s, or as raw command APDUs through
//! [`Engine::process`][engine::Engine::process]. See [gamecard_apdu] for APDU objects
//! and wire encodings.
//!
//! ## Operations
//!
//! Prior to interacting with a card the reader should issue an ISO7816 `SELECT`
//! to start a fresh session, then an [`AppInfoReq`][gamecard_apdu::app_info::AppInfoReq]
//! to fetch an [`AppInfoResp`][gamecard_apdu::app_info::AppInfoResp] containing the
//! protocol version, card state flags and remaining PIN attempts.
//!
//! ### Provisioning
//!
//! A blank card is provisioned with a [`ProvisionReq`][gamecard_apdu::card::ProvisionReq]
//! carrying the holder PIN and card identity. This generates a random salt and master key,
//! wraps the master key under both the holder PIN and the configured admin secret,
//! writes an empty encrypted profile and (where supported) generates an RSA identity key.
//!
//! ### Sessions
//!
//! Profile, economic and blob operations require a holder session, opened with a
//! [`VerifyPinReq`][gamecard_apdu::pin::VerifyPinReq]. Three consecutive failures lock
//! the holder PIN until an admin session (opened with a
//! [`VerifyAdminReq`][gamecard_apdu::pin::VerifyAdminReq]) issues an
//! [`AdminUnlockReq`][gamecard_apdu::pin::AdminUnlockReq], optionally replacing the PIN.
//!
//! Sessions and the cached master key are cleared on `SELECT` and
//! [`Engine::deselect`][engine::Engine::deselect].
//!
//! ### Profile and economy
//!
//! 1. Read fields with [`ReadFieldReq`][gamecard_apdu::profile::ReadFieldReq], write one
//!    or more with [`WriteFieldsReq`][gamecard_apdu::profile::WriteFieldsReq]
//! 2. Add coins with [`TopUpReq`][gamecard_apdu::economy::TopUpReq]
//! 3. Pay per play with [`PlayGameReq`][gamecard_apdu::economy::PlayGameReq], owned games
//!    play for free
//! 4. Own games forever with [`PurchaseBundleReq`][gamecard_apdu::economy::PurchaseBundleReq]
//!

#![cfg_attr(not(feature = "std"), no_std)]

pub use gamecard_apdu::{self as apdu};

pub mod crypto;

pub mod engine;
