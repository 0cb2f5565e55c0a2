// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for prepaid game card communication
//!
//! This module defines the protocol and a reference implementation for communication
//! between a card reader (terminal) and the game card engine.
//!
//! Each command is a classic `CLA INS P1 P2 Lc DATA` APDU carrying exactly one operation,
//! answered with an optional response payload and a two-byte [`StatusWord`][status::StatusWord].
//!
//! Payloads use a primitive binary encoding (roughly equivalent to packed c structures),
//! all multi-byte integers are little-endian.
//!

#![no_std]

pub use ledger_proto::{ApduError, ApduStatic};

pub mod app_info;
pub mod blob;
pub mod card;
pub mod economy;
pub mod ident;
pub mod pin;
pub mod prelude;
pub mod profile;
pub mod status;

#[doc(hidden)]
pub mod helpers;

/// Game card APDU class (proprietary)
pub const CARD_APDU_CLA: u8 = 0x80;

/// ISO7816 SELECT instruction, accepted with any class
pub const SELECT_INS: u8 = 0xa4;

/// Protocol version reported in [`AppInfoResp`][app_info::AppInfoResp]
pub const CARD_PROTO_VERSION: u8 = 0x01;

/// APDU header length (`CLA INS P1 P2 Lc`)
pub const APDU_HEADER_LEN: usize = 5;

/// Card identity length
pub const IDENTITY_LEN: usize = 16;

/// Game card APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, num_enum::TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    // General instructions
    GetAppInfo = 0x00,

    /// Provision a blank card
    Provision = 0x10,

    /// Verify holder PIN
    VerifyPin = 0x20,

    /// Verify admin secret
    VerifyAdmin = 0x21,

    /// Admin-issued holder unlock (with optional PIN reset)
    AdminUnlock = 0x22,

    /// Change the holder PIN from a verified session
    ChangePin = 0x23,

    /// Read a single profile field
    ReadField = 0x30,

    /// Write one or more profile fields
    WriteFields = 0x31,

    /// Add coins to the balance
    TopUp = 0x40,

    /// Pay for (or replay) a game
    PlayGame = 0x41,

    /// Purchase a bundle of games
    PurchaseBundle = 0x42,

    /// Start an image blob transfer
    BlobStart = 0x50,

    /// Continue an image blob transfer
    BlobContinue = 0x51,

    /// Read a chunk of the image blob
    BlobRead = 0x52,

    /// Fetch image blob metadata
    BlobInfo = 0x53,

    /// Sign a challenge with the card identity key
    SignChallenge = 0x60,

    /// Fetch the card identity
    ReadIdentity = 0x70,

    /// Wipe the card back to the blank state
    Wipe = 0x7f,
}

/// Helper macro for APDUs carrying a single raw payload that fills the
/// remainder of the command or response data
#[macro_export]
macro_rules! encdec_payload {
    ($t:ident, $f:ident) => {
        impl<'a> encdec::Encode for $t<'a> {
            type Error = ApduError;

            fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
                $crate::helpers::write_bytes(self.$f, buff)
            }

            fn encode_len(&self) -> Result<usize, Self::Error> {
                Ok(self.$f.len())
            }
        }

        impl<'a> encdec::Decode<'a> for $t<'a> {
            type Output = Self;
            type Error = ApduError;

            fn decode(buff: &'a [u8]) -> Result<(Self, usize), Self::Error> {
                Ok((Self { $f: buff }, buff.len()))
            }
        }
    };
}
