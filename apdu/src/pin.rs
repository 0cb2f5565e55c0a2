// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Holder PIN and admin secret APDUs
//!
//! Secrets are carried as the raw command payload, the card validates
//! lengths (4..=16 bytes for the holder PIN, 8..=32 for the admin secret).

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA};
use crate::helpers::Redacted;

/// Verify the holder PIN, opening a holder session on success
#[derive(Clone, PartialEq)]
pub struct VerifyPinReq<'a> {
    /// Candidate PIN
    pub pin: &'a [u8],
}

impl<'a> VerifyPinReq<'a> {
    pub fn new(pin: &'a [u8]) -> Self {
        Self { pin }
    }
}

impl<'a> core::fmt::Debug for VerifyPinReq<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VerifyPinReq")
            .field("pin", &Redacted(self.pin))
            .finish()
    }
}

impl<'a> ApduStatic for VerifyPinReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::VerifyPin as u8;
}

crate::encdec_payload!(VerifyPinReq, pin);

/// Verify the admin secret, opening an admin session on success
#[derive(Clone, PartialEq)]
pub struct VerifyAdminReq<'a> {
    /// Candidate admin secret
    pub secret: &'a [u8],
}

impl<'a> VerifyAdminReq<'a> {
    pub fn new(secret: &'a [u8]) -> Self {
        Self { secret }
    }
}

impl<'a> core::fmt::Debug for VerifyAdminReq<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VerifyAdminReq")
            .field("secret", &Redacted(self.secret))
            .finish()
    }
}

impl<'a> ApduStatic for VerifyAdminReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::VerifyAdmin as u8;
}

crate::encdec_payload!(VerifyAdminReq, secret);

/// Admin-issued holder unlock, clearing the holder lockout and retry
/// counter and optionally replacing the holder PIN.
///
/// An empty payload keeps the existing PIN.
#[derive(Clone, PartialEq)]
pub struct AdminUnlockReq<'a> {
    /// Replacement holder PIN
    pub new_pin: Option<&'a [u8]>,
}

impl<'a> AdminUnlockReq<'a> {
    pub fn new(new_pin: Option<&'a [u8]>) -> Self {
        Self { new_pin }
    }
}

impl<'a> core::fmt::Debug for AdminUnlockReq<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminUnlockReq")
            .field("new_pin", &self.new_pin.map(Redacted))
            .finish()
    }
}

impl<'a> ApduStatic for AdminUnlockReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::AdminUnlock as u8;
}

impl<'a> Encode for AdminUnlockReq<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self.new_pin {
            // An empty replacement would decode as "keep"
            Some(p) if p.is_empty() => Err(ApduError::InvalidEncoding),
            Some(p) => crate::helpers::write_bytes(p, buff),
            None => Ok(0),
        }
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.new_pin.map(|p| p.len()).unwrap_or(0))
    }
}

impl<'a> Decode<'a> for AdminUnlockReq<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        let new_pin = match buff.is_empty() {
            true => None,
            false => Some(buff),
        };

        Ok((Self { new_pin }, buff.len()))
    }
}

/// Change the holder PIN from a verified holder session
#[derive(Clone, PartialEq)]
pub struct ChangePinReq<'a> {
    /// Replacement holder PIN
    pub new_pin: &'a [u8],
}

impl<'a> ChangePinReq<'a> {
    pub fn new(new_pin: &'a [u8]) -> Self {
        Self { new_pin }
    }
}

impl<'a> core::fmt::Debug for ChangePinReq<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangePinReq")
            .field("new_pin", &Redacted(self.new_pin))
            .finish()
    }
}

impl<'a> ApduStatic for ChangePinReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::ChangePin as u8;
}

crate::encdec_payload!(ChangePinReq, new_pin);
