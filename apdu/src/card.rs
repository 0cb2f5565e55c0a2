// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Card lifecycle APDUs: select, provisioning, identity and wipe

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA, IDENTITY_LEN, SELECT_INS};
use crate::{
    helpers::{arr, Redacted},
    ident::IdentityKey,
};

/// ISO7816 SELECT, starts a new physical session
///
/// The application is selected by CLA/INS alone, any AID payload is ignored.
#[derive(Copy, Clone, Debug, PartialEq, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SelectReq;

impl ApduStatic for SelectReq {
    const CLA: u8 = 0x00;
    const INS: u8 = SELECT_INS;
}

/// Provision a blank card with a holder PIN and card identity
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    PIN_LEN    |                                               |
/// +-+-+-+-+-+-+-+-+                                               +
/// /                              PIN                              /
/// /                       (variable length)                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                         CARD_IDENTITY                         /
/// /                           (16-bytes)                          /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq)]
pub struct ProvisionReq<'a> {
    /// Initial holder PIN
    pub pin: &'a [u8],
    /// Card identity
    pub identity: [u8; IDENTITY_LEN],
}

impl<'a> ProvisionReq<'a> {
    /// Create a new [`ProvisionReq`] APDU
    pub fn new(pin: &'a [u8], identity: [u8; IDENTITY_LEN]) -> Self {
        Self { pin, identity }
    }
}

impl<'a> core::fmt::Debug for ProvisionReq<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProvisionReq")
            .field("pin", &Redacted(self.pin))
            .field("identity", &self.identity)
            .finish()
    }
}

impl<'a> ApduStatic for ProvisionReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::Provision as u8;
}

impl<'a> Encode for ProvisionReq<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.pin.len() > u8::MAX as usize {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[index] = self.pin.len() as u8;
        index += 1;

        buff[index..][..self.pin.len()].copy_from_slice(self.pin);
        index += self.pin.len();

        index += arr::enc(&self.identity, &mut buff[index..])?;

        Ok(index)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1 + self.pin.len() + IDENTITY_LEN)
    }
}

impl<'a> Decode<'a> for ProvisionReq<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        let pin_len = buff[index] as usize;
        index += 1;

        // Identity must immediately follow the PIN
        if buff.len() != 1 + pin_len + IDENTITY_LEN {
            return Err(ApduError::InvalidLength);
        }

        let pin = &buff[index..][..pin_len];
        index += pin_len;

        let (identity, n) = arr::dec::<IDENTITY_LEN>(&buff[index..])?;
        index += n;

        Ok((Self { pin, identity }, index))
    }
}

/// Provisioning response, carries the identity public key where the card
/// has a signer and is empty otherwise
#[derive(Clone, PartialEq, Debug)]
pub struct ProvisionResp<'a> {
    /// Identity public key, if generated
    pub key: Option<IdentityKey<'a>>,
}

impl<'a> ProvisionResp<'a> {
    /// Create a new [`ProvisionResp`] APDU
    pub fn new(key: Option<IdentityKey<'a>>) -> Self {
        Self { key }
    }
}

impl<'a> Encode for ProvisionResp<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match &self.key {
            Some(k) => k.encode(buff),
            None => Ok(0),
        }
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        match &self.key {
            Some(k) => k.encode_len(),
            None => Ok(0),
        }
    }
}

impl<'a> Decode<'a> for ProvisionResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Ok((Self { key: None }, 0));
        }

        let (key, n) = IdentityKey::decode(buff)?;

        Ok((Self { key: Some(key) }, n))
    }
}

/// Fetch the card identity, returns [`IdentityResp`]
#[derive(Copy, Clone, Debug, PartialEq, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct ReadIdentityReq;

impl ApduStatic for ReadIdentityReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::ReadIdentity as u8;
}

/// Card identity response
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct IdentityResp {
    /// Card identity, set at provisioning
    #[encdec(with = "arr")]
    pub identity: [u8; IDENTITY_LEN],
}

impl IdentityResp {
    /// Create a new [`IdentityResp`] APDU
    pub fn new(identity: [u8; IDENTITY_LEN]) -> Self {
        Self { identity }
    }
}

/// Wipe the card back to the blank (unprovisioned) state
#[derive(Copy, Clone, Debug, PartialEq, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct WipeReq;

impl ApduStatic for WipeReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::Wipe as u8;
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn provision_req_apdu() {
        let apdu = ProvisionReq::new(b"1234", random());

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 1 + 4 + IDENTITY_LEN);
    }

    #[test]
    fn provision_req_rejects_trailing_data() {
        let mut buff = [0u8; 32];
        buff[0] = 4;

        assert!(matches!(
            ProvisionReq::decode(&buff[..]),
            Err(ApduError::InvalidLength)
        ));
    }

    #[test]
    fn provision_resp_apdu() {
        let exponent = [0x01, 0x00, 0x01];
        let modulus: [u8; 64] = core::array::from_fn(|_| random());

        let mut buff = [0u8; 128];
        encode_decode_apdu(
            &mut buff,
            &ProvisionResp::new(Some(IdentityKey::new(&exponent, &modulus))),
        );

        let mut buff = [0u8; 128];
        let n = encode_decode_apdu(&mut buff, &ProvisionResp::new(None));
        assert_eq!(n, 0);
    }

    #[test]
    fn identity_resp_apdu() {
        let mut buff = [0u8; 32];
        encode_decode_apdu(&mut buff, &IdentityResp::new(random()));
    }
}
