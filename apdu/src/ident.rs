// Copyright (c) 2022-2023 The MobileCoin Foundation

//! RSA identity APDUs for card challenge / response authentication

use encdec::{Decode, Encode};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA};

/// RSA identity public key, returned at provisioning
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    EXP_LEN    |   RESERVED    |            MOD_LEN            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                           EXPONENT                            /
/// /                  (big-endian, variable length)                /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                            MODULUS                            /
/// /                  (big-endian, variable length)                /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct IdentityKey<'a> {
    /// Public exponent
    pub exponent: &'a [u8],
    /// Modulus
    pub modulus: &'a [u8],
}

impl<'a> IdentityKey<'a> {
    /// Create a new [`IdentityKey`] object
    pub fn new(exponent: &'a [u8], modulus: &'a [u8]) -> Self {
        Self { exponent, modulus }
    }
}

impl<'a> Encode for IdentityKey<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.exponent.len() > u8::MAX as usize || self.modulus.len() > u16::MAX as usize {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[0] = self.exponent.len() as u8;
        buff[1] = 0;
        index += 2;

        index += (self.modulus.len() as u16).encode(&mut buff[index..])?;

        buff[index..][..self.exponent.len()].copy_from_slice(self.exponent);
        index += self.exponent.len();

        buff[index..][..self.modulus.len()].copy_from_slice(self.modulus);
        index += self.modulus.len();

        Ok(index)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(4 + self.exponent.len() + self.modulus.len())
    }
}

impl<'a> Decode<'a> for IdentityKey<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        let exp_len = buff[0] as usize;
        index += 2;

        let (mod_len, n) = u16::decode(&buff[index..])?;
        index += n;

        let mod_len = mod_len as usize;
        if buff.len() < index + exp_len + mod_len {
            return Err(ApduError::InvalidLength);
        }

        let exponent = &buff[index..][..exp_len];
        index += exp_len;

        let modulus = &buff[index..][..mod_len];
        index += mod_len;

        Ok((Self { exponent, modulus }, index))
    }
}

/// Sign a reader-supplied challenge with the card identity key,
/// returns a [`SignatureResp`].
///
/// The card provides no replay protection, readers must use a fresh
/// random challenge for each request.
#[derive(Clone, PartialEq, Debug)]
pub struct SignChallengeReq<'a> {
    /// Challenge to be signed
    pub challenge: &'a [u8],
}

impl<'a> SignChallengeReq<'a> {
    /// Create a new [`SignChallengeReq`] APDU
    pub fn new(challenge: &'a [u8]) -> Self {
        Self { challenge }
    }
}

impl<'a> ApduStatic for SignChallengeReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::SignChallenge as u8;
}

crate::encdec_payload!(SignChallengeReq, challenge);

/// PKCS#1 v1.5 (SHA-256) signature over a challenge
#[derive(Clone, PartialEq, Debug)]
pub struct SignatureResp<'a> {
    /// Signature bytes, modulus length
    pub signature: &'a [u8],
}

impl<'a> SignatureResp<'a> {
    /// Create a new [`SignatureResp`] APDU
    pub fn new(signature: &'a [u8]) -> Self {
        Self { signature }
    }
}

crate::encdec_payload!(SignatureResp, signature);

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn identity_key_apdu() {
        let modulus: [u8; 128] = core::array::from_fn(|_| random());
        let apdu = IdentityKey::new(&[0x01, 0x00, 0x01], &modulus);

        let mut buff = [0u8; 256];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 4 + 3 + 128);
    }

    #[test]
    fn identity_key_truncated() {
        let buff = [3u8, 0, 64, 0, 1, 0, 1];

        assert!(matches!(
            IdentityKey::decode(&buff),
            Err(ApduError::InvalidLength)
        ));
    }

    #[test]
    fn sign_challenge_apdu() {
        let challenge: [u8; 32] = random();

        let mut buff = [0u8; 64];
        encode_decode_apdu(&mut buff, &SignChallengeReq::new(&challenge));
    }
}
