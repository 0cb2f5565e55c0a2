// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application Information APDUs

use byteorder::{ByteOrder, LittleEndian};
use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA};

/// Fetch application info APDU
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct AppInfoReq {}

impl ApduStatic for AppInfoReq {
    /// Application Info command APDU is class `0x80`
    const CLA: u8 = CARD_APDU_CLA;

    /// Application Info GET APDU is instruction `0x00`
    const INS: u8 = Instruction::GetAppInfo as u8;
}

impl Encode for AppInfoReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

impl DecodeOwned for AppInfoReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(_buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        Ok((Self {}, 0))
    }
}

/// Application information response APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   PROTO_VER   |   NAME_LEN    |  VERSION_LEN  |   FLAGS_LEN   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  HOLDER_TRIES |  ADMIN_TRIES  |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
/// /                             NAME...                           /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                            VERSION...                         /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                             FLAGS...                          /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AppInfoResp<'a> {
    /// Protocol version (must be 1)
    pub proto: u8,

    /// Application name
    pub name: &'a str,

    /// Application version
    pub version: &'a str,

    /// Application flags
    pub flags: AppFlags,

    /// Remaining holder PIN attempts
    pub holder_tries: u8,

    /// Remaining admin secret attempts
    pub admin_tries: u8,
}

bitflags::bitflags! {
    /// Application info flags
    pub struct AppFlags: u16 {
        /// Card has been provisioned
        const INITIALIZED = 1 << 0;

        /// Holder session is verified
        const HOLDER_VERIFIED = 1 << 1;

        /// Admin session is verified
        const ADMIN_VERIFIED = 1 << 2;

        /// Holder PIN is locked out
        const HOLDER_LOCKED = 1 << 3;

        /// Admin secret is locked out
        const ADMIN_LOCKED = 1 << 4;

        /// Card has an RSA identity signer
        const HAS_SIGNER = 1 << 8;

        /// Card supports the iterated (PBKDF2) KDF
        const STRONG_KDF = 1 << 9;
    }
}

impl<'a> AppInfoResp<'a> {
    /// Create a new application info APDU
    pub fn new(proto: u8, name: &'a str, version: &'a str, flags: AppFlags) -> Self {
        Self {
            proto,
            name,
            version,
            flags,
            holder_tries: 0,
            admin_tries: 0,
        }
    }

    /// Set remaining attempt counters
    pub fn with_tries(mut self, holder_tries: u8, admin_tries: u8) -> Self {
        self.holder_tries = holder_tries;
        self.admin_tries = admin_tries;
        self
    }
}

impl<'a> Encode for AppInfoResp<'a> {
    type Error = ApduError;

    /// Encode an app info APDU into the provided buffer
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        let mut index = 0;

        if self.name.len() > u8::MAX as usize || self.version.len() > u8::MAX as usize {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        // Set header
        buff[0] = self.proto;
        buff[1] = self.name.len() as u8;
        buff[2] = self.version.len() as u8;
        buff[3] = self.flags.encode_len()? as u8;
        buff[4] = self.holder_tries;
        buff[5] = self.admin_tries;
        index += 6;

        // Write name
        buff[index..][..self.name.len()].copy_from_slice(self.name.as_bytes());
        index += self.name.len();

        // Write version
        buff[index..][..self.version.len()].copy_from_slice(self.version.as_bytes());
        index += self.version.len();

        // Write flags
        index += self.flags.encode(&mut buff[index..])?;

        Ok(index)
    }

    /// Compute APDU encoded length
    fn encode_len(&self) -> Result<usize, ApduError> {
        let mut len = 6;

        len += self.name.len();
        len += self.version.len();
        len += self.flags.encode_len()?;

        Ok(len)
    }
}

impl<'a> Decode<'a> for AppInfoResp<'a> {
    type Output = Self;
    type Error = ApduError;

    /// Decode an app info APDU from the provided buffer
    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        let mut index = 0;

        if buff.len() < 6 {
            return Err(ApduError::InvalidLength);
        }

        // Fetch headers
        let proto = buff[0];
        let name_len = buff[1] as usize;
        let version_len = buff[2] as usize;
        let flags_len = buff[3] as usize;
        let holder_tries = buff[4];
        let admin_tries = buff[5];
        index += 6;

        if buff.len() < index + name_len + version_len + flags_len {
            return Err(ApduError::InvalidLength);
        }

        // Fetch name string
        let name = core::str::from_utf8(&buff[index..][..name_len])
            .map_err(|_| ApduError::InvalidEncoding)?;
        index += name_len;

        // Fetch version string
        let version = core::str::from_utf8(&buff[index..][..version_len])
            .map_err(|_| ApduError::InvalidEncoding)?;
        index += version_len;

        // Fetch flags
        let (flags, n) = AppFlags::decode_owned(&buff[index..][..flags_len])?;
        index += n;

        Ok((
            Self {
                proto,
                name,
                version,
                flags,
                holder_tries,
                admin_tries,
            },
            index,
        ))
    }
}

impl Encode for AppFlags {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(3)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        // Check buffer size
        if buff.len() < 3 {
            return Err(ApduError::InvalidLength);
        }

        // Set flags length
        buff[0] = 2;

        // Write actual flags
        LittleEndian::write_u16(&mut buff[1..3], self.bits());

        Ok(3)
    }
}

impl DecodeOwned for AppFlags {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < 3 {
            return Err(ApduError::InvalidLength);
        }

        // Check flags length matches
        if buff[0] != 2 {
            return Err(ApduError::InvalidEncoding);
        }

        let bits = LittleEndian::read_u16(&buff[1..3]);

        Ok((AppFlags::from_bits_truncate(bits), 3))
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn app_info_req_apdu() {
        let apdu = AppInfoReq::default();

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);
    }

    #[test]
    fn app_info_resp_apdu() {
        let name = "gamecard";
        let version = "0.3.0";

        let apdu = AppInfoResp::new(
            1,
            name,
            version,
            AppFlags::INITIALIZED | AppFlags::HOLDER_LOCKED | AppFlags::STRONG_KDF,
        )
        .with_tries(0, 3);

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);
    }
}
