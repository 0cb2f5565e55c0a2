// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Encrypted profile field APDUs
//!
//! Profile fields are addressed by a one-byte [`FieldTag`], writes carry a
//! packed sequence of `TAG LEN VALUE` triples applied as a single update.

use encdec::{Decode, Encode};
use strum::{Display, EnumIter};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA};

/// Profile field tags
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter, num_enum::TryFromPrimitive)]
#[repr(u8)]
pub enum FieldTag {
    /// Holder name (UTF-8)
    Name = 0x01,
    /// Holder gender
    Gender = 0x02,
    /// Coin balance (`u16`, little-endian)
    Balance = 0x03,
    /// Owned game list (count followed by one-byte game IDs)
    Games = 0x04,
    /// Holder age
    Age = 0x05,
}

/// Read a single profile field, returns a [`FieldResp`]
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct ReadFieldReq {
    /// Raw field tag, see [`FieldTag`]
    pub tag: u8,
}

impl ReadFieldReq {
    /// Create a new [`ReadFieldReq`] APDU
    pub fn new(tag: FieldTag) -> Self {
        Self { tag: tag as u8 }
    }
}

impl ApduStatic for ReadFieldReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::ReadField as u8;
}

/// Profile field value
#[derive(Clone, PartialEq, Debug)]
pub struct FieldResp<'a> {
    pub value: &'a [u8],
}

impl<'a> FieldResp<'a> {
    /// Create a new [`FieldResp`] APDU
    pub fn new(value: &'a [u8]) -> Self {
        Self { value }
    }
}

crate::encdec_payload!(FieldResp, value);

/// Write one or more profile fields in a single update
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     TAG_0     |     LEN_0     |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
/// /                            VALUE_0                            /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     TAG_1     |     LEN_1     |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
/// /                            VALUE_1                            /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                              ...                              /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Decoding validates the packing, use [`WriteFieldsReq::fields`] to
/// iterate over the triples.
#[derive(Clone, PartialEq, Debug)]
pub struct WriteFieldsReq<'a> {
    data: &'a [u8],
}

impl<'a> WriteFieldsReq<'a> {
    /// Pack `(tag, value)` pairs into `buff`, returning a request
    /// borrowing the packed triples
    pub fn pack(fields: &[(u8, &[u8])], buff: &'a mut [u8]) -> Result<Self, ApduError> {
        let mut index = 0;

        for (tag, value) in fields {
            if *tag == 0 || value.len() > u8::MAX as usize {
                return Err(ApduError::InvalidEncoding);
            }
            if buff.len() < index + 2 + value.len() {
                return Err(ApduError::InvalidLength);
            }

            buff[index] = *tag;
            buff[index + 1] = value.len() as u8;
            buff[index + 2..][..value.len()].copy_from_slice(value);
            index += 2 + value.len();
        }

        let buff: &'a [u8] = buff;
        Ok(Self {
            data: &buff[..index],
        })
    }

    /// Iterate over `(tag, value)` triples
    pub fn fields(&self) -> FieldIter<'a> {
        FieldIter {
            data: self.data,
            index: 0,
        }
    }

    /// Check whether the request carries no fields
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<'a> ApduStatic for WriteFieldsReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::WriteFields as u8;
}

impl<'a> Encode for WriteFieldsReq<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        crate::helpers::write_bytes(self.data, buff)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.data.len())
    }
}

impl<'a> Decode<'a> for WriteFieldsReq<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        let s = Self { data: buff };

        // Walk the triples once so malformed packing is rejected up front
        for f in s.fields() {
            f?;
        }

        Ok((s, buff.len()))
    }
}

/// Iterator over packed `TAG LEN VALUE` triples
#[derive(Clone, Debug)]
pub struct FieldIter<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> Iterator for FieldIter<'a> {
    type Item = Result<(u8, &'a [u8]), ApduError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rem = &self.data[self.index..];
        if rem.is_empty() {
            return None;
        }

        // Halt iteration on any error
        if rem.len() < 2 {
            self.index = self.data.len();
            return Some(Err(ApduError::InvalidLength));
        }
        if rem[0] == 0 {
            self.index = self.data.len();
            return Some(Err(ApduError::InvalidEncoding));
        }

        let (tag, len) = (rem[0], rem[1] as usize);
        if rem.len() < 2 + len {
            self.index = self.data.len();
            return Some(Err(ApduError::InvalidLength));
        }

        self.index += 2 + len;

        Some(Ok((tag, &rem[2..][..len])))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn read_field_apdu() {
        let mut buff = [0u8; 8];
        let n = encode_decode_apdu(&mut buff, &ReadFieldReq::new(FieldTag::Balance));
        assert_eq!(n, 1);
        assert_eq!(buff[0], 0x03);
    }

    #[test]
    fn write_fields_apdu() {
        let fields: &[(u8, &[u8])] = &[
            (FieldTag::Name as u8, b"Alice"),
            (FieldTag::Age as u8, &[30]),
        ];

        let mut scratch = [0u8; 64];
        let apdu = WriteFieldsReq::pack(fields, &mut scratch).unwrap();

        let mut i = apdu.fields();
        assert_eq!(i.next().unwrap().unwrap(), (0x01, &b"Alice"[..]));
        assert_eq!(i.next().unwrap().unwrap(), (0x05, &[30u8][..]));
        assert!(i.next().is_none());

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &apdu);
        assert_eq!(n, 2 + 5 + 2 + 1);
    }

    #[test]
    fn write_fields_truncated() {
        let buff = [0x01, 0x05, b'A', b'l'];

        assert!(matches!(
            WriteFieldsReq::decode(&buff),
            Err(ApduError::InvalidLength)
        ));
    }

    #[test]
    fn write_fields_reserved_tag() {
        let buff = [0x00, 0x01, 0xff];

        assert!(matches!(
            WriteFieldsReq::decode(&buff),
            Err(ApduError::InvalidEncoding)
        ));
    }
}
