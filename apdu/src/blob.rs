// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Image blob transfer APDUs
//!
//! The blob is written with a [`BlobStartReq`] carrying the declared size,
//! type and first chunk, followed by any number of offset-addressed
//! [`BlobContinueReq`] chunks. Reads are offset-addressed and clamped to the
//! declared size.

use byteorder::{ByteOrder, LittleEndian};
use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA};

/// Start a blob transfer
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          TOTAL_SIZE           |   BLOB_TYPE   |               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               +
/// /                          FIRST_CHUNK                          /
/// /                       (variable length)                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct BlobStartReq<'a> {
    /// Declared blob size
    pub total_size: u16,
    /// Blob type tag
    pub kind: u8,
    /// First chunk, written at offset 0
    pub chunk: &'a [u8],
}

impl<'a> BlobStartReq<'a> {
    /// Create a new [`BlobStartReq`] APDU
    pub fn new(total_size: u16, kind: u8, chunk: &'a [u8]) -> Self {
        Self {
            total_size,
            kind,
            chunk,
        }
    }
}

impl<'a> ApduStatic for BlobStartReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::BlobStart as u8;
}

impl<'a> Encode for BlobStartReq<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        index += self.total_size.encode(&mut buff[index..])?;

        buff[index] = self.kind;
        index += 1;

        buff[index..][..self.chunk.len()].copy_from_slice(self.chunk);
        index += self.chunk.len();

        Ok(index)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(3 + self.chunk.len())
    }
}

impl<'a> Decode<'a> for BlobStartReq<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 3 {
            return Err(ApduError::InvalidLength);
        }

        let (total_size, _) = u16::decode(buff)?;
        let kind = buff[2];
        let chunk = &buff[3..];

        Ok((
            Self {
                total_size,
                kind,
                chunk,
            },
            buff.len(),
        ))
    }
}

/// Continue a blob transfer, writing `chunk` at `offset`
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            OFFSET             |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
/// /                             CHUNK                             /
/// /                       (variable length)                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct BlobContinueReq<'a> {
    /// Write offset
    pub offset: u16,
    /// Chunk data
    pub chunk: &'a [u8],
}

impl<'a> BlobContinueReq<'a> {
    /// Create a new [`BlobContinueReq`] APDU
    pub fn new(offset: u16, chunk: &'a [u8]) -> Self {
        Self { offset, chunk }
    }
}

impl<'a> ApduStatic for BlobContinueReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::BlobContinue as u8;
}

impl<'a> Encode for BlobContinueReq<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let n = self.offset.encode(buff)?;
        buff[n..][..self.chunk.len()].copy_from_slice(self.chunk);

        Ok(n + self.chunk.len())
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(2 + self.chunk.len())
    }
}

impl<'a> Decode<'a> for BlobContinueReq<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        let (offset, n) = u16::decode(buff)?;
        let chunk = &buff[n..];

        Ok((Self { offset, chunk }, buff.len()))
    }
}

/// Read up to `length` blob bytes from `offset`, returns a [`BlobChunkResp`]
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct BlobReadReq {
    /// Read offset
    pub offset: u16,
    /// Requested length, clamped by the card
    pub length: u16,
}

impl BlobReadReq {
    /// Create a new [`BlobReadReq`] APDU
    pub fn new(offset: u16, length: u16) -> Self {
        Self { offset, length }
    }
}

impl ApduStatic for BlobReadReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::BlobRead as u8;
}

/// Blob chunk
#[derive(Clone, PartialEq, Debug)]
pub struct BlobChunkResp<'a> {
    pub data: &'a [u8],
}

impl<'a> BlobChunkResp<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

crate::encdec_payload!(BlobChunkResp, data);

/// Fetch blob metadata, returns a [`BlobInfoResp`]
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct BlobInfoReq;

impl ApduStatic for BlobInfoReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::BlobInfo as u8;
}

/// Blob metadata
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          TOTAL_SIZE           |   BLOB_TYPE   |   RESERVED    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BlobInfoResp {
    /// Declared blob size (zero when no blob has been started)
    pub total_size: u16,
    /// Blob type tag
    pub kind: u8,
}

impl BlobInfoResp {
    /// Create a new [`BlobInfoResp`] APDU
    pub fn new(total_size: u16, kind: u8) -> Self {
        Self { total_size, kind }
    }
}

impl Encode for BlobInfoResp {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        LittleEndian::write_u16(&mut buff[..2], self.total_size);
        buff[2] = self.kind;
        buff[3] = 0;

        Ok(4)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(4)
    }
}

impl DecodeOwned for BlobInfoResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        let total_size = LittleEndian::read_u16(&buff[..2]);

        Ok((
            Self {
                total_size,
                kind: buff[2],
            },
            4,
        ))
    }
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::test::encode_decode_apdu;

    #[test]
    fn blob_start_apdu() {
        let chunk: [u8; 32] = random();

        let mut buff = [0u8; 64];
        let n = encode_decode_apdu(&mut buff, &BlobStartReq::new(1024, 0x02, &chunk));
        assert_eq!(n, 3 + 32);
    }

    #[test]
    fn blob_start_empty_chunk() {
        let mut buff = [0u8; 8];
        encode_decode_apdu(&mut buff, &BlobStartReq::new(0, 0x01, &[]));
    }

    #[test]
    fn blob_continue_apdu() {
        let chunk: [u8; 32] = random();

        let mut buff = [0u8; 64];
        encode_decode_apdu(&mut buff, &BlobContinueReq::new(200, &chunk));
    }

    #[test]
    fn blob_read_apdu() {
        let mut buff = [0u8; 8];
        let n = encode_decode_apdu(&mut buff, &BlobReadReq::new(16, 240));
        assert_eq!(n, 4);
    }

    #[test]
    fn blob_info_apdu() {
        let mut buff = [0u8; 8];
        encode_decode_apdu(&mut buff, &BlobInfoResp::new(4096, 0x03));
    }
}
