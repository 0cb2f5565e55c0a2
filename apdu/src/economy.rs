// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Coin balance and game ownership APDUs

use byteorder::{ByteOrder, LittleEndian};
use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, CARD_APDU_CLA};

/// Add coins to the holder balance
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct TopUpReq {
    /// Coins to add
    pub amount: u16,
}

impl TopUpReq {
    /// Create a new [`TopUpReq`] APDU
    pub fn new(amount: u16) -> Self {
        Self { amount }
    }
}

impl ApduStatic for TopUpReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::TopUp as u8;
}

/// Play a game, charging `price` unless the game is already owned.
/// Returns a [`PlayGameResp`].
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    GAME_ID    |   RESERVED    |             PRICE             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PlayGameReq {
    /// Game identifier
    pub game: u8,
    /// Price charged when the game is not owned
    pub price: u16,
}

impl PlayGameReq {
    /// Create a new [`PlayGameReq`] APDU
    pub fn new(game: u8, price: u16) -> Self {
        Self { game, price }
    }
}

impl ApduStatic for PlayGameReq {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::PlayGame as u8;
}

impl Encode for PlayGameReq {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = self.game;
        buff[1] = 0;
        LittleEndian::write_u16(&mut buff[2..4], self.price);

        Ok(4)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(4)
    }
}

impl DecodeOwned for PlayGameReq {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 4 {
            return Err(ApduError::InvalidLength);
        }

        let game = buff[0];
        let price = LittleEndian::read_u16(&buff[2..4]);

        Ok((Self { game, price }, 4))
    }
}

/// Play acknowledgement
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PlayGameResp {
    /// Set when the balance was charged, clear for an owned game
    pub charged: bool,
}

impl PlayGameResp {
    /// Acknowledgement byte for a free (owned) play
    pub const FREE: u8 = 0x00;
    /// Acknowledgement byte for a charged play
    pub const CHARGED: u8 = 0x01;

    /// Create a new [`PlayGameResp`] APDU
    pub fn new(charged: bool) -> Self {
        Self { charged }
    }
}

impl Encode for PlayGameResp {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = match self.charged {
            true => Self::CHARGED,
            false => Self::FREE,
        };

        Ok(1)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1)
    }
}

impl DecodeOwned for PlayGameResp {
    type Output = Self;
    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self, usize), ApduError> {
        let charged = match buff.first() {
            Some(&Self::FREE) => false,
            Some(&Self::CHARGED) => true,
            Some(_) => return Err(ApduError::InvalidEncoding),
            None => return Err(ApduError::InvalidLength),
        };

        Ok((Self { charged }, 1))
    }
}

/// Purchase a bundle of games for a single total price
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     COUNT     |                                               |
/// +-+-+-+-+-+-+-+-+                                               +
/// /                           GAME_IDS                            /
/// /                       (COUNT x 1-byte)                        /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          TOTAL_PRICE                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct PurchaseBundleReq<'a> {
    /// Game identifiers to own
    pub games: &'a [u8],
    /// Total price for the bundle
    pub price: u32,
}

impl<'a> PurchaseBundleReq<'a> {
    /// Create a new [`PurchaseBundleReq`] APDU
    pub fn new(games: &'a [u8], price: u32) -> Self {
        Self { games, price }
    }
}

impl<'a> ApduStatic for PurchaseBundleReq<'a> {
    const CLA: u8 = CARD_APDU_CLA;
    const INS: u8 = Instruction::PurchaseBundle as u8;
}

impl<'a> Encode for PurchaseBundleReq<'a> {
    type Error = ApduError;

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if self.games.len() > u8::MAX as usize {
            return Err(ApduError::InvalidEncoding);
        }
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[index] = self.games.len() as u8;
        index += 1;

        buff[index..][..self.games.len()].copy_from_slice(self.games);
        index += self.games.len();

        index += self.price.encode(&mut buff[index..])?;

        Ok(index)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1 + self.games.len() + 4)
    }
}

impl<'a> Decode<'a> for PurchaseBundleReq<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        let count = buff[index] as usize;
        index += 1;

        if buff.len() != 1 + count + 4 {
            return Err(ApduError::InvalidLength);
        }

        let games = &buff[index..][..count];
        index += count;

        let (price, n) = u32::decode(&buff[index..])?;
        index += n;

        Ok((Self { games, price }, index))
    }
}
