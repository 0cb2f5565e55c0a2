// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Encrypted profile record
//!
//! The plaintext profile is a fixed [`RECORD_SIZE`] buffer of packed
//! `TAG LEN VALUE` triples from offset zero, with a zeroed tail. A zero tag
//! terminates the scan. The record is always encrypted in full under the
//! master key with a fresh IV, see [`Record::seal`] and [`Record::open`].

use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;
use rand_core::CryptoRngCore;
use static_assertions::{const_assert, const_assert_eq};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use gamecard_apdu::profile::FieldTag;

use super::Error;
use crate::crypto::{cbc, MasterKey, IV_LEN};

/// Decrypted profile record size
pub const RECORD_SIZE: usize = 128;

/// Persistent encrypted profile buffer capacity
pub const PROFILE_CAPACITY: usize = 160;

/// Owned game list capacity
pub const MAX_OWNED_GAMES: usize = 32;

/// Upper bound on fields in a record (empty values)
const MAX_FIELDS: usize = RECORD_SIZE / 2;

const_assert!(IV_LEN + RECORD_SIZE <= PROFILE_CAPACITY);
const_assert_eq!(RECORD_SIZE % cbc::BLOCK_LEN, 0);

/// Profile field, `(tag, value)`
pub type Field<'a> = (u8, &'a [u8]);

/// Owned game list
pub type Games = Vec<u8, MAX_OWNED_GAMES>;

/// Iterator over packed triples, yielding `(value_offset, tag, value)`
struct Scan<'a> {
    buff: &'a [u8],
    index: usize,
}

impl<'a> Iterator for Scan<'a> {
    type Item = Result<(usize, Field<'a>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let rem = &self.buff[self.index..];

        // End of buffer or terminator
        match rem.first() {
            None | Some(0) => return None,
            _ => (),
        }

        let len = match rem.get(1) {
            Some(l) => *l as usize,
            None => {
                self.index = self.buff.len();
                return Some(Err(Error::InvalidData));
            }
        };
        if rem.len() < 2 + len {
            self.index = self.buff.len();
            return Some(Err(Error::InvalidData));
        }

        let offset = self.index + 2;
        self.index += 2 + len;

        Some(Ok((offset, (rem[0], &rem[2..][..len]))))
    }
}

fn scan(buff: &[u8]) -> Scan<'_> {
    Scan { buff, index: 0 }
}

/// Decode all fields from a packed buffer, rejecting duplicate tags
pub fn decode_all(buff: &[u8]) -> Result<Vec<Field<'_>, MAX_FIELDS>, Error> {
    let mut fields = Vec::<Field, MAX_FIELDS>::new();

    for f in scan(buff) {
        let (_, (tag, value)) = f?;

        if fields.iter().any(|(t, _)| *t == tag) {
            return Err(Error::InvalidData);
        }

        fields.push((tag, value)).map_err(|_| Error::InvalidData)?;
    }

    Ok(fields)
}

/// Encode fields into a packed buffer, zeroing the unused tail
pub fn encode_all(fields: &[Field], buff: &mut [u8]) -> Result<usize, Error> {
    let len: usize = fields.iter().map(|(_, v)| 2 + v.len()).sum();
    if len > buff.len() {
        return Err(Error::NotEnoughMemory);
    }

    let mut index = 0;
    for (tag, value) in fields {
        if *tag == 0 || value.len() > u8::MAX as usize {
            return Err(Error::InvalidData);
        }

        buff[index] = *tag;
        buff[index + 1] = value.len() as u8;
        buff[index + 2..][..value.len()].copy_from_slice(value);
        index += 2 + value.len();
    }

    buff[index..].fill(0);

    Ok(index)
}

/// Check a field value is well-formed for its tag
pub(crate) fn check_field(tag: u8, value: &[u8]) -> Result<(), Error> {
    let tag = FieldTag::try_from(tag).map_err(|_| Error::InvalidData)?;

    let ok = match tag {
        FieldTag::Balance => value.len() == 2,
        FieldTag::Games => match value.split_first() {
            Some((n, ids)) => {
                *n as usize == ids.len()
                    && ids.len() <= MAX_OWNED_GAMES
                    && ids
                        .iter()
                        .enumerate()
                        .all(|(i, id)| !ids[..i].contains(id))
            }
            None => false,
        },
        FieldTag::Name | FieldTag::Gender | FieldTag::Age => value.len() <= u8::MAX as usize,
    };

    match ok {
        true => Ok(()),
        false => Err(Error::InvalidData),
    }
}

/// Plaintext profile record, zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Record([u8; RECORD_SIZE]);

impl Record {
    /// Create a fresh profile: empty name, gender and age, zero balance
    /// and no owned games
    pub fn fresh() -> Self {
        let mut r = Self([0u8; RECORD_SIZE]);

        let fields: [Field; 5] = [
            (FieldTag::Name as u8, &[]),
            (FieldTag::Gender as u8, &[]),
            (FieldTag::Balance as u8, &[0, 0]),
            (FieldTag::Games as u8, &[0]),
            (FieldTag::Age as u8, &[]),
        ];

        // Fixed defaults always fit
        let _ = encode_all(&fields, &mut r.0);

        r
    }

    /// Decrypt a sealed (`IV || ciphertext`) record under the master key
    pub fn open(sealed: &[u8], key: &MasterKey) -> Result<Self, Error> {
        if sealed.len() != IV_LEN + RECORD_SIZE {
            return Err(Error::InvalidData);
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&sealed[..IV_LEN]);

        let mut r = Self([0u8; RECORD_SIZE]);
        r.0.copy_from_slice(&sealed[IV_LEN..]);
        cbc::decrypt(key.as_bytes(), &iv, &mut r.0);

        // Reject malformed plaintext before any use
        decode_all(&r.0)?;

        Ok(r)
    }

    /// Encrypt the full record under the master key with a fresh IV
    pub fn seal(
        &self,
        key: &MasterKey,
        rng: &mut impl CryptoRngCore,
    ) -> Result<Vec<u8, PROFILE_CAPACITY>, Error> {
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut iv);

        let mut ct = Zeroizing::new(self.0);
        cbc::encrypt(key.as_bytes(), &iv, &mut ct[..]);

        let mut sealed = Vec::new();
        sealed
            .extend_from_slice(&iv)
            .map_err(|_| Error::NotEnoughMemory)?;
        sealed
            .extend_from_slice(&ct[..])
            .map_err(|_| Error::NotEnoughMemory)?;

        Ok(sealed)
    }

    /// Locate a field, returning the value offset and length
    fn find(&self, tag: u8) -> Result<Option<(usize, usize)>, Error> {
        for f in scan(&self.0) {
            let (offset, (t, v)) = f?;
            if t == tag {
                return Ok(Some((offset, v.len())));
            }
        }

        Ok(None)
    }

    /// Read a field value
    pub fn get(&self, tag: u8) -> Result<&[u8], Error> {
        match self.find(tag)? {
            Some((offset, len)) => Ok(&self.0[offset..][..len]),
            None => Err(Error::TagNotFound),
        }
    }

    /// Write a field value.
    ///
    /// Same-length values are overwritten in place, otherwise the record is
    /// rebuilt with the field substituted (or appended) and all other
    /// fields preserved in order. On error the record is unchanged.
    pub fn set(&mut self, tag: u8, value: &[u8]) -> Result<(), Error> {
        check_field(tag, value)?;

        // In-place update
        if let Some((offset, len)) = self.find(tag)? {
            if len == value.len() {
                self.0[offset..][..len].copy_from_slice(value);
                return Ok(());
            }
        }

        // Rebuild into a scratch buffer, committed only on success
        let mut out = Zeroizing::new([0u8; RECORD_SIZE]);
        {
            let fields = decode_all(&self.0)?;
            let mut updated = Vec::<Field, MAX_FIELDS>::new();

            let mut replaced = false;
            for (t, v) in fields.iter() {
                let f = match *t == tag {
                    true => {
                        replaced = true;
                        (tag, value)
                    }
                    false => (*t, *v),
                };
                updated.push(f).map_err(|_| Error::NotEnoughMemory)?;
            }
            if !replaced {
                updated
                    .push((tag, value))
                    .map_err(|_| Error::NotEnoughMemory)?;
            }

            encode_all(&updated, &mut out[..])?;
        }

        self.0.copy_from_slice(&out[..]);

        Ok(())
    }

    /// Fetch the coin balance, a missing field reads as zero
    pub fn balance(&self) -> Result<u16, Error> {
        match self.get(FieldTag::Balance as u8) {
            Ok(v) if v.len() == 2 => Ok(LittleEndian::read_u16(v)),
            Ok(_) => Err(Error::InvalidData),
            Err(Error::TagNotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub fn set_balance(&mut self, balance: u16) -> Result<(), Error> {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, balance);

        self.set(FieldTag::Balance as u8, &b)
    }

    /// Fetch the owned game list, a missing field reads as empty
    pub fn games(&self) -> Result<Games, Error> {
        let v = match self.get(FieldTag::Games as u8) {
            Ok(v) => v,
            Err(Error::TagNotFound) => return Ok(Games::new()),
            Err(e) => return Err(e),
        };

        match v.split_first() {
            Some((n, ids)) if *n as usize == ids.len() => {
                Games::from_slice(ids).map_err(|_| Error::InvalidData)
            }
            _ => Err(Error::InvalidData),
        }
    }

    pub fn set_games(&mut self, games: &[u8]) -> Result<(), Error> {
        if games.len() > MAX_OWNED_GAMES {
            return Err(Error::NotEnoughMemory);
        }

        let mut b = [0u8; MAX_OWNED_GAMES + 1];
        b[0] = games.len() as u8;
        b[1..][..games.len()].copy_from_slice(games);

        self.set(FieldTag::Games as u8, &b[..games.len() + 1])
    }
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;

    const NAME: u8 = FieldTag::Name as u8;
    const GENDER: u8 = FieldTag::Gender as u8;
    const AGE: u8 = FieldTag::Age as u8;

    #[test]
    fn fresh_record_fields() {
        let r = Record::fresh();

        assert_eq!(r.get(NAME), Ok(&[][..]));
        assert_eq!(r.balance(), Ok(0));
        assert_eq!(r.games().unwrap().len(), 0);

        let fields = decode_all(&r.0).unwrap();
        assert_eq!(fields.len(), 5);
    }

    #[test]
    fn set_in_place_and_resize() {
        let mut r = Record::fresh();

        r.set(NAME, b"Alice").unwrap();
        r.set(AGE, &[30]).unwrap();
        r.set(GENDER, b"F").unwrap();

        // Same length, in place
        r.set(NAME, &b"Alicia"[..5]).unwrap();
        assert_eq!(r.get(NAME), Ok(&b"Alici"[..]));

        // Longer and shorter, rebuilt
        r.set(NAME, b"Alice Liddell").unwrap();
        assert_eq!(r.get(NAME), Ok(&b"Alice Liddell"[..]));
        r.set(NAME, b"Al").unwrap();
        assert_eq!(r.get(NAME), Ok(&b"Al"[..]));

        // Other fields unchanged, ordering preserved
        assert_eq!(r.get(AGE), Ok(&[30u8][..]));
        assert_eq!(r.get(GENDER), Ok(&b"F"[..]));
        assert_eq!(r.balance(), Ok(0));

        let tags: Vec<u8, 8> = decode_all(&r.0).unwrap().iter().map(|f| f.0).collect();
        assert_eq!(&tags[..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn set_over_capacity_leaves_record_unchanged() {
        let mut r = Record::fresh();
        r.set(NAME, b"Bob").unwrap();

        let before = r.0;

        let long = [b'x'; RECORD_SIZE];
        assert_eq!(r.set(GENDER, &long[..120]), Err(Error::NotEnoughMemory));
        assert_eq!(r.0, before);
    }

    #[test]
    fn set_rejects_malformed_values() {
        let mut r = Record::fresh();

        assert_eq!(r.set(0x00, b"x"), Err(Error::InvalidData));
        assert_eq!(r.set(0x7e, b"x"), Err(Error::InvalidData));
        assert_eq!(r.set(FieldTag::Balance as u8, &[1]), Err(Error::InvalidData));
        assert_eq!(r.set(FieldTag::Games as u8, &[2, 7]), Err(Error::InvalidData));
        assert_eq!(r.set(FieldTag::Games as u8, &[3, 7, 9, 7]), Err(Error::InvalidData));
    }

    #[test]
    fn decode_rejects_duplicates_and_overruns() {
        let dup = [0x01, 0x01, b'a', 0x01, 0x01, b'b', 0x00];
        assert_eq!(decode_all(&dup), Err(Error::InvalidData));

        let overrun = [0x01, 0x08, b'a', b'b'];
        assert_eq!(decode_all(&overrun), Err(Error::InvalidData));

        let truncated = [0x01, 0x01, b'a', 0x02];
        assert_eq!(decode_all(&truncated), Err(Error::InvalidData));
    }

    #[test]
    fn seal_open() {
        let key = MasterKey::random(&mut OsRng);

        let mut r = Record::fresh();
        r.set(NAME, b"Carol").unwrap();
        r.set_balance(1234).unwrap();

        let a = r.seal(&key, &mut OsRng).unwrap();
        let b = r.seal(&key, &mut OsRng).unwrap();
        assert_eq!(a.len(), IV_LEN + RECORD_SIZE);
        assert_ne!(a, b, "fresh IV per seal");

        let o = Record::open(&a, &key).unwrap();
        assert_eq!(o.0, r.0);
        assert_eq!(o.balance(), Ok(1234));
    }

    #[test]
    fn games_list() {
        let mut r = Record::fresh();

        r.set_games(&[7, 9]).unwrap();
        assert_eq!(&r.games().unwrap()[..], &[7, 9]);

        let full = [1u8; MAX_OWNED_GAMES + 1];
        assert_eq!(r.set_games(&full), Err(Error::NotEnoughMemory));
        assert_eq!(&r.games().unwrap()[..], &[7, 9]);
    }
}
