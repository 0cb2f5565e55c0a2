// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_proto::ApduError;

/// Encoding helper for fixed-size array fields (pending nightly array constructors)
pub(crate) mod arr {
    use encdec::Error;

    pub fn enc<const N: usize>(d: &[u8; N], buff: &mut [u8]) -> Result<usize, Error> {
        if buff.len() < d.len() {
            return Err(Error::Length);
        }

        buff[..d.len()].copy_from_slice(&d[..]);

        Ok(d.len())
    }

    pub fn enc_len<const N: usize>(d: &[u8; N]) -> Result<usize, Error> {
        Ok(d.len())
    }

    pub fn dec<const N: usize>(buff: &[u8]) -> Result<([u8; N], usize), Error> {
        if buff.len() < N {
            return Err(Error::Length);
        }

        let mut d = [0u8; N];
        d.copy_from_slice(&buff[..N]);

        Ok((d, N))
    }
}

/// Write a raw byte slice at the start of `buff`, returning the length written
pub(crate) fn write_bytes(d: &[u8], buff: &mut [u8]) -> Result<usize, ApduError> {
    if buff.len() < d.len() {
        return Err(ApduError::InvalidLength);
    }

    buff[..d.len()].copy_from_slice(d);

    Ok(d.len())
}

/// Secret bytes with a length-only [`Debug`][core::fmt::Debug]
pub(crate) struct Redacted<'a>(pub &'a [u8]);

impl<'a> core::fmt::Debug for Redacted<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "<{} bytes>", self.0.len())
    }
}
