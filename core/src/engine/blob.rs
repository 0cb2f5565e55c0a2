// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Image blob storage
//!
//! The blob is stored in the clear in a fixed buffer, written by offset-addressed
//! chunks. There is no gap tracking, the reader is responsible for covering
//! the declared size.

use heapless::Vec;
use zeroize::Zeroize;

use super::Error;

/// Image blob buffer capacity
pub const BLOB_CAPACITY: usize = 4096;

/// Largest chunk returned by a single read
pub const MAX_CHUNK: usize = 240;

/// Persistent image blob
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Blob {
    total_size: u16,
    kind: u8,
    data: Vec<u8, BLOB_CAPACITY>,
}

impl Blob {
    pub const fn new() -> Self {
        Self {
            total_size: 0,
            kind: 0,
            data: Vec::new(),
        }
    }

    /// Declared blob size
    pub fn total_size(&self) -> u16 {
        self.total_size
    }

    /// Blob type tag
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// Start a new blob, clearing any prior content and writing the
    /// first chunk at offset zero
    pub fn start(&mut self, total_size: u16, kind: u8, chunk: &[u8]) -> Result<(), Error> {
        if total_size as usize > BLOB_CAPACITY || chunk.len() > BLOB_CAPACITY {
            return Err(Error::NotEnoughMemory);
        }

        self.wipe();
        self.total_size = total_size;
        self.kind = kind;

        self.write(0, chunk)
    }

    /// Write a chunk at `offset`
    pub fn write(&mut self, offset: u16, chunk: &[u8]) -> Result<(), Error> {
        let offset = offset as usize;
        if offset + chunk.len() > BLOB_CAPACITY {
            return Err(Error::NotEnoughMemory);
        }

        // Buffer is materialised on first write
        if self.data.len() < BLOB_CAPACITY {
            self.data
                .resize(BLOB_CAPACITY, 0)
                .map_err(|_| Error::NotEnoughMemory)?;
        }

        self.data[offset..][..chunk.len()].copy_from_slice(chunk);

        Ok(())
    }

    /// Read up to `length` bytes from `offset`, clamped to the declared
    /// size and [`MAX_CHUNK`]
    pub fn read(&self, offset: u16, length: u16) -> &[u8] {
        let total = self.total_size as usize;
        let offset = offset as usize;

        if offset >= total {
            return &[];
        }

        let len = (length as usize).min(total - offset).min(MAX_CHUNK);

        match self.data.get(offset..offset + len) {
            Some(d) => d,
            None => &[],
        }
    }

    /// Zero blob content and metadata
    pub fn wipe(&mut self) {
        self.data.as_mut_slice().zeroize();
        self.total_size = 0;
        self.kind = 0;
    }
}

impl Default for Blob {
    fn default() -> Self {
        Self::new()
    }
}
