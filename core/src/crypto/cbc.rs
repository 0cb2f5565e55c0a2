// Copyright (c) 2022-2023 The MobileCoin Foundation

//! AES-128-CBC over whole blocks, no padding

use aes::{
    cipher::generic_array::GenericArray, Aes128, BlockDecrypt, BlockEncrypt, NewBlockCipher,
};

use super::{IV_LEN, KEY_LEN};

/// AES block length
pub const BLOCK_LEN: usize = 16;

/// Encrypt `data` in place, `data` must be a whole number of blocks
pub(crate) fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], data: &mut [u8]) {
    debug_assert_eq!(data.len() % BLOCK_LEN, 0);

    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut prev = *iv;

    for block in data.chunks_exact_mut(BLOCK_LEN) {
        block.iter_mut().zip(prev.iter()).for_each(|(b, p)| *b ^= p);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        prev.copy_from_slice(block);
    }
}

/// Decrypt `data` in place, `data` must be a whole number of blocks
pub(crate) fn decrypt(key: &[u8; KEY_LEN], iv: &[u8; IV_LEN], data: &mut [u8]) {
    debug_assert_eq!(data.len() % BLOCK_LEN, 0);

    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut prev = *iv;
    let mut next = [0u8; BLOCK_LEN];

    for block in data.chunks_exact_mut(BLOCK_LEN) {
        next.copy_from_slice(block);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        block.iter_mut().zip(prev.iter()).for_each(|(b, p)| *b ^= p);
        prev = next;
    }
}
