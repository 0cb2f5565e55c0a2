// Copyright (c) 2022-2023 The MobileCoin Foundation

use sha2::{Digest, Sha256};
use strum::Display;
use zeroize::Zeroizing;

use super::{Kek, KEY_LEN, SALT_LEN};

/// PBKDF2 iterations for the [`KdfKind::Strong`] path
pub const PBKDF2_ROUNDS: u32 = 2048;

/// Key derivation function used for a wrapped key.
///
/// The kind is fixed at provisioning and persisted alongside the wrapped
/// keys, both wrappings always use the same kind.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KdfKind {
    /// `SHA-256(secret || salt)`, truncated
    Simple,
    /// `PBKDF2-HMAC-SHA256(secret, salt, PBKDF2_ROUNDS)`, truncated
    Strong,
}

/// Derive a key-encryption-key from a secret and salt
pub fn derive_kek(kind: KdfKind, secret: &[u8], salt: &[u8; SALT_LEN]) -> Kek {
    let mut kek = Kek([0u8; KEY_LEN]);

    match kind {
        KdfKind::Simple => {
            let h = Sha256::new()
                .chain_update(secret)
                .chain_update(salt)
                .finalize();
            let h: Zeroizing<[u8; 32]> = Zeroizing::new(h.into());

            kek.0.copy_from_slice(&h[..KEY_LEN]);
        }
        KdfKind::Strong => {
            // PBKDF2 output of KEY_LEN is the truncated first block
            pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, PBKDF2_ROUNDS, &mut kek.0);
        }
    }

    kek
}
