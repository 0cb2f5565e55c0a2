// Copyright (c) 2022-2023 The MobileCoin Foundation

//! RSA identity signer
//!
//! An RSA keypair generated at provisioning, used to sign reader challenges
//! with PKCS#1 v1.5 / SHA-256. The private key never leaves the store.

use heapless::Vec;
use rand_core::CryptoRngCore;
use rsa::{
    pkcs1v15::SigningKey,
    signature::{SignatureEncoding, Signer},
    traits::{PrivateKeyParts, PublicKeyParts},
    RsaPrivateKey,
};
use sha2::Sha256;

use super::{
    output::{PublicKey, Signature},
    Error, MAX_RSA_BITS,
};

/// Identity private key
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdentityKey(RsaPrivateKey);

impl IdentityKey {
    /// Generate a new identity key
    pub fn generate(rng: &mut impl CryptoRngCore, bits: usize) -> Result<Self, Error> {
        if bits > MAX_RSA_BITS {
            return Err(Error::NotSupported);
        }

        RsaPrivateKey::new(rng, bits)
            .map(Self)
            .map_err(|_| Error::Unknown)
    }

    /// Fetch public key components
    pub fn public_key(&self) -> Result<PublicKey, Error> {
        let exponent = Vec::from_slice(&self.0.e().to_bytes_be()).map_err(|_| Error::Unknown)?;
        let modulus = Vec::from_slice(&self.0.n().to_bytes_be()).map_err(|_| Error::Unknown)?;

        Ok(PublicKey { exponent, modulus })
    }

    /// Sign a challenge (PKCS#1 v1.5, SHA-256)
    pub fn sign(&self, challenge: &[u8]) -> Result<Signature, Error> {
        let k = SigningKey::<Sha256>::new(self.0.clone());

        let s = k.try_sign(challenge).map_err(|_| Error::Unknown)?;

        Vec::from_slice(&s.to_bytes()).map_err(|_| Error::Unknown)
    }
}

impl PartialEq for IdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_public_key() == other.0.to_public_key() && self.0.d() == other.0.d()
    }
}

/// Only public components are printed
impl core::fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "IdentityKey({} bits)", self.0.size() * 8)
    }
}
