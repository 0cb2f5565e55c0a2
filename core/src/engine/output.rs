// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Encode;
use heapless::Vec;

use gamecard_apdu::{prelude::*, ApduError, IDENTITY_LEN, CARD_PROTO_VERSION};

use super::{blob::MAX_CHUNK, record::RECORD_SIZE, MAX_RSA_BITS};

/// Largest modulus / signature length
pub const MAX_MODULUS_LEN: usize = MAX_RSA_BITS / 8;

/// Largest encoded public exponent
pub const MAX_EXPONENT_LEN: usize = 8;

/// Identity signature bytes
pub type Signature = Vec<u8, MAX_MODULUS_LEN>;

/// Big-endian identity public key components
#[derive(Clone, PartialEq, Debug)]
pub struct PublicKey {
    pub exponent: Vec<u8, MAX_EXPONENT_LEN>,
    pub modulus: Vec<u8, MAX_MODULUS_LEN>,
}

/// [`Engine`][super::Engine] outputs (in response to events), typically encoded to response [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Application info
    AppInfo {
        flags: AppFlags,
        holder_tries: u8,
        admin_tries: u8,
    },

    /// Card provisioned, with the identity public key where a signer is present
    Provisioned { key: Option<PublicKey> },

    /// Profile field value
    Field { value: Vec<u8, RECORD_SIZE> },

    /// Game play acknowledgement
    Played { charged: bool },

    /// Blob chunk
    BlobChunk { data: Vec<u8, MAX_CHUNK> },

    /// Blob metadata
    BlobInfo { total_size: u16, kind: u8 },

    /// Challenge signature
    Signature { signature: Signature },

    /// Card identity
    Identity { identity: [u8; IDENTITY_LEN] },
}

impl Output {
    /// Encode an [`Output`] object to a response [APDU]
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None => Ok(0),
            Output::AppInfo {
                flags,
                holder_tries,
                admin_tries,
            } => AppInfoResp::new(
                CARD_PROTO_VERSION,
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                *flags,
            )
            .with_tries(*holder_tries, *admin_tries)
            .encode(buff),
            Output::Provisioned { key } => ProvisionResp::new(
                key.as_ref()
                    .map(|k| IdentityKey::new(&k.exponent, &k.modulus)),
            )
            .encode(buff),
            Output::Field { value } => FieldResp::new(value).encode(buff),
            Output::Played { charged } => PlayGameResp::new(*charged).encode(buff),
            Output::BlobChunk { data } => BlobChunkResp::new(data).encode(buff),
            Output::BlobInfo { total_size, kind } => {
                BlobInfoResp::new(*total_size, *kind).encode(buff)
            }
            Output::Signature { signature } => SignatureResp::new(signature).encode(buff),
            Output::Identity { identity } => IdentityResp::new(*identity).encode(buff),
        }
    }
}

#[cfg(test)]
mod test {
    use encdec::Decode;

    use super::*;

    #[test]
    fn encode_outputs() {
        let mut buff = [0u8; 256];

        assert_eq!(Output::None.encode(&mut buff).unwrap(), 0);

        let n = Output::Played { charged: true }.encode(&mut buff).unwrap();
        assert_eq!(&buff[..n], &[PlayGameResp::CHARGED]);

        let n = Output::BlobInfo {
            total_size: 0x0102,
            kind: 3,
        }
        .encode(&mut buff)
        .unwrap();
        assert_eq!(&buff[..n], &[0x02, 0x01, 0x03, 0x00]);

        let n = Output::Provisioned { key: None }.encode(&mut buff).unwrap();
        assert_eq!(n, 0);

        let n = Output::Field {
            value: Vec::from_slice(b"alice").unwrap(),
        }
        .encode(&mut buff)
        .unwrap();
        assert_eq!(&buff[..n], b"alice");
    }

    #[test]
    fn encode_app_info() {
        let mut buff = [0u8; 256];

        let n = Output::AppInfo {
            flags: AppFlags::INITIALIZED | AppFlags::HAS_SIGNER,
            holder_tries: 3,
            admin_tries: 2,
        }
        .encode(&mut buff)
        .unwrap();

        let (r, _) = AppInfoResp::decode(&buff[..n]).unwrap();
        assert_eq!(r.proto, CARD_PROTO_VERSION);
        assert_eq!(r.name, "gamecard-core");
        assert_eq!(r.holder_tries, 3);
        assert_eq!(r.admin_tries, 2);
        assert!(r.flags.contains(AppFlags::HAS_SIGNER));
    }
}
