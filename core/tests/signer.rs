//! RSA identity key generation and challenge signing

#![cfg(feature = "signer")]

use encdec::Decode;
use rsa::{
    pkcs1v15::{Signature, VerifyingKey},
    signature::Verifier,
    BigUint, RsaPublicKey,
};
use sha2::Sha256;

use gamecard_core::{
    apdu::prelude::*,
    engine::{CapabilitySet, Config},
};

mod helpers;
use helpers::*;

fn signer_engine() -> TestEngine {
    engine_with(CapabilitySet::all(), Config::default())
}

/// Provision, returning the identity public key
fn provision_with_key(e: &mut TestEngine) -> RsaPublicKey {
    let mut resp = [0u8; 256];
    let n = exchange_ok(e, &ProvisionReq::new(PIN, IDENTITY), &mut resp);

    let (r, _) = ProvisionResp::decode(&resp[..n]).unwrap();
    let k = r.key.expect("missing identity key");

    assert_eq!(k.modulus.len(), TEST_RSA_BITS / 8);

    RsaPublicKey::new(
        BigUint::from_bytes_be(k.modulus),
        BigUint::from_bytes_be(k.exponent),
    )
    .unwrap()
}

#[test]
fn sign_challenge() {
    let mut e = signer_engine();
    let public_key = provision_with_key(&mut e);

    let (flags, ..) = app_info(&mut e);
    assert!(flags.contains(AppFlags::HAS_SIGNER));

    let challenge = [0x42u8; 32];

    let mut resp = [0u8; 256];
    let n = exchange_ok(&mut e, &SignChallengeReq::new(&challenge), &mut resp);
    assert_eq!(n, TEST_RSA_BITS / 8);

    let v = VerifyingKey::<Sha256>::new(public_key);
    let s = Signature::try_from(&resp[..n]).unwrap();

    v.verify(&challenge, &s).unwrap();
    assert!(v.verify(&[0x43u8; 32], &s).is_err());
}

#[test]
fn signing_needs_no_session() {
    let mut e = signer_engine();
    provision_with_key(&mut e);

    assert_eq!(status(&mut e, &SelectReq), StatusWord::OK);
    assert_eq!(
        status(&mut e, &SignChallengeReq::new(b"challenge")),
        StatusWord::OK
    );
}

#[test]
fn empty_challenge_rejected() {
    let mut e = signer_engine();
    provision_with_key(&mut e);

    assert_eq!(
        status(&mut e, &SignChallengeReq::new(&[])),
        StatusWord::WRONG_LENGTH
    );
}

#[test]
fn no_signer_capability() {
    let mut e = engine();

    let mut resp = [0u8; 256];
    let n = exchange_ok(&mut e, &ProvisionReq::new(PIN, IDENTITY), &mut resp);
    assert_eq!(n, 0);

    let (flags, ..) = app_info(&mut e);
    assert!(!flags.contains(AppFlags::HAS_SIGNER));

    assert_eq!(
        status(&mut e, &SignChallengeReq::new(b"challenge")),
        StatusWord::FUNCTION_NOT_SUPPORTED
    );
}

#[test]
fn wipe_removes_signer() {
    let mut e = signer_engine();
    provision_with_key(&mut e);

    assert_eq!(status(&mut e, &WipeReq), StatusWord::OK);
    assert!(!e.store().has_signer());

    assert_eq!(
        status(&mut e, &SignChallengeReq::new(b"challenge")),
        StatusWord::FUNCTION_NOT_SUPPORTED
    );
}
