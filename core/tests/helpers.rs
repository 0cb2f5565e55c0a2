#![allow(unused)]

use core::fmt::Debug;

use encdec::{Decode, Encode};
use log::{debug, trace};
use rand::{rngs::StdRng, SeedableRng};

use gamecard_core::{
    apdu::{prelude::*, ApduError, ApduStatic, APDU_HEADER_LEN, IDENTITY_LEN},
    engine::{CapabilitySet, Config, Driver, Engine, DEFAULT_ADMIN_SECRET},
};

/// Holder PIN used at provisioning
pub const PIN: &[u8] = b"1234";

/// Card identity used at provisioning
pub const IDENTITY: [u8; IDENTITY_LEN] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
    0x0f,
];

/// Identity key size for tests
pub const TEST_RSA_BITS: usize = 512;

/// Driver with fixed capabilities
pub struct TestDriver {
    pub caps: CapabilitySet,
}

impl Driver for TestDriver {
    fn capabilities(&self) -> CapabilitySet {
        self.caps
    }
}

pub type TestEngine = Engine<TestDriver, StdRng>;

pub fn log_init() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Create a blank engine with a strong KDF and no signer
pub fn engine() -> TestEngine {
    engine_with(
        CapabilitySet {
            strong_kdf: true,
            signer: false,
        },
        Config::default(),
    )
}

/// Create a blank engine with the provided capabilities and configuration
pub fn engine_with(caps: CapabilitySet, config: Config) -> TestEngine {
    log_init();

    Engine::new_with_rng(TestDriver { caps }, StdRng::seed_from_u64(1))
        .with_config(config.with_rsa_bits(TEST_RSA_BITS))
}

/// Encode a request to a raw command APDU and process it, returning the
/// response length and status
pub fn exchange<REQ>(e: &mut TestEngine, req: &REQ, resp: &mut [u8]) -> (usize, StatusWord)
where
    REQ: Encode<Error = ApduError> + ApduStatic + Debug,
{
    debug!("cmd: {:?}", req);

    let mut cmd = [0u8; APDU_HEADER_LEN + 255];
    cmd[0] = REQ::CLA;
    cmd[1] = REQ::INS;

    let n = req.encode(&mut cmd[APDU_HEADER_LEN..]).unwrap();
    assert!(n <= 255, "encoded command too long for: {req:?} ({n} bytes)");
    cmd[4] = n as u8;

    trace!("encoded: {:02x?}", &cmd[..APDU_HEADER_LEN + n]);

    let (n, sw) = e.process(&mut cmd[..APDU_HEADER_LEN + n], resp);

    debug!("resp: {} ({} bytes)", sw, n);

    (n, sw)
}

/// Exchange a request, returning the status word only
pub fn status<REQ>(e: &mut TestEngine, req: &REQ) -> StatusWord
where
    REQ: Encode<Error = ApduError> + ApduStatic + Debug,
{
    let mut resp = [0u8; 256];
    exchange(e, req, &mut resp).1
}

/// Exchange a request, asserting success and returning the response length
pub fn exchange_ok<REQ>(e: &mut TestEngine, req: &REQ, resp: &mut [u8]) -> usize
where
    REQ: Encode<Error = ApduError> + ApduStatic + Debug,
{
    let (n, sw) = exchange(e, req, resp);
    assert_eq!(sw, StatusWord::OK, "unexpected status for: {req:?}");
    n
}

/// Provision with the default PIN and identity
pub fn provision(e: &mut TestEngine) {
    let mut resp = [0u8; 256];
    exchange_ok(e, &ProvisionReq::new(PIN, IDENTITY), &mut resp);
}

/// Provision and open a holder session
pub fn provision_verified(e: &mut TestEngine) {
    provision(e);
    assert_eq!(status(e, &VerifyPinReq::new(PIN)), StatusWord::OK);
}

pub fn verify_pin(e: &mut TestEngine, pin: &[u8]) -> StatusWord {
    status(e, &VerifyPinReq::new(pin))
}

pub fn verify_admin(e: &mut TestEngine) -> StatusWord {
    status(e, &VerifyAdminReq::new(DEFAULT_ADMIN_SECRET))
}

/// Read a profile field
pub fn read_field(e: &mut TestEngine, tag: FieldTag) -> Vec<u8> {
    let mut resp = [0u8; 256];
    let n = exchange_ok(e, &ReadFieldReq::new(tag), &mut resp);
    resp[..n].to_vec()
}

/// Read the coin balance
pub fn balance(e: &mut TestEngine) -> u16 {
    let v = read_field(e, FieldTag::Balance);
    u16::from_le_bytes([v[0], v[1]])
}

/// Read the owned game list
pub fn games(e: &mut TestEngine) -> Vec<u8> {
    let v = read_field(e, FieldTag::Games);
    assert_eq!(v[0] as usize, v.len() - 1, "malformed game list");
    v[1..].to_vec()
}

/// Fetch application info (flags, holder tries, admin tries)
pub fn app_info(e: &mut TestEngine) -> (AppFlags, u8, u8) {
    let mut resp = [0u8; 256];
    let n = exchange_ok(e, &AppInfoReq {}, &mut resp);

    let (r, _) = AppInfoResp::decode(&resp[..n]).unwrap();
    (r.flags, r.holder_tries, r.admin_tries)
}
