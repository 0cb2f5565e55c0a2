// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Prepaid game card simulator
//!
//! Runs the card engine on the host, persisting the card image to a JSON
//! file and reading one command per line from stdin. Useful as a stand-in
//! reader terminal for manual testing and scripting.

use std::{
    fmt::Debug,
    io::BufRead,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use encdec::{Decode, DecodeOwned, Encode};
use log::{debug, error, info, warn, LevelFilter};

use gamecard_apdu::{prelude::*, ApduError, ApduStatic, APDU_HEADER_LEN};
use gamecard_core::engine::{CapabilitySet, Config, Driver, Engine, MAX_CHUNK};

mod helpers;
use helpers::*;

/// Prepaid game card simulator
#[derive(Clone, PartialEq, Debug, Parser)]
struct Args {
    /// Card image file, created on first write
    #[clap(long, env = "GAMECARD_IMAGE", default_value = "gamecard.json")]
    image: PathBuf,

    /// Disable the iterated (PBKDF2) KDF
    #[clap(long)]
    no_strong_kdf: bool,

    /// Disable the RSA identity signer
    #[clap(long)]
    no_signer: bool,

    /// Require a holder session for blob-start
    #[clap(long)]
    blob_start_auth: bool,

    /// Admin secret installed at provisioning
    #[clap(long, env = "GAMECARD_ADMIN_SECRET")]
    admin_secret: Option<String>,

    /// Identity key size in bits
    #[clap(long, default_value = "1024")]
    rsa_bits: usize,

    /// Log level
    #[clap(long, env = "GAMECARD_LOG", default_value = "info")]
    log_level: LevelFilter,
}

/// Single line command
#[derive(Clone, PartialEq, Debug, Parser)]
#[command(no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, PartialEq, Debug, Subcommand)]
enum Command {
    /// Start a new session (ISO SELECT)
    Select,

    /// Fetch application info
    Info,

    /// Provision a blank card
    Provision {
        /// Holder PIN
        pin: String,

        /// Hex-encoded 16-byte card identity
        identity: HexArray<16>,
    },

    /// Verify the holder PIN
    Verify { pin: String },

    /// Verify the admin secret
    VerifyAdmin { secret: String },

    /// Unlock the holder PIN (admin session)
    Unlock {
        /// Replacement holder PIN
        #[clap(long)]
        new_pin: Option<String>,
    },

    /// Change the holder PIN (holder session)
    ChangePin { new_pin: String },

    /// Read a profile field
    Read {
        #[clap(value_parser = parse_tag)]
        tag: FieldTag,
    },

    /// Write profile fields (`TAG=VALUE`)
    Write {
        #[clap(value_parser = parse_field, required = true)]
        fields: Vec<(FieldTag, Vec<u8>)>,
    },

    /// Add coins to the balance
    TopUp { amount: u16 },

    /// Play a game
    Play { game: u8, price: u16 },

    /// Purchase a bundle of games
    Buy {
        /// Bundle price
        #[clap(long)]
        price: u32,

        /// Game identifiers
        #[clap(required = true)]
        games: Vec<u8>,
    },

    /// Upload an image blob from a file
    BlobPut {
        file: PathBuf,

        /// Blob type tag
        #[clap(long, default_value = "0")]
        kind: u8,
    },

    /// Download the image blob to a file
    BlobGet { file: PathBuf },

    /// Sign a hex-encoded challenge with the identity key
    Sign { challenge: HexData },

    /// Fetch the card identity
    Identity,

    /// Wipe the card
    Wipe,

    /// Send a raw hex-encoded command APDU
    Raw { apdu: HexData },

    /// Exit the simulator
    #[command(alias = "exit")]
    Quit,
}

/// Platform driver with command line capabilities
struct SimDriver {
    caps: CapabilitySet,
}

impl Driver for SimDriver {
    fn capabilities(&self) -> CapabilitySet {
        self.caps
    }
}

type Card = Engine<SimDriver>;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default());

    let caps = CapabilitySet {
        strong_kdf: !args.no_strong_kdf,
        signer: !args.no_signer,
    };

    let mut config = Config::default()
        .with_blob_start_auth(args.blob_start_auth)
        .with_rsa_bits(args.rsa_bits);
    if let Some(s) = &args.admin_secret {
        config = config
            .with_admin_secret(s.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid admin secret: {e:?}"))?;
    }

    let store = load_image(&args.image)?;

    let mut card = Engine::new(SimDriver { caps })
        .with_config(config)
        .with_store(store);

    info!("card ready ({:?}), one command per line, try 'help'", caps);

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();

        // Skip blank lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let cmd = match Line::try_parse_from(line.split_whitespace()) {
            Ok(v) => v.cmd,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        if cmd == Command::Quit {
            break;
        }

        if let Err(e) = execute(&mut card, cmd) {
            error!("{}", e);
        }

        // Persist after every command
        save_image(&args.image, card.store())?;
    }

    Ok(())
}

/// Encode and exchange a request, returning response data on success
fn exchange<REQ>(card: &mut Card, req: &REQ) -> anyhow::Result<Vec<u8>>
where
    REQ: Encode<Error = ApduError> + ApduStatic + Debug,
{
    debug!("cmd: {:?}", req);

    let mut cmd = [0u8; APDU_HEADER_LEN + 255];
    cmd[0] = REQ::CLA;
    cmd[1] = REQ::INS;

    let n = req
        .encode(&mut cmd[APDU_HEADER_LEN..])
        .map_err(|e| anyhow::anyhow!("encode failed: {e:?}"))?;
    cmd[4] = n as u8;

    let mut resp = [0u8; 256];
    let (n, sw) = card.process(&mut cmd[..APDU_HEADER_LEN + n], &mut resp);

    match sw {
        StatusWord::OK => Ok(resp[..n].to_vec()),
        sw => Err(anyhow::anyhow!("card returned {}", sw)),
    }
}

/// Execute a single command
fn execute(card: &mut Card, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Select => {
            exchange(card, &SelectReq)?;
            info!("session reset");
        }
        Command::Info => {
            let r = exchange(card, &AppInfoReq {})?;
            let (i, _) = AppInfoResp::decode(&r).map_err(|e| anyhow::anyhow!("{e:?}"))?;

            info!("{} v{} (protocol {})", i.name, i.version, i.proto);
            info!("flags: {:?}", i.flags);
            info!("tries: holder {} admin {}", i.holder_tries, i.admin_tries);
        }
        Command::Provision { pin, identity } => {
            let r = exchange(card, &ProvisionReq::new(pin.as_bytes(), identity.0))?;
            let (p, _) = ProvisionResp::decode(&r).map_err(|e| anyhow::anyhow!("{e:?}"))?;

            info!("provisioned card {}", hex::encode(identity.0));
            if let Some(k) = p.key {
                info!("identity exponent: {}", hex::encode(k.exponent));
                info!("identity modulus: {}", hex::encode(k.modulus));
            }
        }
        Command::Verify { pin } => {
            exchange(card, &VerifyPinReq::new(pin.as_bytes()))?;
            info!("holder verified");
        }
        Command::VerifyAdmin { secret } => {
            exchange(card, &VerifyAdminReq::new(secret.as_bytes()))?;
            info!("admin verified");
        }
        Command::Unlock { new_pin } => {
            exchange(card, &AdminUnlockReq::new(new_pin.as_ref().map(|p| p.as_bytes())))?;
            info!("holder unlocked");
        }
        Command::ChangePin { new_pin } => {
            exchange(card, &ChangePinReq::new(new_pin.as_bytes()))?;
            info!("holder PIN changed");
        }
        Command::Read { tag } => {
            let r = exchange(card, &ReadFieldReq::new(tag))?;
            info!("{}: {}", tag, format_field(tag, &r));
        }
        Command::Write { fields } => {
            let f: Vec<_> = fields.iter().map(|(t, v)| (*t as u8, &v[..])).collect();

            let mut buff = [0u8; 255];
            let req = WriteFieldsReq::pack(&f, &mut buff)
                .map_err(|e| anyhow::anyhow!("fields too large: {e:?}"))?;

            exchange(card, &req)?;
            info!("wrote {} field(s)", fields.len());
        }
        Command::TopUp { amount } => {
            exchange(card, &TopUpReq::new(amount))?;
            info!("added {} coins", amount);
        }
        Command::Play { game, price } => {
            let r = exchange(card, &PlayGameReq::new(game, price))?;
            match r.first() {
                Some(&PlayGameResp::CHARGED) => info!("game {} charged {}", game, price),
                _ => info!("game {} owned, free play", game),
            }
        }
        Command::Buy { price, games } => {
            exchange(card, &PurchaseBundleReq::new(&games, price))?;
            info!("purchased {:?} for {}", games, price);
        }
        Command::BlobPut { file, kind } => blob_put(card, &file, kind)?,
        Command::BlobGet { file } => blob_get(card, &file)?,
        Command::Sign { challenge } => {
            let r = exchange(card, &SignChallengeReq::new(challenge.as_ref()))?;
            info!("signature: {}", hex::encode(r));
        }
        Command::Identity => {
            let r = exchange(card, &ReadIdentityReq)?;
            info!("identity: {}", hex::encode(r));
        }
        Command::Wipe => {
            exchange(card, &WipeReq)?;
            warn!("card wiped");
        }
        Command::Raw { mut apdu } => {
            let mut resp = [0u8; 256];
            let (n, sw) = card.process(&mut apdu.0, &mut resp);
            info!("{} {}", sw, hex::encode(&resp[..n]));
        }
        Command::Quit => (),
    }

    Ok(())
}

/// Chunk size for blob uploads (fits a short APDU with the start header)
const UPLOAD_CHUNK: usize = 240;

fn blob_put(card: &mut Card, file: &Path, kind: u8) -> anyhow::Result<()> {
    let data = std::fs::read(file)?;
    let total = u16::try_from(data.len())?;

    let mut chunks = data.chunks(UPLOAD_CHUNK);
    let first = chunks.next().unwrap_or_default();

    exchange(card, &BlobStartReq::new(total, kind, first))?;

    let mut offset = first.len();
    for c in chunks {
        exchange(card, &BlobContinueReq::new(offset as u16, c))?;
        offset += c.len();
    }

    info!("uploaded {} bytes (type {})", total, kind);

    Ok(())
}

fn blob_get(card: &mut Card, file: &Path) -> anyhow::Result<()> {
    let r = exchange(card, &BlobInfoReq)?;
    let (info, _) = BlobInfoResp::decode_owned(&r).map_err(|e| anyhow::anyhow!("{e:?}"))?;

    let mut data = Vec::with_capacity(info.total_size as usize);
    while data.len() < info.total_size as usize {
        let r = exchange(card, &BlobReadReq::new(data.len() as u16, MAX_CHUNK as u16))?;
        if r.is_empty() {
            break;
        }
        data.extend_from_slice(&r);
    }

    std::fs::write(file, &data)?;

    info!(
        "downloaded {} bytes (type {}) to {}",
        data.len(),
        info.kind,
        file.display()
    );

    Ok(())
}
