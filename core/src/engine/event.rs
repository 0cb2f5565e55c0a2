// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Decode;
use strum::IntoStaticStr;

use gamecard_apdu::{prelude::*, ApduError, ApduStatic, IDENTITY_LEN, SELECT_INS};

use super::Error;

/// Secret bytes borrowed from a command buffer, redacted when printed
#[derive(Copy, Clone, PartialEq)]
pub struct Secret<'a>(pub &'a [u8]);

impl<'a> core::fmt::Debug for Secret<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Secret({} bytes)", self.0.len())
    }
}

/// [`Engine`][super::Engine] input events, typically decoded from request [APDUs][crate::apdu]
#[derive(Clone, Debug, IntoStaticStr)]
pub enum Event<'a> {
    None,

    /// Start a new physical session
    Select,

    /// Fetch application info
    GetAppInfo,

    /// Provision a blank card
    Provision {
        pin: Secret<'a>,
        identity: [u8; IDENTITY_LEN],
    },

    /// Verify holder PIN
    VerifyPin { pin: Secret<'a> },

    /// Verify admin secret
    VerifyAdmin { secret: Secret<'a> },

    /// Unlock holder (admin session), optionally replacing the PIN
    AdminUnlock { new_pin: Option<Secret<'a>> },

    /// Replace the holder PIN (holder session)
    ChangePin { new_pin: Secret<'a> },

    /// Read a profile field
    ReadField { tag: u8 },

    /// Write profile fields as a single update
    WriteFields(WriteFieldsReq<'a>),

    /// Add coins to the balance
    TopUp { amount: u16 },

    /// Play (and pay for) a game
    PlayGame { game: u8, price: u16 },

    /// Purchase a bundle of games
    PurchaseBundle { games: &'a [u8], price: u32 },

    /// Start a blob transfer
    BlobStart {
        total_size: u16,
        kind: u8,
        chunk: &'a [u8],
    },

    /// Continue a blob transfer
    BlobContinue { offset: u16, chunk: &'a [u8] },

    /// Read a blob chunk
    BlobRead { offset: u16, length: u16 },

    /// Fetch blob metadata
    BlobInfo,

    /// Sign a challenge with the identity key
    SignChallenge { challenge: &'a [u8] },

    /// Fetch card identity
    ReadIdentity,

    /// Wipe the card
    Wipe,
}

/// Helper for decoding APDUs to events
fn decode_event<'a, T>(buff: &'a [u8]) -> Result<Event<'a>, Error>
where
    T: Decode<'a, Error = ApduError>,
    Event<'a>: From<T::Output>,
{
    T::decode(buff)
        .map(|(v, _n)| Event::from(v))
        .map_err(Error::from)
}

impl<'a> Event<'a> {
    /// Parse an incoming APDU to engine event
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn parse(ins: u8, buff: &'a [u8]) -> Result<Self, Error> {
        match ins {
            SELECT_INS => Ok(Event::Select),
            AppInfoReq::INS => decode_event::<AppInfoReq>(buff),

            ProvisionReq::INS => decode_event::<ProvisionReq>(buff),

            VerifyPinReq::INS => decode_event::<VerifyPinReq>(buff),
            VerifyAdminReq::INS => decode_event::<VerifyAdminReq>(buff),
            AdminUnlockReq::INS => decode_event::<AdminUnlockReq>(buff),
            ChangePinReq::INS => decode_event::<ChangePinReq>(buff),

            ReadFieldReq::INS => decode_event::<ReadFieldReq>(buff),
            WriteFieldsReq::INS => decode_event::<WriteFieldsReq>(buff),

            TopUpReq::INS => decode_event::<TopUpReq>(buff),
            PlayGameReq::INS => decode_event::<PlayGameReq>(buff),
            PurchaseBundleReq::INS => decode_event::<PurchaseBundleReq>(buff),

            BlobStartReq::INS => decode_event::<BlobStartReq>(buff),
            BlobContinueReq::INS => decode_event::<BlobContinueReq>(buff),
            BlobReadReq::INS => decode_event::<BlobReadReq>(buff),
            BlobInfoReq::INS => decode_event::<BlobInfoReq>(buff),

            SignChallengeReq::INS => decode_event::<SignChallengeReq>(buff),
            ReadIdentityReq::INS => decode_event::<ReadIdentityReq>(buff),
            WipeReq::INS => decode_event::<WipeReq>(buff),

            _ => Err(Error::UnsupportedInstruction),
        }
    }

    /// Event name, for logging without payloads
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl<'a> From<AppInfoReq> for Event<'a> {
    fn from(_: AppInfoReq) -> Self {
        Event::GetAppInfo
    }
}

impl<'a> From<ProvisionReq<'a>> for Event<'a> {
    fn from(a: ProvisionReq<'a>) -> Self {
        Event::Provision {
            pin: Secret(a.pin),
            identity: a.identity,
        }
    }
}

impl<'a> From<VerifyPinReq<'a>> for Event<'a> {
    fn from(a: VerifyPinReq<'a>) -> Self {
        Event::VerifyPin { pin: Secret(a.pin) }
    }
}

impl<'a> From<VerifyAdminReq<'a>> for Event<'a> {
    fn from(a: VerifyAdminReq<'a>) -> Self {
        Event::VerifyAdmin {
            secret: Secret(a.secret),
        }
    }
}

impl<'a> From<AdminUnlockReq<'a>> for Event<'a> {
    fn from(a: AdminUnlockReq<'a>) -> Self {
        Event::AdminUnlock {
            new_pin: a.new_pin.map(Secret),
        }
    }
}

impl<'a> From<ChangePinReq<'a>> for Event<'a> {
    fn from(a: ChangePinReq<'a>) -> Self {
        Event::ChangePin {
            new_pin: Secret(a.new_pin),
        }
    }
}

impl<'a> From<ReadFieldReq> for Event<'a> {
    fn from(a: ReadFieldReq) -> Self {
        Event::ReadField { tag: a.tag }
    }
}

impl<'a> From<WriteFieldsReq<'a>> for Event<'a> {
    fn from(a: WriteFieldsReq<'a>) -> Self {
        Event::WriteFields(a)
    }
}

impl<'a> From<TopUpReq> for Event<'a> {
    fn from(a: TopUpReq) -> Self {
        Event::TopUp { amount: a.amount }
    }
}

impl<'a> From<PlayGameReq> for Event<'a> {
    fn from(a: PlayGameReq) -> Self {
        Event::PlayGame {
            game: a.game,
            price: a.price,
        }
    }
}

impl<'a> From<PurchaseBundleReq<'a>> for Event<'a> {
    fn from(a: PurchaseBundleReq<'a>) -> Self {
        Event::PurchaseBundle {
            games: a.games,
            price: a.price,
        }
    }
}

impl<'a> From<BlobStartReq<'a>> for Event<'a> {
    fn from(a: BlobStartReq<'a>) -> Self {
        Event::BlobStart {
            total_size: a.total_size,
            kind: a.kind,
            chunk: a.chunk,
        }
    }
}

impl<'a> From<BlobContinueReq<'a>> for Event<'a> {
    fn from(a: BlobContinueReq<'a>) -> Self {
        Event::BlobContinue {
            offset: a.offset,
            chunk: a.chunk,
        }
    }
}

impl<'a> From<BlobReadReq> for Event<'a> {
    fn from(a: BlobReadReq) -> Self {
        Event::BlobRead {
            offset: a.offset,
            length: a.length,
        }
    }
}

impl<'a> From<BlobInfoReq> for Event<'a> {
    fn from(_: BlobInfoReq) -> Self {
        Event::BlobInfo
    }
}

impl<'a> From<SignChallengeReq<'a>> for Event<'a> {
    fn from(a: SignChallengeReq<'a>) -> Self {
        Event::SignChallenge {
            challenge: a.challenge,
        }
    }
}

impl<'a> From<ReadIdentityReq> for Event<'a> {
    fn from(_: ReadIdentityReq) -> Self {
        Event::ReadIdentity
    }
}

impl<'a> From<WipeReq> for Event<'a> {
    fn from(_: WipeReq) -> Self {
        Event::Wipe
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_events() {
        assert!(matches!(Event::parse(SELECT_INS, &[]), Ok(Event::Select)));
        assert!(matches!(
            Event::parse(TopUpReq::INS, &[0xf4, 0x01]),
            Ok(Event::TopUp { amount: 500 })
        ));
        assert!(matches!(
            Event::parse(PlayGameReq::INS, &[0x07, 0x00, 0xf4, 0x01]),
            Ok(Event::PlayGame {
                game: 7,
                price: 500
            })
        ));
        assert!(matches!(
            Event::parse(AdminUnlockReq::INS, &[]),
            Ok(Event::AdminUnlock { new_pin: None })
        ));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Event::parse(0xee, &[]).map(|_| ()),
            Err(Error::UnsupportedInstruction)
        );
        assert_eq!(
            Event::parse(PlayGameReq::INS, &[0x07, 0x00]).map(|_| ()),
            Err(Error::InvalidLength)
        );
    }

    #[test]
    fn secrets_are_redacted() {
        let e = Event::parse(VerifyPinReq::INS, b"1234").unwrap();

        let s = format!("{e:?}");
        assert!(!s.contains("49, 50, 51, 52"));
        assert!(s.contains("Secret(4 bytes)"));
        assert_eq!(e.name(), "VerifyPin");
    }
}
