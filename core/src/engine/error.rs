// Copyright (c) 2022-2023 The MobileCoin Foundation

use gamecard_apdu::{status::StatusWord, ApduError};

/// [Engine][super::Engine] errors
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("Invalid argument length"))]
    InvalidLength = 0x00,

    /// Invalid argument data
    #[cfg_attr(feature = "thiserror", error("Invalid argument data"))]
    InvalidData = 0x01,

    /// PIN or admin secret length out of bounds
    #[cfg_attr(feature = "thiserror", error("PIN length out of bounds"))]
    InvalidPin = 0x02,

    /// Card has not been provisioned
    #[cfg_attr(feature = "thiserror", error("card not initialised"))]
    NotInitialized = 0x03,

    /// Card has already been provisioned
    #[cfg_attr(feature = "thiserror", error("card already initialised"))]
    AlreadyInitialized = 0x04,

    /// Operation requires a verified session
    #[cfg_attr(feature = "thiserror", error("verification required"))]
    VerificationRequired = 0x05,

    /// Principal is locked out
    #[cfg_attr(feature = "thiserror", error("authentication blocked"))]
    Blocked = 0x06,

    /// Verification failed, with the number of attempts remaining
    #[cfg_attr(feature = "thiserror", error("wrong PIN ({0} attempts remaining)"))]
    WrongPin(u8) = 0x07,

    /// Balance too low
    #[cfg_attr(feature = "thiserror", error("insufficient funds"))]
    InsufficientFunds = 0x08,

    /// Fixed capacity exceeded
    #[cfg_attr(feature = "thiserror", error("not enough memory"))]
    NotEnoughMemory = 0x09,

    /// Capability not present on this card
    #[cfg_attr(feature = "thiserror", error("function not supported"))]
    NotSupported = 0x0a,

    /// Profile field not present
    #[cfg_attr(feature = "thiserror", error("tag not found"))]
    TagNotFound = 0x0b,

    /// Unsupported APDU class
    #[cfg_attr(feature = "thiserror", error("class not supported"))]
    UnsupportedClass = 0x0c,

    /// Unsupported APDU instruction
    #[cfg_attr(feature = "thiserror", error("instruction not supported"))]
    UnsupportedInstruction = 0x0d,

    /// Response encoding failed
    #[cfg_attr(feature = "thiserror", error("response encoding failed"))]
    EncodingFailed = 0x0e,

    /// Unknown / internal error
    #[cfg_attr(feature = "thiserror", error("unknown"))]
    Unknown = 0xf0,
}

impl Error {
    /// Map an error to the response status word
    pub fn status(&self) -> StatusWord {
        match self {
            Error::InvalidLength => StatusWord::WRONG_LENGTH,
            Error::InvalidData | Error::InvalidPin | Error::TagNotFound => StatusWord::WRONG_DATA,
            Error::NotInitialized => StatusWord::CONDITIONS_NOT_SATISFIED,
            Error::AlreadyInitialized => StatusWord::COMMAND_NOT_ALLOWED,
            Error::VerificationRequired => StatusWord::VERIFICATION_REQUIRED,
            Error::Blocked => StatusWord::AUTH_BLOCKED,
            Error::WrongPin(n) => StatusWord::wrong_pin(*n),
            Error::InsufficientFunds => StatusWord::INSUFFICIENT_FUNDS,
            Error::NotEnoughMemory => StatusWord::NOT_ENOUGH_MEMORY,
            Error::NotSupported => StatusWord::FUNCTION_NOT_SUPPORTED,
            Error::UnsupportedClass => StatusWord::CLA_NOT_SUPPORTED,
            Error::UnsupportedInstruction => StatusWord::INS_NOT_SUPPORTED,
            Error::EncodingFailed | Error::Unknown => StatusWord::UNKNOWN,
        }
    }
}

impl From<ApduError> for Error {
    fn from(e: ApduError) -> Self {
        match e {
            ApduError::InvalidLength => Error::InvalidLength,
            _ => Error::InvalidData,
        }
    }
}

impl From<Error> for StatusWord {
    fn from(e: Error) -> Self {
        e.status()
    }
}
