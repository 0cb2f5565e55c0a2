// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Response status words
//!
//! Every response carries a trailing two-byte status word, ISO7816 codes
//! are used where one exists with the application-specific
//! [`StatusWord::INSUFFICIENT_FUNDS`] in the `6Axx` range.

/// Two-byte response status word
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct StatusWord(pub u16);

impl StatusWord {
    /// Command completed successfully
    pub const OK: Self = Self(0x9000);

    /// Wrong command length (Lc or payload)
    pub const WRONG_LENGTH: Self = Self(0x6700);

    /// Invalid data in the command payload
    pub const WRONG_DATA: Self = Self(0x6a80);

    /// Security status not satisfied, verification required
    pub const VERIFICATION_REQUIRED: Self = Self(0x6982);

    /// Authentication method blocked
    pub const AUTH_BLOCKED: Self = Self(0x6983);

    /// Conditions of use not satisfied
    pub const CONDITIONS_NOT_SATISFIED: Self = Self(0x6985);

    /// Command not allowed in the current state
    pub const COMMAND_NOT_ALLOWED: Self = Self(0x6986);

    /// Function not supported by this card
    pub const FUNCTION_NOT_SUPPORTED: Self = Self(0x6a81);

    /// Not enough memory space
    pub const NOT_ENOUGH_MEMORY: Self = Self(0x6a84);

    /// Balance too low for the requested operation
    pub const INSUFFICIENT_FUNDS: Self = Self(0x6a90);

    /// Instruction code not supported
    pub const INS_NOT_SUPPORTED: Self = Self(0x6d00);

    /// Class not supported
    pub const CLA_NOT_SUPPORTED: Self = Self(0x6e00);

    /// No precise diagnosis
    pub const UNKNOWN: Self = Self(0x6f00);

    /// Base for verification failures, low nibble carries the remaining tries
    const WRONG_PIN_BASE: u16 = 0x63c0;

    /// Build a "wrong PIN, `remaining` tries left" status
    pub const fn wrong_pin(remaining: u8) -> Self {
        Self(Self::WRONG_PIN_BASE | (remaining as u16 & 0x0f))
    }

    /// Decode a status word from its two wire bytes (`SW1 SW2`)
    pub const fn from_bytes(b: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(b))
    }

    /// Encode a status word to its two wire bytes (`SW1 SW2`)
    pub const fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Check for success
    pub const fn is_ok(&self) -> bool {
        self.0 == Self::OK.0
    }

    /// Fetch the remaining tries for a "wrong PIN" status
    pub const fn remaining_tries(&self) -> Option<u8> {
        match self.0 & 0xfff0 {
            Self::WRONG_PIN_BASE => Some((self.0 & 0x0f) as u8),
            _ => None,
        }
    }
}

impl From<StatusWord> for u16 {
    fn from(s: StatusWord) -> Self {
        s.0
    }
}

/// Debug format [StatusWord] as hex
impl core::fmt::Debug for StatusWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SW({:04x})", self.0)
    }
}

/// Display [StatusWord] as hex
impl core::fmt::Display for StatusWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::StatusWord;

    #[test]
    fn wrong_pin_counter() {
        for n in 0..=3 {
            let sw = StatusWord::wrong_pin(n);
            assert_eq!(sw.0, 0x63c0 | n as u16);
            assert_eq!(sw.remaining_tries(), Some(n));
        }

        assert_eq!(StatusWord::AUTH_BLOCKED.remaining_tries(), None);
        assert_eq!(StatusWord::OK.remaining_tries(), None);
    }

    #[test]
    fn wire_bytes() {
        let sw = StatusWord::INSUFFICIENT_FUNDS;
        assert_eq!(sw.to_bytes(), [0x6a, 0x90]);
        assert_eq!(StatusWord::from_bytes([0x90, 0x00]), StatusWord::OK);
    }
}
