// Copyright (c) 2022-2023 The MobileCoin Foundation

use rand_core::CryptoRngCore;
use zeroize::Zeroize;

use gamecard_apdu::{status::StatusWord, APDU_HEADER_LEN, CARD_APDU_CLA, SELECT_INS};

use super::{Driver, Engine, Error, Event};

impl<DRV: Driver, RNG: CryptoRngCore> Engine<DRV, RNG> {
    /// Handle a raw command APDU (`CLA INS P1 P2 Lc DATA`), writing any
    /// response data to `resp` and returning the response length and
    /// status word.
    ///
    /// The command buffer is zeroed before returning as it may carry PINs.
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn process(&mut self, cmd: &mut [u8], resp: &mut [u8]) -> (usize, StatusWord) {
        let r = self.handle_apdu(cmd, resp);

        cmd.zeroize();

        match r {
            Ok(n) => (n, StatusWord::OK),
            Err(e) => (0, e.status()),
        }
    }

    fn handle_apdu(&mut self, cmd: &[u8], resp: &mut [u8]) -> Result<usize, Error> {
        // Reject short APDUs
        if cmd.len() < APDU_HEADER_LEN {
            return Err(Error::InvalidLength);
        }

        // Read class and instruction
        let (cla, ins, lc) = (cmd[0], cmd[1], cmd[4] as usize);

        // SELECT is accepted with any class, all other commands are proprietary
        if ins != SELECT_INS && cla != CARD_APDU_CLA {
            return Err(Error::UnsupportedClass);
        }

        let data = cmd
            .get(APDU_HEADER_LEN..APDU_HEADER_LEN + lc)
            .ok_or(Error::InvalidLength)?;

        // Decode APDU to engine event
        let evt = Event::parse(ins, data)?;

        // Update engine
        let output = self.update(&evt)?;

        // Encode response
        output.encode(resp).map_err(|_| Error::EncodingFailed)
    }
}
