// Copyright (c) 2022-2023 The MobileCoin Foundation

use strum::Display;

use crate::crypto::MasterKey;

/// Authenticating principal
#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum Principal {
    /// Card holder, authenticated by the user PIN
    Holder,
    /// Operator, authenticated by the admin secret
    Admin,
}

/// Transient session state, never persisted.
///
/// Holds the verified flags for each principal and the master key
/// recovered by the most recent successful verification. The master key
/// is dropped (and zeroized) once neither principal is verified.
#[derive(Default, Debug)]
pub struct Session {
    holder: bool,
    admin: bool,
    master_key: Option<MasterKey>,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            holder: false,
            admin: false,
            master_key: None,
        }
    }

    /// Check whether a principal is verified
    pub fn is_verified(&self, p: Principal) -> bool {
        match p {
            Principal::Holder => self.holder,
            Principal::Admin => self.admin,
        }
    }

    /// Fetch the session master key, only available to verified principals
    pub(crate) fn master_key(&self, p: Principal) -> Option<&MasterKey> {
        match self.is_verified(p) {
            true => self.master_key.as_ref(),
            false => None,
        }
    }

    /// Mark a principal verified, caching the recovered master key
    pub(crate) fn open(&mut self, p: Principal, master_key: MasterKey) {
        match p {
            Principal::Holder => self.holder = true,
            Principal::Admin => self.admin = true,
        }
        self.master_key = Some(master_key);
    }

    /// Drop a principal's verification
    pub(crate) fn close(&mut self, p: Principal) {
        match p {
            Principal::Holder => self.holder = false,
            Principal::Admin => self.admin = false,
        }

        if !self.holder && !self.admin {
            self.master_key = None;
        }
    }

    /// Drop all verification and the cached master key
    pub fn clear(&mut self) {
        self.holder = false;
        self.admin = false;
        self.master_key = None;
    }
}

#[cfg(test)]
mod test {
    use rand_core::OsRng;

    use super::*;

    #[test]
    fn key_held_while_any_principal_verified() {
        let mut s = Session::new();

        s.open(Principal::Holder, MasterKey::random(&mut OsRng));
        s.open(Principal::Admin, MasterKey::random(&mut OsRng));
        assert!(s.master_key(Principal::Admin).is_some());

        s.close(Principal::Holder);
        assert!(s.master_key(Principal::Holder).is_none());
        assert!(s.master_key(Principal::Admin).is_some());

        s.close(Principal::Admin);
        assert!(s.master_key.is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = Session::new();
        s.open(Principal::Holder, MasterKey::random(&mut OsRng));

        s.clear();

        assert!(!s.is_verified(Principal::Holder));
        assert!(!s.is_verified(Principal::Admin));
        assert!(s.master_key.is_none());
    }
}
