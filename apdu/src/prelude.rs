//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    app_info::{AppFlags, AppInfoReq, AppInfoResp},
    blob::{BlobChunkResp, BlobContinueReq, BlobInfoReq, BlobInfoResp, BlobReadReq, BlobStartReq},
    card::{IdentityResp, ProvisionReq, ProvisionResp, ReadIdentityReq, SelectReq, WipeReq},
    economy::{PlayGameReq, PlayGameResp, PurchaseBundleReq, TopUpReq},
    ident::{IdentityKey, SignChallengeReq, SignatureResp},
    pin::{AdminUnlockReq, ChangePinReq, VerifyAdminReq, VerifyPinReq},
    profile::{FieldIter, FieldResp, FieldTag, ReadFieldReq, WriteFieldsReq},
    status::StatusWord,
};
