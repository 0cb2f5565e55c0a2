//! Top-up, pay-per-play and bundle purchases

use gamecard_core::{apdu::prelude::*, engine::MAX_OWNED_GAMES};

mod helpers;
use helpers::*;

fn play(e: &mut TestEngine, game: u8, price: u16) -> Result<bool, StatusWord> {
    let mut resp = [0u8; 256];
    match exchange(e, &PlayGameReq::new(game, price), &mut resp) {
        (1, sw) if sw.is_ok() => Ok(resp[0] == PlayGameResp::CHARGED),
        (_, sw) => Err(sw),
    }
}

fn buy(e: &mut TestEngine, games: &[u8], price: u32) -> StatusWord {
    status(e, &PurchaseBundleReq::new(games, price))
}

#[test]
fn top_up_play_replay() {
    let mut e = engine();
    provision(&mut e);

    assert_eq!(verify_pin(&mut e, PIN), StatusWord::OK);
    assert_eq!(balance(&mut e), 0);

    assert_eq!(status(&mut e, &TopUpReq::new(500)), StatusWord::OK);
    assert_eq!(balance(&mut e), 500);

    assert_eq!(play(&mut e, 7, 500), Ok(true));
    assert_eq!(balance(&mut e), 0);
    assert_eq!(games(&mut e), &[7]);

    // Owned games play for free
    assert_eq!(play(&mut e, 7, 500), Ok(false));
    assert_eq!(balance(&mut e), 0);
    assert_eq!(games(&mut e), &[7]);
}

#[test]
fn play_exact_balance() {
    let mut e = engine();
    provision_verified(&mut e);
    assert_eq!(status(&mut e, &TopUpReq::new(300)), StatusWord::OK);

    // One short
    assert_eq!(play(&mut e, 3, 301), Err(StatusWord::INSUFFICIENT_FUNDS));
    assert_eq!(balance(&mut e), 300);
    assert!(games(&mut e).is_empty());

    // Exact
    assert_eq!(play(&mut e, 3, 300), Ok(true));
    assert_eq!(balance(&mut e), 0);
}

#[test]
fn bundle_purchase() {
    let mut e = engine();
    provision_verified(&mut e);
    assert_eq!(status(&mut e, &TopUpReq::new(1000)), StatusWord::OK);

    // Duplicates within the request are collapsed
    assert_eq!(buy(&mut e, &[4, 9, 4], 600), StatusWord::OK);
    assert_eq!(balance(&mut e), 400);
    assert_eq!(games(&mut e), &[4, 9]);

    // Already-owned games are not added twice
    assert_eq!(buy(&mut e, &[9, 11], 100), StatusWord::OK);
    assert_eq!(balance(&mut e), 300);
    assert_eq!(games(&mut e), &[4, 9, 11]);

    // And play for free
    assert_eq!(play(&mut e, 9, 250), Ok(false));
    assert_eq!(balance(&mut e), 300);
}

#[test]
fn bundle_insufficient_funds() {
    let mut e = engine();
    provision_verified(&mut e);
    assert_eq!(status(&mut e, &TopUpReq::new(100)), StatusWord::OK);

    let before = e.store().clone();

    assert_eq!(buy(&mut e, &[1, 2], 101), StatusWord::INSUFFICIENT_FUNDS);
    assert_eq!(buy(&mut e, &[1, 2], 0x1_0000), StatusWord::INSUFFICIENT_FUNDS);
    assert_eq!(e.store(), &before);

    assert_eq!(balance(&mut e), 100);
    assert!(games(&mut e).is_empty());
}

#[test]
fn owned_list_capacity() {
    let mut e = engine();
    provision_verified(&mut e);
    assert_eq!(status(&mut e, &TopUpReq::new(100)), StatusWord::OK);

    let all: Vec<u8> = (1..=MAX_OWNED_GAMES as u8).collect();
    assert_eq!(buy(&mut e, &all, 0), StatusWord::OK);
    assert_eq!(games(&mut e), all);

    let before = e.store().clone();

    assert_eq!(play(&mut e, 200, 10), Err(StatusWord::NOT_ENOUGH_MEMORY));
    assert_eq!(buy(&mut e, &[201], 10), StatusWord::NOT_ENOUGH_MEMORY);
    assert_eq!(e.store(), &before);

    assert_eq!(balance(&mut e), 100);
}

#[test]
fn top_up_overflow() {
    let mut e = engine();
    provision_verified(&mut e);

    assert_eq!(status(&mut e, &TopUpReq::new(u16::MAX)), StatusWord::OK);
    assert_eq!(status(&mut e, &TopUpReq::new(1)), StatusWord::WRONG_DATA);
    assert_eq!(balance(&mut e), u16::MAX);
}

#[test]
fn economy_requires_holder_session() {
    let mut e = engine();
    provision(&mut e);

    assert_eq!(
        status(&mut e, &TopUpReq::new(10)),
        StatusWord::VERIFICATION_REQUIRED
    );
    assert_eq!(play(&mut e, 1, 0), Err(StatusWord::VERIFICATION_REQUIRED));
    assert_eq!(buy(&mut e, &[1], 0), StatusWord::VERIFICATION_REQUIRED);
}
