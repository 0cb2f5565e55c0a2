// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::{fs, path::Path};

use log::{debug, info};
use strum::IntoEnumIterator;

use gamecard_apdu::profile::FieldTag;
use gamecard_core::engine::{Store, MAX_OWNED_GAMES};

/// Variable length hex-encoded bytes
#[derive(Clone, PartialEq, Debug)]
pub struct HexData(pub Vec<u8>);

impl std::str::FromStr for HexData {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s).map(HexData)
    }
}

impl AsRef<[u8]> for HexData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Fixed length hex-encoded bytes
#[derive(Clone, PartialEq, Debug)]
pub struct HexArray<const N: usize>(pub [u8; N]);

impl<const N: usize> std::str::FromStr for HexArray<N> {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut b = [0u8; N];

        hex::decode_to_slice(s, &mut b)?;

        Ok(HexArray(b))
    }
}

/// Parse a field tag by name (case insensitive) or number
pub fn parse_tag(s: &str) -> Result<FieldTag, String> {
    if let Ok(v) = s.parse::<u8>() {
        return FieldTag::try_from(v).map_err(|_| format!("unknown tag: {v}"));
    }

    FieldTag::iter()
        .find(|t| t.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown tag: {s}"))
}

/// Parse a `TAG=VALUE` field assignment into the field encoding
pub fn parse_field(s: &str) -> Result<(FieldTag, Vec<u8>), String> {
    let (tag, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=VALUE, found: {s}"))?;

    let tag = parse_tag(tag)?;

    let value = match tag {
        FieldTag::Name | FieldTag::Gender => value.as_bytes().to_vec(),
        FieldTag::Age => {
            let a = value.parse::<u8>().map_err(|e| format!("invalid age: {e}"))?;
            vec![a]
        }
        FieldTag::Balance => {
            let b = value
                .parse::<u16>()
                .map_err(|e| format!("invalid balance: {e}"))?;
            b.to_le_bytes().to_vec()
        }
        FieldTag::Games => {
            let games = value
                .split(',')
                .filter(|g| !g.is_empty())
                .map(|g| g.parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("invalid game id: {e}"))?;

            if games.len() > MAX_OWNED_GAMES {
                return Err(format!("at most {MAX_OWNED_GAMES} games"));
            }

            let mut v = vec![games.len() as u8];
            v.extend_from_slice(&games);
            v
        }
    };

    Ok((tag, value))
}

/// Render a field value for display
pub fn format_field(tag: FieldTag, value: &[u8]) -> String {
    match (tag, value) {
        (FieldTag::Balance, [a, b]) => u16::from_le_bytes([*a, *b]).to_string(),
        (FieldTag::Games, [_n, ids @ ..]) => format!("{ids:?}"),
        (FieldTag::Age, [a]) => a.to_string(),
        (FieldTag::Name | FieldTag::Gender, v) => String::from_utf8_lossy(v).to_string(),
        (_, v) => hex::encode(v),
    }
}

/// Load a card image, returning a blank store where none exists
pub fn load_image(path: &Path) -> anyhow::Result<Store> {
    if !path.exists() {
        info!("no image at {}, starting blank card", path.display());
        return Ok(Store::new());
    }

    let s = fs::read_to_string(path)?;
    let store = serde_json::from_str(&s)?;

    debug!("loaded image from {}", path.display());

    Ok(store)
}

/// Persist a card image
pub fn save_image(path: &Path, store: &Store) -> anyhow::Result<()> {
    let s = serde_json::to_string(store)?;
    fs::write(path, s)?;

    debug!("saved image to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_fields() {
        assert_eq!(parse_tag("balance"), Ok(FieldTag::Balance));
        assert_eq!(parse_tag("4"), Ok(FieldTag::Games));
        assert!(parse_tag("shoe-size").is_err());

        assert_eq!(
            parse_field("name=alice"),
            Ok((FieldTag::Name, b"alice".to_vec()))
        );
        assert_eq!(parse_field("age=27"), Ok((FieldTag::Age, vec![27])));
        assert_eq!(
            parse_field("balance=500"),
            Ok((FieldTag::Balance, vec![0xf4, 0x01]))
        );
        assert_eq!(
            parse_field("games=7,9"),
            Ok((FieldTag::Games, vec![2, 7, 9]))
        );
        assert_eq!(parse_field("games="), Ok((FieldTag::Games, vec![0])));
        assert!(parse_field("name").is_err());
    }

    #[test]
    fn format_fields() {
        assert_eq!(format_field(FieldTag::Balance, &[0xf4, 0x01]), "500");
        assert_eq!(format_field(FieldTag::Games, &[2, 7, 9]), "[7, 9]");
        assert_eq!(format_field(FieldTag::Name, b"alice"), "alice");
    }
}
