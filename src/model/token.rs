//! The text payload carried by a voter's QR token.
//!
//! A payload is a series of `Key: value` lines. Only `UNIQUE_ID` is trusted;
//! the remaining lines exist so that a person holding the printed token can
//! read who it belongs to.
//!
//! ```text
//! UNIQUE_ID: 345678901234567
//! NISN: 1234567892
//! Nama: Budi Santoso
//! Username: budi_santoso
//! Tempat Lahir: Surabaya
//! Tanggal Lahir: 2005-12-10
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::error::Result;

use super::{election::Election, id::Id, unique_id::UniqueId, voter::Voter};

pub const UNIQUE_ID_KEY: &str = "UNIQUE_ID";
pub const NISN_KEY: &str = "NISN";
pub const NAME_KEY: &str = "Nama";
pub const USERNAME_KEY: &str = "Username";
pub const BIRTH_PLACE_KEY: &str = "Tempat Lahir";
pub const BIRTH_DATE_KEY: &str = "Tanggal Lahir";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedToken {
    #[error("Token payload is empty")]
    Empty,
    #[error("Token has no UNIQUE_ID line")]
    MissingUniqueId,
    #[error("Token UNIQUE_ID must be exactly 15 digits, found `{0}`")]
    InvalidUniqueIdFormat(String),
}

/// A decoded token. Everything except `unique_id` is display-only and is
/// never checked against the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaim {
    pub unique_id: UniqueId,
    pub nisn: Option<String>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub birth_place: Option<String>,
    pub birth_date: Option<String>,
}

/// Payload keys in encoding order.
const KEYS: [&str; 6] = [
    UNIQUE_ID_KEY,
    NISN_KEY,
    NAME_KEY,
    USERNAME_KEY,
    BIRTH_PLACE_KEY,
    BIRTH_DATE_KEY,
];

/// Parse a raw token payload.
///
/// Keys are matched ignoring case and surrounding whitespace. Lines without a
/// colon and unknown keys are skipped. If a key repeats, the first one wins.
pub fn decode(raw: &str) -> std::result::Result<TokenClaim, MalformedToken> {
    if raw.trim().is_empty() {
        return Err(MalformedToken::Empty);
    }

    let mut fields: [Option<String>; 6] = Default::default();
    for line in raw.lines() {
        let (key, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };
        if let Some(index) = KEYS
            .iter()
            .position(|known| key.trim().eq_ignore_ascii_case(known))
        {
            fields[index].get_or_insert_with(|| value.trim().to_string());
        }
    }

    let [unique_id, nisn, full_name, username, birth_place, birth_date] = fields;
    let unique_id = unique_id.ok_or(MalformedToken::MissingUniqueId)?;
    let unique_id = unique_id
        .parse()
        .map_err(|_| MalformedToken::InvalidUniqueIdFormat(unique_id))?;

    Ok(TokenClaim {
        unique_id,
        nisn,
        full_name,
        username,
        birth_place,
        birth_date,
    })
}

/// Produce the printable payload for a voter. The output depends only on the
/// voter record, so re-encoding the same voter yields identical bytes.
pub fn encode(voter: &Voter) -> String {
    let values = [
        voter.unique_id.to_string(),
        single_line(&voter.nisn),
        single_line(&voter.full_name),
        single_line(&voter.username),
        single_line(&voter.birth_place),
        voter.birth_date.to_string(),
    ];
    KEYS.iter()
        .zip(values)
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line breaks inside a value would start a new key.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

impl Election {
    /// Mint the token payload for a voter, for printing or export.
    pub fn voter_token(&self, id: &Id) -> Result<String> {
        Ok(encode(&self.voter(id)?))
    }
}
