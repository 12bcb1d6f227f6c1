use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::{id::Id, required, unique_id::UniqueId};

/// A registered voter, as persisted under `verifiedVoters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voter {
    pub id: Id,
    pub username: String,
    /// Stored and compared as an opaque string.
    pub password: String,
    /// National student number.
    pub nisn: String,
    pub full_name: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub is_verified: bool,
    pub has_voted: bool,
    pub unique_id: UniqueId,
}

impl Voter {
    /// Create an unverified voter who has not voted.
    pub fn new(id: Id, unique_id: UniqueId, spec: ValidVoterSpec) -> Self {
        Self {
            id,
            username: spec.username,
            password: spec.password,
            nisn: spec.nisn,
            full_name: spec.full_name,
            birth_place: spec.birth_place,
            birth_date: spec.birth_date,
            is_verified: false,
            has_voted: false,
            unique_id,
        }
    }
}

/// Registration form for a new voter, as submitted by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterSpec {
    pub username: String,
    pub password: String,
    pub nisn: String,
    pub full_name: String,
    pub birth_place: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
}

/// A [`VoterSpec`] whose fields have all been checked and trimmed.
#[derive(Debug, Clone)]
pub struct ValidVoterSpec {
    username: String,
    password: String,
    nisn: String,
    full_name: String,
    birth_place: String,
    birth_date: NaiveDate,
}

impl ValidVoterSpec {
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl TryFrom<VoterSpec> for ValidVoterSpec {
    type Error = ValidationError;

    /// Every field is required. The password is checked for emptiness but
    /// kept exactly as typed.
    fn try_from(spec: VoterSpec) -> Result<Self, Self::Error> {
        let birth_date = required("birthDate", &spec.birth_date)?;
        let birth_date = NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(birth_date))?;
        required("password", &spec.password)?;

        Ok(Self {
            username: required("username", &spec.username)?,
            password: spec.password,
            nisn: required("nisn", &spec.nisn)?,
            full_name: required("fullName", &spec.full_name)?,
            birth_place: required("birthPlace", &spec.birth_place)?,
            birth_date,
        })
    }
}

/// A voter as shown to operators: everything but the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterDescription {
    pub id: Id,
    pub username: String,
    pub nisn: String,
    pub full_name: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub is_verified: bool,
    pub has_voted: bool,
    pub unique_id: UniqueId,
}

impl From<Voter> for VoterDescription {
    fn from(voter: Voter) -> Self {
        Self {
            id: voter.id,
            username: voter.username,
            nisn: voter.nisn,
            full_name: voter.full_name,
            birth_place: voter.birth_place,
            birth_date: voter.birth_date,
            is_verified: voter.is_verified,
            has_voted: voter.has_voted,
            unique_id: voter.unique_id,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterSpec {
        pub fn example() -> Self {
            Self {
                username: "rina_kartika".to_string(),
                password: "rina123".to_string(),
                nisn: "1234567893".to_string(),
                full_name: "Rina Kartika".to_string(),
                birth_place: "Yogyakarta".to_string(),
                birth_date: "2006-08-01".to_string(),
            }
        }
    }

    impl Voter {
        pub fn example() -> Self {
            Self {
                id: Id::from("3"),
                username: "budi_santoso".to_string(),
                password: "budi123".to_string(),
                nisn: "1234567892".to_string(),
                full_name: "Budi Santoso".to_string(),
                birth_place: "Surabaya".to_string(),
                birth_date: NaiveDate::from_ymd_opt(2005, 12, 10).unwrap(),
                is_verified: true,
                has_voted: false,
                unique_id: "345678901234567".parse().unwrap(),
            }
        }
    }
}
