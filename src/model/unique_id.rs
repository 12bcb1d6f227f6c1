use std::convert::TryInto;
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

use rand::distributions::{Distribution, Uniform};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const LENGTH: usize = 15;

/// The 15-digit key printed on a voter's token. It is the only part of a
/// token that is trusted during token login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueId {
    digits: [u8; LENGTH],
}

impl UniqueId {
    /// Generate a random unique ID. Uniqueness against the roster is the
    /// caller's responsibility.
    pub fn random() -> Self {
        let mut digits = [0; LENGTH];
        let digit_dist = Uniform::from(0..=9);
        let mut rng = rand::thread_rng();
        for digit in &mut digits {
            *digit = digit_dist.sample(&mut rng);
        }
        Self { digits }
    }
}

impl Deref for UniqueId {
    type Target = [u8; LENGTH];

    fn deref(&self) -> &Self::Target {
        &self.digits
    }
}

/// Unique IDs are stored and transmitted as digit strings.
impl Serialize for UniqueId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UniqueId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(D::Error::custom)
    }
}

impl Display for UniqueId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for digit in self.digits {
            write!(formatter, "{digit}")?;
        }
        Ok(())
    }
}

impl FromStr for UniqueId {
    type Err = ParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let len = string.chars().count();
        if len != LENGTH {
            return Err(Self::Err::InvalidLength(len));
        }
        let digits = string
            .chars()
            .map(|c| match c {
                '0'..='9' => Ok(c as u8 - b'0'),
                _ => Err(Self::Err::InvalidChar(c)),
            })
            .collect::<Result<Vec<u8>, Self::Err>>()?;
        Ok(Self {
            digits: digits.try_into().unwrap(), // Valid because digits.len() == LENGTH
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unique ID must contain exactly 15 digits, found {0} characters")]
    InvalidLength(usize),
    #[error("unique ID must contain only digits, found '{0}'")]
    InvalidChar(char),
}
