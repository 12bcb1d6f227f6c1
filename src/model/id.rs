use std::fmt::Display;

use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

/// Opaque, stable identifier for voters and candidates.
///
/// Identifiers are strings so that records created by older deployments
/// (which used timestamps) round-trip unchanged. New identifiers are allocated
/// as the next free integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Allocate the identifier following the largest numeric identifier in `existing`.
    /// Non-numeric identifiers are ignored.
    pub fn successor<'a>(existing: impl IntoIterator<Item = &'a Id>) -> Self {
        let next = existing
            .into_iter()
            .filter_map(|id| id.0.parse::<u64>().ok())
            .max()
            .map_or(1, |max| u128::from(max) + 1);
        Self(next.to_string())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'a> FromParam<'a> for Id {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        if param.is_empty() {
            Err(param)
        } else {
            Ok(Self(param.to_string()))
        }
    }
}

impl UriDisplay<Path> for Id {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> std::fmt::Result {
        formatter.write_value(&self.0)
    }
}

impl_from_uri_param_identity!([Path] Id);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_of_nothing_is_one() {
        assert_eq!(Id::from("1"), Id::successor(std::iter::empty()));
    }

    #[test]
    fn successor_skips_non_numeric() {
        let existing = [Id::from("3"), Id::from("legacy"), Id::from("1717171717")];
        assert_eq!(Id::from("1717171718"), Id::successor(&existing));
    }

    #[test]
    fn successor_of_largest_id_is_unique() {
        let existing = [Id::from(u64::MAX.to_string().as_str())];
        assert_eq!(Id::from("18446744073709551616"), Id::successor(&existing));
    }
}
