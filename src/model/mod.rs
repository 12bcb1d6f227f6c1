//! The voter-identity and ballot-integrity core.
//!
//! Everything here is synchronous and independent of the HTTP layer, apart
//! from the request guard that builds a [`session::Session`] from cookies.

use crate::error::ValidationError;

pub mod ballot;
pub mod candidate;
pub mod election;
pub mod gate;
pub mod id;
pub mod identity;
pub mod roster;
pub mod seed;
pub mod session;
pub mod store;
pub mod token;
pub mod unique_id;
pub mod voter;

/// Trim a required text field, rejecting it if nothing is left.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(trimmed.to_string())
    }
}
