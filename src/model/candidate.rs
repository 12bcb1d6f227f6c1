use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::{id::Id, required};

/// Photo used when a candidate is registered without one.
pub const DEFAULT_PHOTO: &str = "https://placeholder-image-service.onrender.com/image/200x200?prompt=Indonesian%20student%20in%20school%20uniform";

/// A slate entry, as persisted under `candidates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Id,
    pub name: String,
    /// Class or group label, e.g. `XI IPA 1`.
    pub class: String,
    pub vision: String,
    pub mission: String,
    /// Opaque photo URI.
    pub photo: String,
    /// Only ever incremented by casting a vote, or zeroed by a reset.
    pub votes: u64,
}

/// Registration form for a new candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub class: String,
    pub vision: String,
    pub mission: String,
    #[serde(default)]
    pub photo: Option<String>,
}

impl Candidate {
    /// Build a candidate with no votes from a registration form.
    pub fn new(id: Id, spec: CandidateSpec) -> Result<Self, ValidationError> {
        let photo = spec
            .photo
            .map(|photo| photo.trim().to_string())
            .filter(|photo| !photo.is_empty())
            .unwrap_or_else(|| DEFAULT_PHOTO.to_string());

        Ok(Self {
            id,
            name: required("name", &spec.name)?,
            class: required("class", &spec.class)?,
            vision: required("vision", &spec.vision)?,
            mission: required("mission", &spec.mission)?,
            photo,
            votes: 0,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_candidate_starts_at_zero() {
        let candidate = Candidate::new(Id::from("3"), CandidateSpec::example()).unwrap();
        assert_eq!(0, candidate.votes);
        assert_eq!(DEFAULT_PHOTO, candidate.photo);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let spec = CandidateSpec {
            mission: " \t ".to_string(),
            ..CandidateSpec::example()
        };
        assert_eq!(
            Err(ValidationError::EmptyField("mission")),
            Candidate::new(Id::from("3"), spec)
        );
    }
}
