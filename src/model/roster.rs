use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;

use super::{
    election::Election,
    id::Id,
    store::Persisted,
    unique_id::UniqueId,
    voter::{ValidVoterSpec, Voter, VoterSpec},
};

/// How many random unique IDs to try before giving up on a registration.
const MAX_UNIQUE_ID_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("A voter with username `{0}` is already registered")]
    DuplicateUsername(String),
    #[error("A voter with NISN `{0}` is already registered")]
    DuplicateNisn(String),
    #[error("Could not allocate an unused unique ID")]
    DuplicateUniqueId,
    #[error("No voter with ID {0}")]
    VoterNotFound(Id),
    #[error("{0} has already voted")]
    AlreadyVoted(String),
}

/// The ordered list of registered voters.
///
/// Usernames are unique ignoring case, NISNs and unique IDs are unique
/// exactly. Voters are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    voters: Vec<Voter>,
}

impl Persisted for Roster {
    const KEY: &'static str = "verifiedVoters";
}

impl Roster {
    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn get(&self, id: &Id) -> std::result::Result<&Voter, RosterError> {
        self.voters
            .iter()
            .find(|voter| &voter.id == id)
            .ok_or_else(|| RosterError::VoterNotFound(id.clone()))
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Voter> {
        self.voters.iter().find(|voter| voter.username == username)
    }

    pub fn find_by_unique_id(&self, unique_id: &UniqueId) -> Option<&Voter> {
        self.voters.iter().find(|voter| &voter.unique_id == unique_id)
    }

    /// Case-insensitive exact match on the full name.
    pub fn find_by_full_name(&self, name: &str) -> Option<&Voter> {
        let name = name.trim().to_lowercase();
        self.voters
            .iter()
            .find(|voter| voter.full_name.to_lowercase() == name)
    }

    /// Append a voter, rejecting username, NISN and unique ID collisions.
    pub fn add(&mut self, voter: Voter) -> std::result::Result<&Voter, RosterError> {
        let username = voter.username.to_lowercase();
        if self
            .voters
            .iter()
            .any(|existing| existing.username.to_lowercase() == username)
        {
            return Err(RosterError::DuplicateUsername(voter.username));
        }
        if self.voters.iter().any(|existing| existing.nisn == voter.nisn) {
            return Err(RosterError::DuplicateNisn(voter.nisn));
        }
        if self.find_by_unique_id(&voter.unique_id).is_some() {
            return Err(RosterError::DuplicateUniqueId);
        }

        self.voters.push(voter);
        Ok(&self.voters[self.voters.len() - 1])
    }

    /// Mark a voter as verified. Verifying twice is harmless.
    pub fn mark_verified(&mut self, id: &Id) -> std::result::Result<&Voter, RosterError> {
        let voter = self.get_mut(id)?;
        voter.is_verified = true;
        Ok(voter)
    }

    /// Flip a voter's `has_voted` flag. This succeeds at most once per voter.
    pub fn mark_voted(&mut self, id: &Id) -> std::result::Result<&Voter, RosterError> {
        let voter = self.get_mut(id)?;
        if voter.has_voted {
            return Err(RosterError::AlreadyVoted(voter.full_name.clone()));
        }
        voter.has_voted = true;
        Ok(voter)
    }

    /// Start a new voting round: nobody has voted.
    pub(crate) fn clear_votes(&mut self) {
        for voter in &mut self.voters {
            voter.has_voted = false;
        }
    }

    pub fn next_id(&self) -> Id {
        Id::successor(self.voters.iter().map(|voter| &voter.id))
    }

    /// Draw unique IDs from `generate` until one is not already taken.
    pub fn fresh_unique_id<F>(&self, mut generate: F) -> std::result::Result<UniqueId, RosterError>
    where
        F: FnMut() -> UniqueId,
    {
        (0..MAX_UNIQUE_ID_ATTEMPTS)
            .map(|_| generate())
            .find(|candidate| self.find_by_unique_id(candidate).is_none())
            .ok_or(RosterError::DuplicateUniqueId)
    }

    fn get_mut(&mut self, id: &Id) -> std::result::Result<&mut Voter, RosterError> {
        self.voters
            .iter_mut()
            .find(|voter| &voter.id == id)
            .ok_or_else(|| RosterError::VoterNotFound(id.clone()))
    }
}

impl FromIterator<Voter> for Roster {
    fn from_iter<T: IntoIterator<Item = Voter>>(iter: T) -> Self {
        Self {
            voters: iter.into_iter().collect(),
        }
    }
}

impl Election {
    /// Register a new, unverified voter with a freshly drawn unique ID.
    pub fn register_voter(&self, spec: VoterSpec) -> Result<Voter> {
        let spec = ValidVoterSpec::try_from(spec)?;
        let voter = self.transact(|state| {
            let id = state.roster.next_id();
            let unique_id = state.roster.fresh_unique_id(UniqueId::random)?;
            Ok(state.roster.add(Voter::new(id, unique_id, spec))?.clone())
        })?;
        info!("Registered voter {} ({})", voter.id, voter.username);
        Ok(voter)
    }

    /// Mark a voter as verified, allowing them to vote.
    pub fn verify_voter(&self, id: &Id) -> Result<Voter> {
        let voter = self.transact(|state| Ok(state.roster.mark_verified(id)?.clone()))?;
        info!("Verified voter {} ({})", voter.id, voter.username);
        Ok(voter)
    }

    pub fn voter(&self, id: &Id) -> Result<Voter> {
        self.read(|state| Ok(state.roster.get(id)?.clone()))
    }

    /// All voters in registration order.
    pub fn voters(&self) -> Vec<Voter> {
        self.read(|state| state.roster.voters().to_vec())
    }
}
