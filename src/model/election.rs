//! The process-wide election: roster, slate and the open/closed flag.
//!
//! All three live behind a single lock. Every mutation runs on a working copy
//! which is written to the store before it replaces the live state, so a
//! failed write leaves both memory and storage as they were.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;

use super::{
    ballot::{percentage, Slate},
    identity::Operators,
    roster::Roster,
    seed,
    store::{KeyValueStore, Persisted, StoreError},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("The election must be closed before it can be reset")]
    ElectionOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ElectionState {
    pub(crate) roster: Roster,
    pub(crate) slate: Slate,
    pub(crate) active: bool,
}

/// Whether voting is open, as persisted under `electionActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct ElectionActive(bool);

impl Persisted for ElectionActive {
    const KEY: &'static str = "electionActive";
}

/// Turnout summary for verifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recap {
    pub registered: usize,
    pub verified: usize,
    pub voted: usize,
    /// Registered voters who have not voted yet.
    pub remaining: usize,
    /// `voted / registered` as a rounded percentage.
    pub participation: u64,
}

pub struct Election {
    state: Mutex<ElectionState>,
    operators: Operators,
    store: Box<dyn KeyValueStore + Send + Sync>,
}

impl Election {
    /// Load the election from `store`. Missing keys start empty, and an
    /// election with no stored flag is open.
    pub fn open(
        store: Box<dyn KeyValueStore + Send + Sync>,
        operators: Operators,
    ) -> std::result::Result<Self, StoreError> {
        let roster = Roster::load_from(store.as_ref())?.unwrap_or_default();
        let slate = Slate::load_from(store.as_ref())?.unwrap_or_default();
        let ElectionActive(active) =
            ElectionActive::load_from(store.as_ref())?.unwrap_or(ElectionActive(true));
        debug!(
            "Loaded election: {} voters, {} candidates, active={active}",
            roster.len(),
            slate.len()
        );

        Ok(Self {
            state: Mutex::new(ElectionState {
                roster,
                slate,
                active,
            }),
            operators,
            store,
        })
    }

    /// Install the demo slate and roster, but only into an empty election.
    /// Returns whether anything was seeded.
    pub fn seed_demo(&self) -> Result<bool> {
        let seeded = self.transact(|state| {
            if !state.roster.is_empty() || !state.slate.is_empty() {
                return Ok(false);
            }
            state.roster = seed::demo_roster()?;
            state.slate = seed::demo_slate()?;
            Ok(true)
        })?;
        if seeded {
            info!("Seeded demo candidates and voters");
        }
        Ok(seeded)
    }

    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    fn lock(&self) -> MutexGuard<'_, ElectionState> {
        // Every write goes through a draft, so a panic cannot leave the live
        // state half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn read<T, F>(&self, inspect: F) -> T
    where
        F: FnOnce(&ElectionState) -> T,
    {
        inspect(&self.lock())
    }

    /// Apply `change` to a copy of the state, persist whatever it touched,
    /// then commit. Nothing is kept if `change` or a write fails.
    pub(crate) fn transact<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut ElectionState) -> Result<T>,
    {
        let mut state = self.lock();
        let mut draft = state.clone();
        let value = change(&mut draft)?;

        let store = self.store.as_ref();
        if draft.roster != state.roster {
            draft.roster.save_to(store)?;
            debug!("Saved {}", Roster::KEY);
        }
        if draft.slate != state.slate {
            draft.slate.save_to(store)?;
            debug!("Saved {}", Slate::KEY);
        }
        if draft.active != state.active {
            ElectionActive(draft.active).save_to(store)?;
            debug!("Saved {}", ElectionActive::KEY);
        }

        *state = draft;
        Ok(value)
    }

    pub fn is_active(&self) -> bool {
        self.read(|state| state.active)
    }

    pub fn open_voting(&self) -> Result<()> {
        self.set_active(true)
    }

    pub fn close_voting(&self) -> Result<()> {
        self.set_active(false)
    }

    /// Flip the open/closed flag, returning the new value.
    pub fn toggle(&self) -> Result<bool> {
        let active = self.transact(|state| {
            state.active = !state.active;
            Ok(state.active)
        })?;
        info!("Election {}", if active { "opened" } else { "closed" });
        Ok(active)
    }

    fn set_active(&self, active: bool) -> Result<()> {
        let changed = self.transact(|state| {
            let changed = state.active != active;
            state.active = active;
            Ok(changed)
        })?;
        if changed {
            info!("Election {}", if active { "opened" } else { "closed" });
        }
        Ok(())
    }

    /// Start a new round: every candidate back to zero and every voter
    /// allowed to vote again. Refused while voting is open.
    pub fn reset_tally(&self) -> Result<()> {
        self.transact(|state| {
            if state.active {
                return Err(ControlError::ElectionOpen.into());
            }
            state.slate.reset();
            state.roster.clear_votes();
            Ok(())
        })?;
        info!("Election tally reset");
        Ok(())
    }

    pub fn recap(&self) -> Recap {
        self.read(|state| {
            let voters = state.roster.voters();
            let registered = voters.len();
            let verified = voters.iter().filter(|voter| voter.is_verified).count();
            let voted = voters.iter().filter(|voter| voter.has_voted).count();
            Recap {
                registered,
                verified,
                voted,
                remaining: registered - voted,
                participation: percentage(voted as u64, registered as u64),
            }
        })
    }
}
