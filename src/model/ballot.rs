//! The slate of candidates and the vote-casting transaction.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result, ValidationError};

use super::{
    candidate::{Candidate, CandidateSpec},
    election::Election,
    id::Id,
    roster::Roster,
    store::Persisted,
    voter::Voter,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("Voting is closed")]
    ElectionClosed,
    #[error("No voter matches `{0}`")]
    VoterNotFound(String),
    #[error("{0} has not been verified yet")]
    NotVerified(String),
    #[error("{0} has already voted")]
    AlreadyVoted(String),
    #[error("No candidate with ID {0}")]
    UnknownCandidate(Id),
}

/// `part` as a percentage of `whole`, rounded half up. Zero when `whole` is.
pub fn percentage(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        0
    } else {
        (part * 100 + whole / 2) / whole
    }
}

/// Candidates in registration order, as persisted under `candidates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slate {
    candidates: Vec<Candidate>,
}

impl Persisted for Slate {
    const KEY: &'static str = "candidates";
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntry {
    pub candidate: Candidate,
    pub votes: u64,
    pub percentage: u64,
}

impl Slate {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Append a new candidate with no votes.
    pub fn register(&mut self, spec: CandidateSpec) -> std::result::Result<&Candidate, ValidationError> {
        let id = Id::successor(self.candidates.iter().map(|candidate| &candidate.id));
        self.candidates.push(Candidate::new(id, spec)?);
        Ok(&self.candidates[self.candidates.len() - 1])
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|candidate| candidate.votes).sum()
    }

    /// Votes and rounded percentages, in slate order.
    pub fn tally(&self) -> Vec<TallyEntry> {
        let total = self.total_votes();
        self.candidates
            .iter()
            .map(|candidate| TallyEntry {
                candidate: candidate.clone(),
                votes: candidate.votes,
                percentage: percentage(candidate.votes, total),
            })
            .collect()
    }

    /// The candidate with the most votes. Ties go to whoever registered first.
    pub fn winner(&self) -> Option<&Candidate> {
        self.candidates.iter().fold(None, |best, candidate| match best {
            Some(best) if best.votes >= candidate.votes => Some(best),
            _ => Some(candidate),
        })
    }

    fn record_vote(&mut self, id: &Id) -> std::result::Result<&Candidate, VoteError> {
        let candidate = self
            .candidates
            .iter_mut()
            .find(|candidate| &candidate.id == id)
            .ok_or_else(|| VoteError::UnknownCandidate(id.clone()))?;
        candidate.votes += 1;
        Ok(candidate)
    }

    pub(crate) fn reset(&mut self) {
        for candidate in &mut self.candidates {
            candidate.votes = 0;
        }
    }
}

impl FromIterator<Candidate> for Slate {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        Self {
            candidates: iter.into_iter().collect(),
        }
    }
}

/// Who a vote is being cast for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoterRef {
    Id(Id),
    /// A full name, matched ignoring case. Falls back to a voter ID so that
    /// an operator can type either.
    Name(String),
}

impl VoterRef {
    fn resolve<'r>(&self, roster: &'r Roster) -> Option<&'r Voter> {
        match self {
            Self::Id(id) => roster.get(id).ok(),
            Self::Name(name) => roster
                .find_by_full_name(name)
                .or_else(|| roster.get(&Id::from(name.trim())).ok()),
        }
    }
}

impl Display for VoterRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(formatter, "{id}"),
            Self::Name(name) => write!(formatter, "{name}"),
        }
    }
}

/// Proof of a successful cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastReceipt {
    pub voter_id: Id,
    pub candidate_id: Id,
    pub cast_at: DateTime<Utc>,
}

impl Election {
    /// Cast one vote.
    ///
    /// Checks, in order: the election is open, the voter exists, is verified
    /// and has not voted, and the candidate exists. The candidate's count and
    /// the voter's flag change together or not at all, and concurrent casts
    /// for one voter are serialized so that at most one succeeds.
    pub fn cast_vote(&self, voter: &VoterRef, candidate: &Id) -> Result<CastReceipt> {
        let result = self.transact(|state| {
            if !state.active {
                return Err(VoteError::ElectionClosed.into());
            }
            let (voter_id, name) = {
                let found = voter
                    .resolve(&state.roster)
                    .ok_or_else(|| VoteError::VoterNotFound(voter.to_string()))?;
                if !found.is_verified {
                    return Err(VoteError::NotVerified(found.full_name.clone()).into());
                }
                if found.has_voted {
                    return Err(VoteError::AlreadyVoted(found.full_name.clone()).into());
                }
                (found.id.clone(), found.full_name.clone())
            };

            state.slate.record_vote(candidate)?;
            state.roster.mark_voted(&voter_id)?;
            info!("{name} voted for candidate {candidate}");
            Ok(CastReceipt {
                voter_id,
                candidate_id: candidate.clone(),
                cast_at: Utc::now(),
            })
        });

        if let Err(e) = &result {
            warn!("Rejected vote by {voter} for candidate {candidate}: {e}");
        }
        result
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.read(|state| state.slate.candidates().to_vec())
    }

    pub fn register_candidate(&self, spec: CandidateSpec) -> Result<Candidate> {
        let candidate = self.transact(|state| Ok(state.slate.register(spec)?.clone()))?;
        info!("Registered candidate {} ({})", candidate.id, candidate.name);
        Ok(candidate)
    }

    pub fn tally(&self) -> Vec<TallyEntry> {
        self.read(|state| state.slate.tally())
    }

    pub fn winner(&self) -> Result<Candidate> {
        self.read(|state| state.slate.winner().cloned())
            .ok_or_else(|| Error::not_found("candidates"))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::model::{identity::Operators, store::MemoryStore};

    fn seeded() -> Election {
        let election = Election::open(Box::new(MemoryStore::default()), Operators::default()).unwrap();
        election.seed_demo().unwrap();
        election
    }

    fn budi() -> VoterRef {
        VoterRef::Id(Id::from("3"))
    }

    fn vote_error(result: Result<CastReceipt>) -> VoteError {
        match result {
            Err(Error::Vote(e)) => e,
            other => panic!("expected a vote error, got {other:?}"),
        }
    }

    fn assert_tally_matches_roster(election: &Election) {
        let votes: u64 = election.tally().iter().map(|entry| entry.votes).sum();
        let voted = election.voters().iter().filter(|voter| voter.has_voted).count();
        assert_eq!(voted as u64, votes);
    }

    #[test]
    fn percentages_round_to_nearest() {
        assert_eq!(0, percentage(0, 0));
        assert_eq!(33, percentage(1, 3));
        assert_eq!(67, percentage(2, 3));
        assert_eq!(50, percentage(1, 2));
        assert_eq!(100, percentage(4, 4));
    }

    #[test]
    fn successful_cast() {
        let election = seeded();
        let receipt = election.cast_vote(&budi(), &Id::from("2")).unwrap();
        assert_eq!(Id::from("3"), receipt.voter_id);
        assert_eq!(Id::from("2"), receipt.candidate_id);

        let tally = election.tally();
        assert_eq!(vec![0, 1], tally.iter().map(|entry| entry.votes).collect::<Vec<_>>());
        assert_eq!(vec![0, 100], tally.iter().map(|entry| entry.percentage).collect::<Vec<_>>());
        assert!(election.voter(&Id::from("3")).unwrap().has_voted);
        assert_eq!(Id::from("2"), election.winner().unwrap().id);
        assert_tally_matches_roster(&election);
    }

    #[test]
    fn second_cast_is_rejected() {
        let election = seeded();
        election.cast_vote(&budi(), &Id::from("1")).unwrap();
        assert_eq!(
            VoteError::AlreadyVoted("Budi Santoso".to_string()),
            vote_error(election.cast_vote(&budi(), &Id::from("2")))
        );
        assert_eq!(1, election.tally()[0].votes);
        assert_eq!(0, election.tally()[1].votes);
    }

    #[test]
    fn unverified_voter_cannot_cast() {
        let election = seeded();
        assert_eq!(
            VoteError::NotVerified("Sari Dewi".to_string()),
            vote_error(election.cast_vote(&VoterRef::Name("sari dewi".to_string()), &Id::from("1")))
        );
        assert!(!election.voter(&Id::from("2")).unwrap().has_voted);
        assert_eq!(0, election.tally()[0].votes);
    }

    #[test]
    fn closed_election_changes_nothing() {
        let election = seeded();
        election.close_voting().unwrap();
        let before = (election.candidates(), election.voters());
        assert_eq!(
            VoteError::ElectionClosed,
            vote_error(election.cast_vote(&budi(), &Id::from("1")))
        );
        assert_eq!(before, (election.candidates(), election.voters()));
    }

    #[test]
    fn closed_is_checked_before_the_voter() {
        let election = seeded();
        election.close_voting().unwrap();
        assert_eq!(
            VoteError::ElectionClosed,
            vote_error(election.cast_vote(&VoterRef::Name("Nobody".to_string()), &Id::from("9")))
        );
    }

    #[test]
    fn unknown_voter_and_candidate() {
        let election = seeded();
        assert_eq!(
            VoteError::VoterNotFound("Nobody".to_string()),
            vote_error(election.cast_vote(&VoterRef::Name("Nobody".to_string()), &Id::from("1")))
        );
        assert_eq!(
            VoteError::UnknownCandidate(Id::from("9")),
            vote_error(election.cast_vote(&budi(), &Id::from("9")))
        );
        assert!(!election.voter(&Id::from("3")).unwrap().has_voted);
        assert_tally_matches_roster(&election);
    }

    #[test]
    fn voter_can_be_named_by_id() {
        let election = seeded();
        let receipt = election
            .cast_vote(&VoterRef::Name("1".to_string()), &Id::from("1"))
            .unwrap();
        assert_eq!(Id::from("1"), receipt.voter_id);
    }

    #[test]
    fn concurrent_casts_by_one_voter() {
        let election = seeded();
        let successes = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let election = &election;
                    scope.spawn(move || {
                        let candidate = Id::from(if i % 2 == 0 { "1" } else { "2" });
                        election.cast_vote(&budi(), &candidate).is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });
        assert_eq!(1, successes);
        assert_eq!(1, election.tally().iter().map(|entry| entry.votes).sum::<u64>());
        assert_tally_matches_roster(&election);
    }

    #[test]
    fn winner_of_an_untouched_slate_is_the_first_candidate() {
        let election = seeded();
        assert_eq!(Id::from("1"), election.winner().unwrap().id);
        assert!(election.tally().iter().all(|entry| entry.percentage == 0));
    }

    #[test]
    fn ties_go_to_the_earlier_candidate() {
        let election = seeded();
        election.cast_vote(&VoterRef::Id(Id::from("1")), &Id::from("2")).unwrap();
        election.cast_vote(&budi(), &Id::from("1")).unwrap();
        assert_eq!(Id::from("1"), election.winner().unwrap().id);
    }

    #[test]
    fn empty_slate_has_no_winner() {
        let election = Election::open(Box::new(MemoryStore::default()), Operators::default()).unwrap();
        assert!(matches!(election.winner(), Err(Error::NotFound(_))));
        assert!(election.tally().is_empty());
    }

    #[test]
    fn registered_candidates_get_the_next_id() {
        let election = seeded();
        let candidate = election.register_candidate(CandidateSpec::example()).unwrap();
        assert_eq!(Id::from("3"), candidate.id);
        assert_eq!(0, candidate.votes);
        assert_eq!(3, election.candidates().len());

        let blank = CandidateSpec {
            name: "  ".to_string(),
            ..CandidateSpec::example()
        };
        assert!(matches!(
            election.register_candidate(blank),
            Err(Error::Validation(ValidationError::EmptyField("name")))
        ));
        assert_eq!(3, election.candidates().len());
    }
}
