//! A single client's view of the election.
//!
//! The election itself is shared by everyone. Each client additionally keeps
//! a few keys of its own (who is logged in, and whether this client has cast a
//! vote) in a per-client store, which over HTTP is a set of signed cookies.

use log::{info, warn};
use rocket::{
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

use super::{
    ballot::{CastReceipt, TallyEntry, VoterRef},
    candidate::{Candidate, CandidateSpec},
    election::{Election, Recap},
    gate::{permitted_actions, Capability},
    id::Id,
    identity::Identity,
    store::{CookieStore, KeyValueStore, Persisted},
    voter::{VoterDescription, VoterSpec},
};

/// Whether this client has cast a vote in the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct HasVotedLocal(bool);

impl Persisted for HasVotedLocal {
    const KEY: &'static str = "hasVotedLocal";
}

/// The voter whose vote this client cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
struct CurrentVoterId(Id);

impl Persisted for CurrentVoterId {
    const KEY: &'static str = "currentVoterId";
}

/// Public election status, as seen by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub active: bool,
    pub has_voted_local: bool,
    pub current_voter_id: Option<Id>,
}

/// Who is logged in and what they may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    pub identity: Identity,
    pub permitted: Vec<Capability>,
}

pub struct Session<'a, S> {
    election: &'a Election,
    local: S,
    identity: Option<Identity>,
}

/// The session of an HTTP client, kept in cookies.
pub type WebSession<'r> = Session<'r, CookieStore<'r>>;

impl<'a, S> Session<'a, S>
where
    S: KeyValueStore,
{
    /// Pick up whoever was logged in on this client.
    pub fn restore(election: &'a Election, local: S) -> Result<Self> {
        let identity = Identity::load_from(&local)?;
        Ok(Self {
            election,
            local,
            identity,
        })
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn whoami(&self) -> Result<WhoAmI> {
        let identity = self.identity.as_ref().ok_or(Error::Unauthenticated)?;
        Ok(WhoAmI {
            identity: identity.clone(),
            permitted: permitted_actions(identity).into_iter().collect(),
        })
    }

    /// The caller's identity, if it carries `capability`.
    pub fn require(&self, capability: Capability) -> Result<&Identity> {
        self.require_any(capability, &[])
    }

    /// The caller's identity, if it carries `capability` or one of `alternatives`.
    /// Refusals are reported against `capability`.
    pub fn require_any(
        &self,
        capability: Capability,
        alternatives: &[Capability],
    ) -> Result<&Identity> {
        let identity = self.identity.as_ref().ok_or(Error::Unauthenticated)?;
        if identity.permits(capability) || alternatives.iter().any(|c| identity.permits(*c)) {
            Ok(identity)
        } else {
            warn!("{} ({}) may not {capability}", identity.name(), identity.role());
            Err(Error::Forbidden(capability))
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<Identity> {
        let identity = self.election.login_with_password(username, password)?;
        self.establish(identity)
    }

    pub fn login_by_token(&mut self, raw: &str) -> Result<Identity> {
        let identity = self.election.login_with_token(raw)?;
        self.establish(identity)
    }

    fn establish(&mut self, identity: Identity) -> Result<Identity> {
        identity.save_to(&self.local)?;
        self.identity = Some(identity.clone());
        Ok(identity)
    }

    /// Forget everything this client holds.
    pub fn logout(&mut self) -> Result<()> {
        Identity::remove_from(&self.local)?;
        HasVotedLocal::remove_from(&self.local)?;
        CurrentVoterId::remove_from(&self.local)?;
        if let Some(identity) = self.identity.take() {
            info!("{} logged out", identity.name());
        }
        Ok(())
    }

    pub fn status(&self) -> Result<SessionStatus> {
        let HasVotedLocal(has_voted_local) =
            HasVotedLocal::load_from(&self.local)?.unwrap_or(HasVotedLocal(false));
        let current_voter_id = CurrentVoterId::load_from(&self.local)?.map(|CurrentVoterId(id)| id);
        Ok(SessionStatus {
            active: self.election.is_active(),
            has_voted_local,
            current_voter_id,
        })
    }

    pub fn list_candidates(&self) -> Vec<Candidate> {
        self.election.candidates()
    }

    /// Cast the logged-in voter's own vote.
    pub fn cast_vote(&self, candidate: &Id) -> Result<CastReceipt> {
        let identity = self.require(Capability::CastVote)?;
        let voter_id = identity
            .voter_id()
            .cloned()
            .ok_or(Error::Forbidden(Capability::CastVote))?;
        let receipt = self.election.cast_vote(&VoterRef::Id(voter_id), candidate)?;
        self.remember_vote(&receipt)?;
        Ok(receipt)
    }

    /// Cast on behalf of another voter, from an operator's console.
    pub fn cast_vote_for(&self, voter: &VoterRef, candidate: &Id) -> Result<CastReceipt> {
        self.require(Capability::CastAsDemo)?;
        let receipt = self.election.cast_vote(voter, candidate)?;
        self.remember_vote(&receipt)?;
        Ok(receipt)
    }

    fn remember_vote(&self, receipt: &CastReceipt) -> Result<()> {
        HasVotedLocal(true).save_to(&self.local)?;
        CurrentVoterId(receipt.voter_id.clone()).save_to(&self.local)?;
        Ok(())
    }

    pub fn register_candidate(&self, spec: CandidateSpec) -> Result<Candidate> {
        self.require_any(Capability::RegisterCandidate, &[Capability::ManageCandidates])?;
        self.election.register_candidate(spec)
    }

    pub fn list_voters(&self) -> Result<Vec<VoterDescription>> {
        self.require(Capability::ManageVoters)?;
        Ok(self
            .election
            .voters()
            .into_iter()
            .map(VoterDescription::from)
            .collect())
    }

    pub fn register_voter(&self, spec: VoterSpec) -> Result<VoterDescription> {
        self.require(Capability::ManageVoters)?;
        self.election.register_voter(spec).map(VoterDescription::from)
    }

    pub fn verify_voter(&self, id: &Id) -> Result<VoterDescription> {
        self.require(Capability::VerifyVoter)?;
        self.election.verify_voter(id).map(VoterDescription::from)
    }

    pub fn voter_token(&self, id: &Id) -> Result<String> {
        self.require(Capability::ManageVoters)?;
        self.election.voter_token(id)
    }

    pub fn tally(&self) -> Result<Vec<TallyEntry>> {
        self.require(Capability::ViewResults)?;
        Ok(self.election.tally())
    }

    pub fn winner(&self) -> Result<Candidate> {
        self.require(Capability::ViewResults)?;
        self.election.winner()
    }

    pub fn recap(&self) -> Result<Recap> {
        self.require(Capability::ViewRecap)?;
        Ok(self.election.recap())
    }

    /// Returns whether the election is now open.
    pub fn toggle_election(&self) -> Result<bool> {
        self.require(Capability::ToggleElection)?;
        self.election.toggle()
    }

    pub fn open_election(&self) -> Result<()> {
        self.require(Capability::ToggleElection)?;
        self.election.open_voting()
    }

    pub fn close_election(&self) -> Result<()> {
        self.require(Capability::ToggleElection)?;
        self.election.close_voting()
    }

    /// Start a new round. This client's own voted flag is cleared as well.
    pub fn reset_tally(&self) -> Result<()> {
        self.require(Capability::ResetElection)?;
        self.election.reset_tally()?;
        HasVotedLocal::remove_from(&self.local)?;
        CurrentVoterId::remove_from(&self.local)?;
        Ok(())
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session<'r, CookieStore<'r>> {
    type Error = Error;

    /// Restore the caller's session from their cookies. Never forwards: an
    /// anonymous caller gets a session with no identity.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let election = match req.rocket().state::<Election>() {
            Some(election) => election,
            None => return failure(Error::Misconfigured("election")),
        };
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return failure(Error::Misconfigured("config")),
        };

        match Session::restore(election, CookieStore::new(req.cookies(), config)) {
            Ok(session) => Outcome::Success(session),
            Err(e) => failure(e),
        }
    }
}

fn failure<S>(error: Error) -> Outcome<S, Error> {
    Outcome::Failure((error.status(), error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        identity::{Operators, Role},
        seed::BUDI_TOKEN,
        store::MemoryStore,
    };

    fn seeded() -> Election {
        let election =
            Election::open(Box::new(MemoryStore::default()), Operators::default()).unwrap();
        election.seed_demo().unwrap();
        election
    }

    fn forbidden<T: std::fmt::Debug>(result: Result<T>) -> Capability {
        match result {
            Err(Error::Forbidden(capability)) => capability,
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_session_only_sees_candidates() {
        let election = seeded();
        let session = Session::restore(&election, MemoryStore::default()).unwrap();
        assert_eq!(None, session.identity());
        assert_eq!(2, session.list_candidates().len());
        assert!(matches!(session.tally(), Err(Error::Unauthenticated)));
        assert!(matches!(session.whoami(), Err(Error::Unauthenticated)));
        assert!(session.status().unwrap().active);
    }

    #[test]
    fn login_persists_across_restores() {
        let election = seeded();
        let local = MemoryStore::default();
        let mut session = Session::restore(&election, local.clone()).unwrap();
        let identity = session.login("verifikator", "verif123").unwrap();
        assert_eq!(Role::Verifikator, identity.role());

        let session = Session::restore(&election, local.clone()).unwrap();
        assert_eq!(Some(&identity), session.identity());
        assert!(session
            .whoami()
            .unwrap()
            .permitted
            .contains(&Capability::VerifyVoter));

        let mut session = session;
        session.logout().unwrap();
        assert!(local.is_empty());
        assert_eq!(None, Session::restore(&election, local).unwrap().identity());
    }

    #[test]
    fn failed_login_keeps_the_session_anonymous() {
        let election = seeded();
        let local = MemoryStore::default();
        let mut session = Session::restore(&election, local.clone()).unwrap();
        assert!(session.login("admin", "wrong").is_err());
        assert!(session.login_by_token("NISN: 1234567892").is_err());
        assert_eq!(None, session.identity());
        assert!(local.is_empty());
    }

    #[test]
    fn token_login_then_vote() {
        let election = seeded();
        let local = MemoryStore::default();
        let mut session = Session::restore(&election, local).unwrap();
        let identity = session.login_by_token(BUDI_TOKEN).unwrap();
        assert_eq!(Some(&Id::from("3")), identity.voter_id());

        session.cast_vote(&Id::from("2")).unwrap();
        let status = session.status().unwrap();
        assert!(status.has_voted_local);
        assert_eq!(Some(Id::from("3")), status.current_voter_id);
        assert_eq!(1, session.tally().unwrap()[1].votes);

        // The token cannot be used again once its voter has voted.
        let mut again = Session::restore(&election, MemoryStore::default()).unwrap();
        assert!(matches!(
            again.login_by_token(BUDI_TOKEN),
            Err(Error::Login(crate::model::identity::LoginError::AlreadyVoted(_)))
        ));
    }

    #[test]
    fn roles_are_enforced() {
        let election = seeded();
        let mut admin = Session::restore(&election, MemoryStore::default()).unwrap();
        admin.login("admin", "admin123").unwrap();
        assert_eq!(Capability::ManageVoters, forbidden(admin.list_voters()));
        assert_eq!(Capability::VerifyVoter, forbidden(admin.verify_voter(&Id::from("2"))));
        assert_eq!(Capability::ViewRecap, forbidden(admin.recap()));
        assert_eq!(Capability::CastVote, forbidden(admin.cast_vote(&Id::from("1"))));

        let mut verifikator = Session::restore(&election, MemoryStore::default()).unwrap();
        verifikator.login("verifikator", "verif123").unwrap();
        assert_eq!(Capability::ToggleElection, forbidden(verifikator.toggle_election()));
        assert_eq!(Capability::ResetElection, forbidden(verifikator.reset_tally()));
        assert_eq!(
            Capability::CastAsDemo,
            forbidden(verifikator.cast_vote_for(&VoterRef::Id(Id::from("3")), &Id::from("1")))
        );

        let mut voter = Session::restore(&election, MemoryStore::default()).unwrap();
        voter.login("andi_pratama", "andi123").unwrap();
        assert_eq!(
            Capability::RegisterCandidate,
            forbidden(voter.register_candidate(CandidateSpec::example()))
        );
        assert!(voter.tally().is_ok());
    }

    #[test]
    fn both_operator_roles_register_candidates() {
        let election = seeded();
        for (username, password) in [("admin", "admin123"), ("verifikator", "verif123")] {
            let mut session = Session::restore(&election, MemoryStore::default()).unwrap();
            session.login(username, password).unwrap();
            session.register_candidate(CandidateSpec::example()).unwrap();
        }
        assert_eq!(4, election.candidates().len());
    }

    #[test]
    fn verifikator_onboards_a_voter() {
        let election = seeded();
        let mut session = Session::restore(&election, MemoryStore::default()).unwrap();
        session.login("verifikator", "verif123").unwrap();

        let voter = session.register_voter(VoterSpec::example()).unwrap();
        assert_eq!(Id::from("4"), voter.id);
        assert!(!voter.is_verified);
        assert!(session.verify_voter(&voter.id).unwrap().is_verified);
        assert_eq!(4, session.list_voters().unwrap().len());

        let token = session.voter_token(&voter.id).unwrap();
        let mut voter_session = Session::restore(&election, MemoryStore::default()).unwrap();
        let identity = voter_session.login_by_token(&token).unwrap();
        assert_eq!(Some(&voter.id), identity.voter_id());
    }

    #[test]
    fn admin_demo_cast_and_reset() {
        let election = seeded();
        let local = MemoryStore::default();
        let mut session = Session::restore(&election, local).unwrap();
        session.login("admin", "admin123").unwrap();

        session
            .cast_vote_for(&VoterRef::Name("Andi Pratama".to_string()), &Id::from("1"))
            .unwrap();
        assert!(session.status().unwrap().has_voted_local);
        assert_eq!(Id::from("1"), session.winner().unwrap().id);

        assert!(session.reset_tally().is_err());
        assert!(!session.toggle_election().unwrap());
        session.reset_tally().unwrap();
        let status = session.status().unwrap();
        assert!(!status.active);
        assert!(!status.has_voted_local);
        assert_eq!(None, status.current_voter_id);
        assert_eq!(0, session.tally().unwrap()[0].votes);
    }
}
