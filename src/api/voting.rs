use rocket::{serde::json::Json, Route};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{
        ballot::{CastReceipt, VoterRef},
        candidate::{Candidate, CandidateSpec},
        id::Id,
        session::WebSession,
    },
};

pub fn routes() -> Vec<Route> {
    routes![candidates, register_candidate, vote, vote_as]
}

/// The logged-in voter's choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    pub candidate: Id,
}

/// A choice made on someone else's behalf. `voter` is a full name or a
/// voter ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoBallot {
    pub voter: String,
    pub candidate: Id,
}

#[get("/candidates")]
pub fn candidates(session: WebSession<'_>) -> Json<Vec<Candidate>> {
    Json(session.list_candidates())
}

#[post("/candidates", data = "<spec>", format = "json")]
pub fn register_candidate(
    session: WebSession<'_>,
    spec: Json<CandidateSpec>,
) -> Result<Json<Candidate>> {
    Ok(Json(session.register_candidate(spec.into_inner())?))
}

#[post("/vote", data = "<ballot>", format = "json")]
pub fn vote(session: WebSession<'_>, ballot: Json<Ballot>) -> Result<Json<CastReceipt>> {
    Ok(Json(session.cast_vote(&ballot.candidate)?))
}

#[post("/vote/demo", data = "<ballot>", format = "json")]
pub fn vote_as(session: WebSession<'_>, ballot: Json<DemoBallot>) -> Result<Json<CastReceipt>> {
    let DemoBallot { voter, candidate } = ballot.into_inner();
    Ok(Json(session.cast_vote_for(&VoterRef::Name(voter), &candidate)?))
}
