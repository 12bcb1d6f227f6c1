use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::{ballot::TallyEntry, candidate::Candidate, election::Recap, session::WebSession},
};

pub fn routes() -> Vec<Route> {
    routes![tally, winner, recap]
}

#[get("/results")]
pub fn tally(session: WebSession<'_>) -> Result<Json<Vec<TallyEntry>>> {
    Ok(Json(session.tally()?))
}

#[get("/results/winner")]
pub fn winner(session: WebSession<'_>) -> Result<Json<Candidate>> {
    Ok(Json(session.winner()?))
}

#[get("/results/recap")]
pub fn recap(session: WebSession<'_>) -> Result<Json<Recap>> {
    Ok(Json(session.recap()?))
}
