use rocket::{serde::json::Json, Route};

use crate::{
    error::Result,
    model::session::{SessionStatus, WebSession},
};

pub fn routes() -> Vec<Route> {
    routes![status, toggle, open, close, reset]
}

#[get("/election")]
pub fn status(session: WebSession<'_>) -> Result<Json<SessionStatus>> {
    Ok(Json(session.status()?))
}

#[post("/election/toggle")]
pub fn toggle(session: WebSession<'_>) -> Result<Json<SessionStatus>> {
    session.toggle_election()?;
    Ok(Json(session.status()?))
}

#[post("/election/open")]
pub fn open(session: WebSession<'_>) -> Result<Json<SessionStatus>> {
    session.open_election()?;
    Ok(Json(session.status()?))
}

#[post("/election/close")]
pub fn close(session: WebSession<'_>) -> Result<Json<SessionStatus>> {
    session.close_election()?;
    Ok(Json(session.status()?))
}

#[post("/election/reset")]
pub fn reset(session: WebSession<'_>) -> Result<Json<SessionStatus>> {
    session.reset_tally()?;
    Ok(Json(session.status()?))
}
