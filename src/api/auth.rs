use rocket::{serde::json::Json, Route};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::session::{WebSession, WhoAmI},
};

pub fn routes() -> Vec<Route> {
    routes![login, login_by_token, logout, whoami]
}

/// Username and password, for operators and voters alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[post("/auth/login", data = "<credentials>", format = "json")]
pub fn login(mut session: WebSession<'_>, credentials: Json<Credentials>) -> Result<Json<WhoAmI>> {
    session.login(&credentials.username, &credentials.password)?;
    Ok(Json(session.whoami()?))
}

/// Log in with the raw text decoded from a voter's QR token.
#[post("/auth/token", data = "<payload>", format = "text")]
pub fn login_by_token(mut session: WebSession<'_>, payload: String) -> Result<Json<WhoAmI>> {
    session.login_by_token(&payload)?;
    Ok(Json(session.whoami()?))
}

#[delete("/auth")]
pub fn logout(mut session: WebSession<'_>) -> Result<()> {
    session.logout()
}

#[get("/auth")]
pub fn whoami(session: WebSession<'_>) -> Result<Json<WhoAmI>> {
    Ok(Json(session.whoami()?))
}
