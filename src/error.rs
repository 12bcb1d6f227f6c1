use log::{debug, error};
use rocket::{http::Status, response::Responder, serde::json::Json, Request};
use serde::Serialize;
use thiserror::Error;

use crate::model::{
    ballot::VoteError, election::ControlError, gate::Capability, identity::LoginError,
    roster::RosterError, store::StoreError, token::MalformedToken,
};

pub type Result<T> = std::result::Result<T, Error>;

/// A required field was missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("`{0}` is not a date in YYYY-MM-DD form")]
    InvalidDate(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Token(#[from] MalformedToken),
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not logged in")]
    Unauthenticated,
    #[error("Action `{0}` is not permitted for this account")]
    Forbidden(Capability),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Server misconfigured: {0} is not available")]
    Misconfigured(&'static str),
}

/// Broad classes of failure, used to pick a response status and to let
/// callers decide whether to re-prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Missing or empty input; the caller should re-prompt.
    Validation,
    /// Duplicate username, NISN or unique ID.
    Conflict,
    /// Unknown voter, candidate or token.
    NotFound,
    /// The request is well-formed but the election or voter state forbids it.
    State,
    /// The token payload could not be parsed.
    MalformedToken,
    Unauthorized,
    Forbidden,
    Internal,
}

impl Error {
    pub fn not_found<T: ToString>(what: T) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Roster(err) => match err {
                RosterError::DuplicateUsername(_)
                | RosterError::DuplicateNisn(_)
                | RosterError::DuplicateUniqueId => ErrorKind::Conflict,
                RosterError::VoterNotFound(_) => ErrorKind::NotFound,
                RosterError::AlreadyVoted(_) => ErrorKind::State,
            },
            Self::Token(_) => ErrorKind::MalformedToken,
            Self::Login(err) => match err {
                LoginError::InvalidCredentials => ErrorKind::Unauthorized,
                LoginError::Token(_) => ErrorKind::MalformedToken,
                LoginError::VoterNotFound(_) => ErrorKind::NotFound,
                LoginError::NotVerified(_) | LoginError::AlreadyVoted(_) => ErrorKind::State,
            },
            Self::Vote(err) => match err {
                VoteError::VoterNotFound(_) | VoteError::UnknownCandidate(_) => {
                    ErrorKind::NotFound
                }
                VoteError::ElectionClosed
                | VoteError::NotVerified(_)
                | VoteError::AlreadyVoted(_) => ErrorKind::State,
            },
            Self::Control(_) => ErrorKind::State,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthenticated => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Store(_) | Self::Misconfigured(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::MalformedToken => Status::BadRequest,
            ErrorKind::Conflict | ErrorKind::State => Status::Conflict,
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::Unauthorized => Status::Unauthorized,
            ErrorKind::Forbidden => Status::Forbidden,
            ErrorKind::Internal => Status::InternalServerError,
        }
    }
}

/// JSON body sent alongside every error status.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorKind,
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        match self.kind() {
            ErrorKind::Internal => error!("{self}"),
            _ => debug!("{self}"),
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).respond_to(req)
    }
}
