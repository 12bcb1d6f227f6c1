use std::fmt::Display;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    election::Election,
    id::Id,
    store::Persisted,
    token::{self, MalformedToken},
};

/// Privilege levels. Every identity has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Verifikator,
    /// A voter.
    Pemilih,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Admin => "admin",
                Self::Verifikator => "verifikator",
                Self::Pemilih => "pemilih",
            }
        )
    }
}

/// Roles an operator account may hold. Voters are never operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorRole {
    Admin,
    Verifikator,
}

impl Display for OperatorRole {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Role::from(*self).fmt(formatter)
    }
}

impl From<OperatorRole> for Role {
    fn from(role: OperatorRole) -> Self {
        match role {
            OperatorRole::Admin => Role::Admin,
            OperatorRole::Verifikator => Role::Verifikator,
        }
    }
}

/// An authenticated caller. Persisted under `currentUser` for session restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Identity {
    #[serde(rename_all = "camelCase")]
    Operator { role: OperatorRole, name: String },
    #[serde(rename_all = "camelCase")]
    Voter { voter_id: Id, name: String },
}

impl Persisted for Identity {
    const KEY: &'static str = "currentUser";
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Self::Operator { role, .. } => (*role).into(),
            Self::Voter { .. } => Role::Pemilih,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Operator { name, .. } | Self::Voter { name, .. } => name,
        }
    }

    /// The voter this identity is bound to, if it is a voter.
    pub fn voter_id(&self) -> Option<&Id> {
        match self {
            Self::Operator { .. } => None,
            Self::Voter { voter_id, .. } => Some(voter_id),
        }
    }
}

/// A fixed, non-voter account. Operator accounts come from configuration and
/// are never modified at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAccount {
    pub username: String,
    pub password: String,
    pub role: OperatorRole,
    pub name: String,
}

impl OperatorAccount {
    pub fn identity(&self) -> Identity {
        Identity::Operator {
            role: self.role,
            name: self.name.clone(),
        }
    }
}

/// The configured operator accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operators(Vec<OperatorAccount>);

impl Operators {
    pub fn new(accounts: Vec<OperatorAccount>) -> Self {
        Self(accounts)
    }

    /// Exact match on username and password.
    pub fn find(&self, username: &str, password: &str) -> Option<&OperatorAccount> {
        self.0
            .iter()
            .find(|account| account.username == username && account.password == password)
    }
}

impl Default for Operators {
    /// The stock `admin` and `verifikator` accounts.
    fn default() -> Self {
        Self(vec![
            OperatorAccount {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                role: OperatorRole::Admin,
                name: "Administrator".to_string(),
            },
            OperatorAccount {
                username: "verifikator".to_string(),
                password: "verif123".to_string(),
                role: OperatorRole::Verifikator,
                name: "Verifikator Pemilu".to_string(),
            },
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] MalformedToken),
    #[error("No voter holds unique ID {0}")]
    VoterNotFound(String),
    #[error("{0} has not been verified yet")]
    NotVerified(String),
    #[error("{0} has already voted")]
    AlreadyVoted(String),
}

impl Election {
    /// Operators are checked first, then the roster. Voters are not checked
    /// for verification here; that happens when they cast.
    pub fn login_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, LoginError> {
        if let Some(account) = self.operators().find(username, password) {
            info!("Operator {username} logged in as {}", account.role);
            return Ok(account.identity());
        }

        let identity = self.read(|state| {
            state
                .roster
                .find_by_username(username)
                .filter(|voter| voter.password == password)
                .map(|voter| Identity::Voter {
                    voter_id: voter.id.clone(),
                    name: voter.full_name.clone(),
                })
        });

        match identity {
            Some(identity) => {
                info!("Voter {username} logged in with password");
                Ok(identity)
            }
            None => {
                warn!("Failed password login for {username}");
                Err(LoginError::InvalidCredentials)
            }
        }
    }

    /// Only the token's unique ID is trusted. The voter must be verified and
    /// must not have voted. Tokens are not single-use: replaying one is
    /// treated exactly like presenting it for the first time.
    pub fn login_with_token(&self, raw: &str) -> Result<Identity, LoginError> {
        let claim = token::decode(raw).map_err(|e| {
            warn!("Rejected token: {e}");
            e
        })?;

        let result = self.read(|state| {
            let voter = state
                .roster
                .find_by_unique_id(&claim.unique_id)
                .ok_or_else(|| LoginError::VoterNotFound(claim.unique_id.to_string()))?;
            if !voter.is_verified {
                return Err(LoginError::NotVerified(voter.full_name.clone()));
            }
            if voter.has_voted {
                return Err(LoginError::AlreadyVoted(voter.full_name.clone()));
            }
            Ok(Identity::Voter {
                voter_id: voter.id.clone(),
                name: voter.full_name.clone(),
            })
        });

        match &result {
            Ok(identity) => info!("Voter {} logged in by token", identity.name()),
            Err(e) => warn!("Rejected token login: {e}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;
    use crate::model::store::MemoryStore;

    #[test]
    fn identity_layout() {
        let identity = Identity::Voter {
            voter_id: Id::from("3"),
            name: "Budi Santoso".to_string(),
        };
        assert_eq!(
            serde_json::json!({ "kind": "voter", "voterId": "3", "name": "Budi Santoso" }),
            serde_json::to_value(&identity).unwrap()
        );

        let identity = Operators::default().find("admin", "admin123").unwrap().identity();
        assert_eq!(
            serde_json::json!({ "kind": "operator", "role": "admin", "name": "Administrator" }),
            serde_json::to_value(&identity).unwrap()
        );
        assert_eq!(Role::Admin, identity.role());
        assert_eq!(None, identity.voter_id());
    }

    #[test]
    fn operator_roles_display_like_roles() {
        assert_eq!("admin", OperatorRole::Admin.to_string());
        assert_eq!("verifikator", OperatorRole::Verifikator.to_string());
    }

    #[test]
    fn operator_password_login() {
        let election =
            Election::open(Box::new(MemoryStore::default()), Operators::default()).unwrap();
        let identity = election.login_with_password("admin", "admin123").unwrap();
        assert_eq!(Role::Admin, identity.role());
        assert_eq!("Administrator", identity.name());
    }

    #[test]
    fn operator_credentials_are_exact() {
        let operators = Operators::default();
        assert!(operators.find("verifikator", "verif123").is_some());
        assert!(operators.find("Verifikator", "verif123").is_none());
        assert!(operators.find("verifikator", "verif1234").is_none());
    }
}
