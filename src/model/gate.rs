//! Which actions each role may take.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::identity::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Cast on behalf of a named voter.
    CastAsDemo,
    RegisterCandidate,
    ViewResults,
    ToggleElection,
    ResetElection,
    ManageVoters,
    VerifyVoter,
    ManageCandidates,
    ViewRecap,
    /// Cast the caller's own vote.
    CastVote,
}

impl Display for Capability {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::CastAsDemo => "cast-as-demo",
                Self::RegisterCandidate => "register-candidate",
                Self::ViewResults => "view-results",
                Self::ToggleElection => "toggle-election",
                Self::ResetElection => "reset-election",
                Self::ManageVoters => "manage-voters",
                Self::VerifyVoter => "verify-voter",
                Self::ManageCandidates => "manage-candidates",
                Self::ViewRecap => "view-recap",
                Self::CastVote => "cast-vote",
            }
        )
    }
}

const ADMIN: &[Capability] = &[
    Capability::CastAsDemo,
    Capability::RegisterCandidate,
    Capability::ViewResults,
    Capability::ToggleElection,
    Capability::ResetElection,
];

const VERIFIKATOR: &[Capability] = &[
    Capability::ViewResults,
    Capability::ManageVoters,
    Capability::VerifyVoter,
    Capability::ManageCandidates,
    Capability::ViewRecap,
];

const PEMILIH: &[Capability] = &[Capability::CastVote, Capability::ViewResults];

fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => ADMIN,
        Role::Verifikator => VERIFIKATOR,
        Role::Pemilih => PEMILIH,
    }
}

/// Everything `identity` may do. Depends on nothing but its role.
pub fn permitted_actions(identity: &Identity) -> BTreeSet<Capability> {
    capabilities(identity.role()).iter().copied().collect()
}

impl Identity {
    pub fn permits(&self, capability: Capability) -> bool {
        capabilities(self.role()).contains(&capability)
    }
}
