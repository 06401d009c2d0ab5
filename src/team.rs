use std::fmt;

use serde::{Deserialize, Serialize};

/// Textual form of [`Team::Bye`] in external files.
pub const BYE_NAME: &str = "BYE";

/// Textual form of [`Team::NoPick`] in external files.
pub const NONE_NAME: &str = "NONE";

/// Team identifier.
///
/// Two reserved values stand in for "plays nobody this week" and "the picker
/// made no pick". Identity is by identifier only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Team {
    Bye,
    NoPick,
    Named(String),
}

impl Team {
    pub fn named(name: impl Into<String>) -> Self {
        Team::Named(name.into())
    }

    /// True for `Bye` and `NoPick`.
    pub fn is_reserved(&self) -> bool {
        !matches!(self, Team::Named(_))
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Team::Bye)
    }

    pub fn name(&self) -> &str {
        match self {
            Team::Bye => BYE_NAME,
            Team::NoPick => NONE_NAME,
            Team::Named(name) => name,
        }
    }
}

impl From<&str> for Team {
    fn from(name: &str) -> Self {
        match name.trim() {
            BYE_NAME => Team::Bye,
            NONE_NAME => Team::NoPick,
            other => Team::Named(other.to_string()),
        }
    }
}

impl From<String> for Team {
    fn from(name: String) -> Self {
        match name.trim() {
            BYE_NAME => Team::Bye,
            NONE_NAME => Team::NoPick,
            trimmed if trimmed.len() == name.len() => Team::Named(name),
            trimmed => Team::Named(trimmed.to_string()),
        }
    }
}

impl From<Team> for String {
    fn from(team: Team) -> Self {
        match team {
            Team::Named(name) => name,
            reserved => reserved.name().to_string(),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
