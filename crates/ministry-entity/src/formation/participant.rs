//! Participants and rotation pair members.

use serde::{Deserialize, Serialize};

/// A team member who can occupy a seat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Stable member identity (matches director identities).
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Participant {
    /// Create a participant.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One side of a mutually exclusive pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairMember {
    /// First member; the cold-start choice.
    #[default]
    First,
    /// Second member.
    Second,
}

impl PairMember {
    /// The other member of the pair.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}
