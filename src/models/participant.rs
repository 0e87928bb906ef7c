//! Participant data structure (an individual player or a team entry).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used in slots, standings and lookups).
pub type ParticipantId = Uuid;

/// A participant in the tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Explicit seed for manual seeding (1 = top seed).
    #[serde(default)]
    pub seed_number: Option<u32>,
    /// Rank/skill points for skill-based seeding (higher is stronger).
    #[serde(default)]
    pub skill: Option<u32>,
    /// Whether the participant currently occupies a bracket slot.
    #[serde(default)]
    pub is_placed: bool,
    #[serde(default)]
    pub is_team: bool,
}

impl Participant {
    /// Create a new individual participant with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            seed_number: None,
            skill: None,
            is_placed: false,
            is_team: false,
        }
    }

    /// Create a new team entry with the given name.
    pub fn team(name: impl Into<String>) -> Self {
        Self {
            is_team: true,
            ..Self::new(name)
        }
    }

    pub fn with_seed(mut self, seed_number: u32) -> Self {
        self.seed_number = Some(seed_number);
        self
    }

    pub fn with_skill(mut self, skill: u32) -> Self {
        self.skill = Some(skill);
        self
    }
}
