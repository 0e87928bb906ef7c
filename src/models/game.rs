//! Match, MatchResult and Round.

use crate::models::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Recorded outcome of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Player1,
    Player2,
    Draw,
}

impl MatchResult {
    /// Result in which the participant in `slot` (0 or 1) wins.
    pub fn for_slot(slot: usize) -> Self {
        if slot == 0 {
            MatchResult::Player1
        } else {
            MatchResult::Player2
        }
    }

    /// Slot index of the winner, `None` for a draw.
    pub fn winning_slot(self) -> Option<usize> {
        match self {
            MatchResult::Player1 => Some(0),
            MatchResult::Player2 => Some(1),
            MatchResult::Draw => None,
        }
    }

    /// Score string used by the persistence API.
    pub fn score(self) -> &'static str {
        match self {
            MatchResult::Player1 => "1-0",
            MatchResult::Player2 => "0-1",
            MatchResult::Draw => "Draw",
        }
    }
}

/// A single match between two slots. Slots hold participant ids, never participant values.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Round index (0-based for elimination and round robin, 1-based for swiss).
    pub round: u32,
    /// Position within the round (0-based).
    pub position: u32,
    pub slots: [Option<ParticipantId>; 2],
    /// None if not yet played.
    pub result: Option<MatchResult>,
    /// Decided automatically because the opponent slot can never be filled.
    #[serde(default)]
    pub walkover: bool,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub is_tiebreaker: bool,
}

impl Match {
    /// Empty match at the given round and position.
    pub fn new(round: u32, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            round,
            position,
            slots: [None, None],
            result: None,
            walkover: false,
            group_id: None,
            group_name: None,
            is_tiebreaker: false,
        }
    }

    /// Match with both slots already filled.
    pub fn between(round: u32, position: u32, first: ParticipantId, second: ParticipantId) -> Self {
        Self {
            slots: [Some(first), Some(second)],
            ..Self::new(round, position)
        }
    }

    pub fn is_decided(&self) -> bool {
        self.result.is_some()
    }

    /// Both slots hold a participant.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// A match that was actually contested (both slots filled, not a walkover).
    pub fn is_contested(&self) -> bool {
        self.is_full() && !self.walkover
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.slots.contains(&Some(id))
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        let slot = self.result?.winning_slot()?;
        self.slots[slot]
    }

    pub fn loser(&self) -> Option<ParticipantId> {
        let slot = self.result?.winning_slot()?;
        self.slots[1 - slot]
    }

    /// Result in which `id` wins, if `id` plays in this match.
    pub fn result_for_winner(&self, id: ParticipantId) -> Option<MatchResult> {
        self.slots
            .iter()
            .position(|s| *s == Some(id))
            .map(MatchResult::for_slot)
    }
}

/// An ordered round of matches.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub name: String,
    pub matches: Vec<Match>,
}
