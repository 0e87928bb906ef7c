//! Standings rows and final placements.

use crate::models::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// One row of a standings table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
}

impl Standing {
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
        }
    }
}

/// Final podium of a completed bracket.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placements {
    pub winner: Option<ParticipantId>,
    pub runner_up: Option<ParticipantId>,
    pub third_place: Option<ParticipantId>,
}

impl Placements {
    /// Podium from an ordered list (first three entries).
    pub fn from_order(order: &[ParticipantId]) -> Self {
        Self {
            winner: order.first().copied(),
            runner_up: order.get(1).copied(),
            third_place: order.get(2).copied(),
        }
    }

    /// The tournament has a winner.
    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    /// `(position, participant)` pairs for the filled places, 1-based.
    pub fn podium(&self) -> Vec<(u8, ParticipantId)> {
        [self.winner, self.runner_up, self.third_place]
            .into_iter()
            .zip(1u8..)
            .filter_map(|(id, pos)| id.map(|id| (pos, id)))
            .collect()
    }
}
