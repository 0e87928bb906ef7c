//! Wire records for the persistence API (flat match lists) and the save capability.

use crate::logic::tree::Section;
use crate::models::{
    BracketError, Match, MatchId, MatchResult, ParticipantId, TournamentId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One match in the flat shape the persistence API stores.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    /// Elimination section; absent for round robin and swiss.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<Section>,
    pub round: u32,
    pub position: u32,
    pub player1_id: Option<ParticipantId>,
    pub player2_id: Option<ParticipantId>,
    pub winner_id: Option<ParticipantId>,
    #[serde(default)]
    pub is_draw: bool,
    /// "1-0", "0-1" or "Draw".
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub is_tiebreaker: bool,
    #[serde(default)]
    pub is_bye: bool,
}

impl MatchRecord {
    pub fn from_match(m: &Match, bracket: Option<Section>) -> Self {
        Self {
            id: m.id,
            bracket,
            round: m.round,
            position: m.position,
            player1_id: m.slots[0],
            player2_id: m.slots[1],
            winner_id: m.winner(),
            is_draw: m.result == Some(MatchResult::Draw),
            score: m.result.map(|r| r.score().to_string()),
            group_id: m.group_id.clone(),
            group_name: m.group_name.clone(),
            is_tiebreaker: m.is_tiebreaker,
            is_bye: m.walkover,
        }
    }

    /// Result encoded by `winner_id` / `is_draw`.
    pub fn result(&self) -> Result<Option<MatchResult>, BracketError> {
        if self.is_draw {
            return Ok(Some(MatchResult::Draw));
        }
        match self.winner_id {
            None => Ok(None),
            Some(w) if Some(w) == self.player1_id => Ok(Some(MatchResult::Player1)),
            Some(w) if Some(w) == self.player2_id => Ok(Some(MatchResult::Player2)),
            Some(w) => Err(BracketError::InvalidRecord(format!(
                "winner {w} does not play in match {}",
                self.id
            ))),
        }
    }

    /// Rebuild the in-memory match (same id, slots, result and tags).
    pub fn to_match(&self) -> Result<Match, BracketError> {
        Ok(Match {
            id: self.id,
            round: self.round,
            position: self.position,
            slots: [self.player1_id, self.player2_id],
            result: self.result()?,
            walkover: self.is_bye,
            group_id: self.group_id.clone(),
            group_name: self.group_name.clone(),
            is_tiebreaker: self.is_tiebreaker,
        })
    }

    /// Participant ids referenced by this record.
    pub fn participants(&self) -> impl Iterator<Item = ParticipantId> {
        [self.player1_id, self.player2_id, self.winner_id]
            .into_iter()
            .flatten()
    }
}

/// One swiss round as persisted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissRoundRecord {
    pub round_number: u32,
    pub matches: Vec<MatchRecord>,
}

/// Final placement with prize money (minor currency units). Exactly one of user/team id is set.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<ParticipantId>,
    pub position: u8,
    pub prize_money: u64,
}

impl WinnerRecord {
    pub fn participant_id(&self) -> Option<ParticipantId> {
        self.user_id.or(self.team_id)
    }
}

/// Body of `POST /bracket` and response of `GET /bracket`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<MatchRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<Vec<SwissRoundRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_winner_id: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<WinnerRecord>>,
}

impl BracketRecord {
    /// Every match in the record, flattening swiss rounds.
    pub fn all_matches(&self) -> impl Iterator<Item = &MatchRecord> {
        self.matches
            .iter()
            .flatten()
            .chain(self.rounds.iter().flatten().flat_map(|r| r.matches.iter()))
    }
}

/// Anything that can be turned into the persistence API's flat shape.
pub trait Saveable {
    fn serialize(&self) -> BracketRecord;
}

/// Destination for saved brackets (the persistence API in production).
pub trait PersistenceSink {
    fn persist(&mut self, tournament_id: TournamentId, record: &BracketRecord) -> Result<(), String>;
}

/// Keeps the latest saved record per tournament in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub saved: HashMap<TournamentId, BracketRecord>,
}

impl PersistenceSink for MemorySink {
    fn persist(&mut self, tournament_id: TournamentId, record: &BracketRecord) -> Result<(), String> {
        self.saved.insert(tournament_id, record.clone());
        Ok(())
    }
}
