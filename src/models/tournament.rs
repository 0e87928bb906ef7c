//! Tournament, TournamentState, Format and the error type.

use crate::config::BracketConfig;
use crate::logic::BracketEngine;
use crate::models::game::MatchId;
use crate::models::participant::{Participant, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during bracket operations.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum BracketError {
    /// Fewer participants than the format needs; bracket not generated.
    #[error("Need at least {required} participants (have {actual})")]
    InsufficientParticipants { required: usize, actual: usize },
    /// Tournament or bracket is not in a state that allows this action.
    #[error("Invalid state for this action")]
    InvalidState,
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Participant not found")]
    ParticipantNotFound(ParticipantId),
    /// Participant names are unique (case-insensitive).
    #[error("A participant with this name already exists")]
    DuplicateParticipantName,
    #[error("Participant name must not be empty")]
    EmptyName,
    /// The match already has a result; it must be cleared (or edited) explicitly.
    #[error("This match already has a recorded result")]
    ResultAlreadyRecorded(MatchId),
    #[error("This match has no recorded result")]
    NoResultRecorded(MatchId),
    /// Both slots must be filled before a result can be recorded.
    #[error("Both participants must be known before recording a result")]
    MatchNotReady(MatchId),
    #[error("A draw is not allowed for this match")]
    DrawNotAllowed(MatchId),
    /// Byes are decided by the engine and cannot be changed by hand.
    #[error("Walkover results cannot be changed")]
    WalkoverLocked(MatchId),
    /// Not all matches have a result.
    #[error("Not all matches have a result")]
    IncompleteResults,
    /// Rankings cannot be declared while a position is tied.
    #[error("Position {position} is tied; play a tiebreaker first")]
    UnresolvedTie { position: usize },
    #[error("Tiebreaker matches for position {position} are still being played")]
    TiebreakerPending { position: usize },
    #[error("All planned rounds have been played")]
    AllRoundsPlayed,
    /// Save API rejected the bracket; in-memory state is kept for a retry.
    #[error("Saving the bracket failed: {0}")]
    PersistenceFailure(String),
    /// A persisted bracket record does not fit the bracket structure.
    #[error("Invalid bracket record: {0}")]
    InvalidRecord(String),
    #[error("Invalid roster: {0}")]
    Roster(String),
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Bracket format of a tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Format {
    #[default]
    SingleElimination,
    DoubleElimination,
    RoundRobin,
    Swiss,
}

/// How participants are ordered into the first round.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedingStrategy {
    #[default]
    Random,
    SkillBased,
    Manual,
    /// Arrival (registration) order.
    Registration,
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Adding participants, editing options; no bracket yet.
    #[default]
    Setup,
    /// Bracket generated; results are being recorded.
    InProgress,
    /// Winners declared.
    Completed,
}

/// Full tournament state: roster, options, bracket and phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: Format,
    pub config: BracketConfig,
    pub participants: Vec<Participant>,
    /// None until the bracket is generated (or loaded).
    pub bracket: Option<BracketEngine>,
    pub state: TournamentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new tournament in Setup state with no participants.
    pub fn new(name: impl Into<String>, format: Format, config: BracketConfig) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            config,
            participants: Vec::new(),
            bracket: None,
            state: TournamentState::Setup,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record activity (used for idle cleanup by the web host).
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Add a participant by name (Setup only). Names must be unique (case-insensitive).
    pub fn add_participant(&mut self, name: impl Into<String>) -> Result<ParticipantId, BracketError> {
        self.register(Participant::new(name))
    }

    /// Add a fully described participant (Setup only). The name is trimmed.
    pub fn register(&mut self, mut participant: Participant) -> Result<ParticipantId, BracketError> {
        if self.state != TournamentState::Setup {
            return Err(BracketError::InvalidState);
        }
        let trimmed = participant.name.trim().to_string();
        if trimmed.is_empty() {
            return Err(BracketError::EmptyName);
        }
        let is_duplicate = self
            .participants
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&trimmed));
        if is_duplicate {
            return Err(BracketError::DuplicateParticipantName);
        }
        participant.name = trimmed;
        participant.is_placed = false;
        let id = participant.id;
        self.participants.push(participant);
        Ok(id)
    }

    /// Remove a participant by id (only valid in Setup).
    pub fn remove_participant(&mut self, participant_id: ParticipantId) -> Result<(), BracketError> {
        if self.state != TournamentState::Setup {
            return Err(BracketError::InvalidState);
        }
        let idx = self
            .participants
            .iter()
            .position(|p| p.id == participant_id)
            .ok_or(BracketError::ParticipantNotFound(participant_id))?;
        self.participants.remove(idx);
        Ok(())
    }

    /// Replace bracket options (only valid in Setup).
    pub fn set_config(&mut self, config: BracketConfig) -> Result<(), BracketError> {
        if self.state != TournamentState::Setup {
            return Err(BracketError::InvalidState);
        }
        self.config = config;
        Ok(())
    }

    /// Change the format (only valid in Setup).
    pub fn set_format(&mut self, format: Format) -> Result<(), BracketError> {
        if self.state != TournamentState::Setup {
            return Err(BracketError::InvalidState);
        }
        self.format = format;
        Ok(())
    }

    /// Restart: back to Setup with the same roster. Drops the bracket and all results.
    pub fn restart_tournament(&mut self) -> Result<(), BracketError> {
        if self.state == TournamentState::Setup {
            return Err(BracketError::InvalidState);
        }
        self.bracket = None;
        self.state = TournamentState::Setup;
        for p in &mut self.participants {
            p.is_placed = false;
        }
        self.touch();
        Ok(())
    }
}
