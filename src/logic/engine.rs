//! One bracket of any format behind a single set of operations.

use crate::config::BracketConfig;
use crate::logic::double_elimination::DoubleElimination;
use crate::logic::records::{BracketRecord, Saveable};
use crate::logic::round_robin::{RoundRobin, TiebreakStage};
use crate::logic::seeding::SeedingIssue;
use crate::logic::single_elimination::SingleElimination;
use crate::logic::swiss::{Swiss, SwissRound};
use crate::models::{
    BracketError, Format, Match, MatchId, MatchResult, Participant, ParticipantId, Placements,
    SeedingStrategy, Standing,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BracketEngine {
    SingleElimination(SingleElimination),
    DoubleElimination(DoubleElimination),
    RoundRobin(RoundRobin),
    Swiss(Swiss),
}

impl BracketEngine {
    /// Empty structure for `participant_count` participants.
    pub fn build(format: Format, participant_count: usize, config: &BracketConfig) -> Result<Self, BracketError> {
        Ok(match format {
            Format::SingleElimination => {
                Self::SingleElimination(SingleElimination::build(participant_count, config)?)
            }
            Format::DoubleElimination => {
                Self::DoubleElimination(DoubleElimination::build(participant_count, config)?)
            }
            Format::RoundRobin => Self::RoundRobin(RoundRobin::build(participant_count, config)?),
            Format::Swiss => Self::Swiss(Swiss::build(participant_count, config)?),
        })
    }

    pub fn format(&self) -> Format {
        match self {
            Self::SingleElimination(_) => Format::SingleElimination,
            Self::DoubleElimination(_) => Format::DoubleElimination,
            Self::RoundRobin(_) => Format::RoundRobin,
            Self::Swiss(_) => Format::Swiss,
        }
    }

    pub fn is_seeded(&self) -> bool {
        match self {
            Self::SingleElimination(b) => b.seeded,
            Self::DoubleElimination(b) => b.seeded,
            Self::RoundRobin(b) => b.seeded,
            Self::Swiss(b) => b.seeded,
        }
    }

    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        participants: &mut [Participant],
        strategy: SeedingStrategy,
        rng: &mut R,
    ) -> Result<Vec<SeedingIssue>, BracketError> {
        match self {
            Self::SingleElimination(b) => b.seed(participants, strategy, rng),
            Self::DoubleElimination(b) => b.seed(participants, strategy, rng),
            Self::RoundRobin(b) => b.seed(participants, strategy, rng),
            Self::Swiss(b) => b.seed(participants, strategy, rng),
        }
    }

    /// Every match, in bracket order.
    pub fn matches(&self) -> Vec<&Match> {
        match self {
            Self::SingleElimination(b) => b.tree.matches().map(|(_, m)| m).collect(),
            Self::DoubleElimination(b) => b.tree.matches().map(|(_, m)| m).collect(),
            Self::RoundRobin(b) => b.matches.iter().chain(b.tiebreaker_matches.iter()).collect(),
            Self::Swiss(b) => b.rounds.iter().flat_map(|r| r.matches.iter()).collect(),
        }
    }

    pub fn find_match(&self, match_id: MatchId) -> Option<&Match> {
        self.matches().into_iter().find(|m| m.id == match_id)
    }

    pub fn record_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        match self {
            Self::SingleElimination(b) => b.record_result(match_id, result),
            Self::DoubleElimination(b) => b.record_result(match_id, result),
            Self::RoundRobin(b) => b.record_result(match_id, result),
            Self::Swiss(b) => b.record_result(match_id, result),
        }
    }

    /// Replace a recorded result. In elimination brackets everything downstream of the match
    /// is unwound first, then the new winner advances.
    pub fn edit_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        match self {
            Self::SingleElimination(_) | Self::DoubleElimination(_) => {
                let current = self
                    .find_match(match_id)
                    .ok_or(BracketError::MatchNotFound(match_id))?;
                if current.walkover {
                    return Err(BracketError::WalkoverLocked(match_id));
                }
                match current.result {
                    None => return Err(BracketError::NoResultRecorded(match_id)),
                    Some(previous) if previous == result => return Ok(()),
                    Some(_) => {}
                }
                if result == MatchResult::Draw {
                    return Err(BracketError::DrawNotAllowed(match_id));
                }
                self.clear_result(match_id)?;
                self.record_result(match_id, result)
            }
            Self::RoundRobin(b) => b.edit_result(match_id, result),
            Self::Swiss(b) => b.edit_result(match_id, result),
        }
    }

    pub fn clear_result(&mut self, match_id: MatchId) -> Result<(), BracketError> {
        match self {
            Self::SingleElimination(b) => b.clear_result(match_id),
            Self::DoubleElimination(b) => b.clear_result(match_id),
            Self::RoundRobin(b) => b.clear_result(match_id),
            Self::Swiss(b) => b.clear_result(match_id),
        }
    }

    /// Current table for `participants` (elimination formats count wins and losses only).
    pub fn standings(&self, participants: &[ParticipantId], config: &BracketConfig) -> Vec<Standing> {
        match self {
            Self::SingleElimination(b) => b.standings(participants, config),
            Self::DoubleElimination(b) => b.standings(participants, config),
            Self::RoundRobin(b) => b.standings(),
            Self::Swiss(b) => b.standings(),
        }
    }

    pub fn placements(&self) -> &Placements {
        match self {
            Self::SingleElimination(b) => &b.placements,
            Self::DoubleElimination(b) => &b.placements,
            Self::RoundRobin(b) => &b.placements,
            Self::Swiss(b) => &b.placements,
        }
    }

    /// Fix the podium. Elimination brackets need a decided final (and third-place match);
    /// round robin needs every tie broken; swiss needs every paired match played.
    pub fn declare_winners(&mut self) -> Result<Placements, BracketError> {
        match self {
            Self::SingleElimination(b) => {
                let third_place_open = b.tree.third_place.as_ref().is_some_and(|m| !m.is_decided());
                if b.placements.is_complete() && !third_place_open {
                    Ok(b.placements.clone())
                } else {
                    Err(BracketError::IncompleteResults)
                }
            }
            Self::DoubleElimination(b) => {
                if b.placements.is_complete() {
                    Ok(b.placements.clone())
                } else {
                    Err(BracketError::IncompleteResults)
                }
            }
            Self::RoundRobin(b) => b.declare_winners(),
            Self::Swiss(b) => b.finalize(),
        }
    }

    pub fn pair_next_round(&mut self) -> Result<&SwissRound, BracketError> {
        match self {
            Self::Swiss(b) => b.pair_next_round(),
            _ => Err(BracketError::InvalidState),
        }
    }

    pub fn generate_tiebreaker(&mut self) -> Result<Option<TiebreakStage>, BracketError> {
        match self {
            Self::RoundRobin(b) => b.generate_tiebreaker(),
            _ => Err(BracketError::InvalidState),
        }
    }

    /// Rebuild a bracket of `format` from a persisted record.
    pub fn from_record(
        format: Format,
        participants: &mut [Participant],
        config: &BracketConfig,
        record: &BracketRecord,
    ) -> Result<Self, BracketError> {
        Ok(match format {
            Format::SingleElimination => {
                Self::SingleElimination(SingleElimination::from_record(participants, config, record)?)
            }
            Format::DoubleElimination => {
                Self::DoubleElimination(DoubleElimination::from_record(participants, config, record)?)
            }
            Format::RoundRobin => Self::RoundRobin(RoundRobin::from_record(participants, config, record)?),
            Format::Swiss => Self::Swiss(Swiss::from_record(participants, config, record)?),
        })
    }
}

impl Saveable for BracketEngine {
    fn serialize(&self) -> BracketRecord {
        match self {
            Self::SingleElimination(b) => Saveable::serialize(b),
            Self::DoubleElimination(b) => Saveable::serialize(b),
            Self::RoundRobin(b) => Saveable::serialize(b),
            Self::Swiss(b) => Saveable::serialize(b),
        }
    }
}
