//! Double elimination: losers drop into the losers bracket, grand finals and the reset match.

use crate::config::BracketConfig;
use crate::logic::builder::{double_elimination_tree, ensure_participants};
use crate::logic::records::{BracketRecord, Saveable};
use crate::logic::seeding::{seed_tree, SeedingIssue};
use crate::logic::single_elimination::{restore_tree, tree_records};
use crate::logic::tree::{Decided, EliminationTree, Section};
use crate::models::{
    BracketError, Match, MatchId, MatchResult, Participant, ParticipantId, Placements,
    SeedingStrategy, Standing,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoubleElimination {
    pub tree: EliminationTree,
    pub placements: Placements,
    pub seeded: bool,
    participant_count: usize,
}

impl DoubleElimination {
    pub fn build(participant_count: usize, config: &BracketConfig) -> Result<Self, BracketError> {
        ensure_participants(participant_count, config)?;
        let tree = double_elimination_tree(participant_count);
        log::info!(
            "Built double elimination bracket: {} participants, {} winners rounds, {} losers rounds",
            participant_count,
            tree.winners.len(),
            tree.losers.len()
        );
        Ok(Self {
            tree,
            placements: Placements::default(),
            seeded: false,
            participant_count,
        })
    }

    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        participants: &mut [Participant],
        strategy: SeedingStrategy,
        rng: &mut R,
    ) -> Result<Vec<SeedingIssue>, BracketError> {
        if self.seeded {
            log::debug!("Bracket already generated; seeding skipped");
            return Ok(Vec::new());
        }
        if participants.len() != self.participant_count {
            return Err(BracketError::InvalidState);
        }
        let issues = seed_tree(&mut self.tree, participants, strategy, rng);
        self.seeded = true;
        self.settle();
        Ok(issues)
    }

    /// Record "X won". Losers of winners-bracket matches drop into their mapped losers match.
    pub fn record_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        if !self.seeded {
            return Err(BracketError::InvalidState);
        }
        let at = self
            .tree
            .locate(match_id)
            .ok_or(BracketError::MatchNotFound(match_id))?;
        let decided = self.tree.record(at, result)?;
        self.after_decided(decided);
        self.settle();
        Ok(())
    }

    /// Undo a result and everything that followed from it (including a reset match).
    pub fn clear_result(&mut self, match_id: MatchId) -> Result<(), BracketError> {
        let at = self
            .tree
            .locate(match_id)
            .ok_or(BracketError::MatchNotFound(match_id))?;
        self.tree.clear(at)?;
        let grand_finals_open = self
            .tree
            .grand_finals
            .as_ref()
            .is_some_and(|m| m.result.is_none());
        if grand_finals_open && self.tree.reset_match.take().is_some() {
            log::info!("Grand finals result cleared; reset match removed");
        }
        self.settle();
        Ok(())
    }

    /// Winning grand finals from the losers side forces exactly one more match.
    fn after_decided(&mut self, decided: Decided) {
        if decided.at.section == Section::GrandFinals {
            self.open_reset_if_needed();
        }
    }

    fn open_reset_if_needed(&mut self) {
        let Some(grand_finals) = &self.tree.grand_finals else {
            return;
        };
        if grand_finals.result == Some(MatchResult::Player2) && self.tree.reset_match.is_none() {
            let mut reset = Match::new(0, 0);
            reset.slots = grand_finals.slots;
            log::info!("Losers bracket finalist won grand finals; reset match required");
            self.tree.reset_match = Some(reset);
        }
    }

    fn settle(&mut self) {
        for decided in self.tree.settle() {
            self.after_decided(decided);
        }
        self.placements = self.derive_placements();
    }

    fn derive_placements(&self) -> Placements {
        let mut placements = Placements::default();
        if let Some(grand_finals) = &self.tree.grand_finals {
            let decider = match grand_finals.result {
                Some(MatchResult::Player1) => Some(grand_finals),
                Some(MatchResult::Player2) => self.tree.reset_match.as_ref(),
                _ => None,
            };
            if let Some(m) = decider {
                placements.winner = m.winner();
                placements.runner_up = m.loser();
            }
        }
        placements.third_place = self
            .tree
            .losers
            .last()
            .and_then(|r| r.matches.first())
            .and_then(Match::loser);
        placements
    }

    pub fn standings(&self, participants: &[ParticipantId], config: &BracketConfig) -> Vec<Standing> {
        crate::logic::standings::standings(
            participants,
            self.tree.matches().map(|(_, m)| m),
            &config.points,
        )
    }

    pub fn from_record(
        participants: &mut [Participant],
        config: &BracketConfig,
        record: &BracketRecord,
    ) -> Result<Self, BracketError> {
        let mut bracket = Self::build(participants.len(), config)?;
        restore_tree(&mut bracket.tree, participants, record)?;
        bracket.seeded = true;
        bracket.open_reset_if_needed();
        bracket.settle();
        Ok(bracket)
    }
}

impl Saveable for DoubleElimination {
    fn serialize(&self) -> BracketRecord {
        BracketRecord {
            matches: Some(tree_records(&self.tree)),
            tournament_winner_id: self.placements.winner,
            ..BracketRecord::default()
        }
    }
}
