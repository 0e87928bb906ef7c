//! Single elimination: winners advance round by round, optional third-place match.

use crate::config::BracketConfig;
use crate::logic::builder::{ensure_participants, single_elimination_tree};
use crate::logic::records::{BracketRecord, MatchRecord, Saveable};
use crate::logic::seeding::{seed_tree, SeedingIssue};
use crate::logic::tree::{EliminationTree, MatchRef, Section};
use crate::models::{
    BracketError, MatchId, MatchResult, Participant, ParticipantId, Placements, SeedingStrategy,
    Standing,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SingleElimination {
    pub tree: EliminationTree,
    pub placements: Placements,
    /// Set once round one is filled; seeding again is a no-op.
    pub seeded: bool,
    participant_count: usize,
}

impl SingleElimination {
    /// Empty skeleton: ceil(log2 n) rounds, byes left empty.
    pub fn build(participant_count: usize, config: &BracketConfig) -> Result<Self, BracketError> {
        ensure_participants(participant_count, config)?;
        let tree = single_elimination_tree(participant_count, config.third_place_match);
        log::info!(
            "Built single elimination bracket: {} participants, {} rounds",
            participant_count,
            tree.winners.len()
        );
        Ok(Self {
            tree,
            placements: Placements::default(),
            seeded: false,
            participant_count,
        })
    }

    pub fn round_count(&self) -> usize {
        self.tree.winners.len()
    }

    /// Fill round one and resolve byes. No-op if the bracket was already seeded.
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

    /// Record "X won". The winner moves to `(round + 1, position / 2)`.
    pub fn record_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        if !self.seeded {
            return Err(BracketError::InvalidState);
        }
        let at = self
            .tree
            .locate(match_id)
            .ok_or(BracketError::MatchNotFound(match_id))?;
        let decided = self.tree.record(at, result)?;
        log::debug!("{:?}: {} advances", decided.at, decided.winner);
        self.settle();
        Ok(())
    }

    /// Undo a result and everything that followed from it.
    pub fn clear_result(&mut self, match_id: MatchId) -> Result<(), BracketError> {
        let at = self
            .tree
            .locate(match_id)
            .ok_or(BracketError::MatchNotFound(match_id))?;
        self.tree.clear(at)?;
        self.settle();
        Ok(())
    }

    fn settle(&mut self) {
        self.tree.settle();
        self.placements = self.derive_placements();
    }

    fn derive_placements(&self) -> Placements {
        let mut placements = Placements::default();
        if let Some(final_match) = self.tree.winners.last().and_then(|r| r.matches.first()) {
            placements.winner = final_match.winner();
            placements.runner_up = final_match.loser();
        }
        placements.third_place = self.tree.third_place.as_ref().and_then(|m| m.winner());
        placements
    }

    /// Win/loss table over contested matches.
    pub fn standings(&self, participants: &[ParticipantId], config: &BracketConfig) -> Vec<Standing> {
        crate::logic::standings::standings(
            participants,
            self.tree.matches().map(|(_, m)| m),
            &config.points,
        )
    }

    /// Rebuild from a persisted match list. Matches are matched up by section, round and position.
    pub fn from_record(
        participants: &mut [Participant],
        config: &BracketConfig,
        record: &BracketRecord,
    ) -> Result<Self, BracketError> {
        let mut bracket = Self::build(participants.len(), config)?;
        restore_tree(&mut bracket.tree, participants, record)?;
        bracket.seeded = true;
        bracket.settle();
        Ok(bracket)
    }
}

impl Saveable for SingleElimination {
    fn serialize(&self) -> BracketRecord {
        BracketRecord {
            matches: Some(tree_records(&self.tree)),
            tournament_winner_id: self.placements.winner,
            ..BracketRecord::default()
        }
    }
}

/// Flat records for every match of an elimination tree.
pub(crate) fn tree_records(tree: &EliminationTree) -> Vec<MatchRecord> {
    tree.matches()
        .map(|(at, m)| MatchRecord::from_match(m, Some(at.section)))
        .collect()
}

/// Copy persisted slots and results into a freshly built tree.
pub(crate) fn restore_tree(
    tree: &mut EliminationTree,
    participants: &mut [Participant],
    record: &BracketRecord,
) -> Result<(), BracketError> {
    let known: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
    for rec in record.matches.iter().flatten() {
        if let Some(unknown) = rec.participants().find(|id| !known.contains(id)) {
            return Err(BracketError::ParticipantNotFound(unknown));
        }
        let section = rec.bracket.unwrap_or(Section::Winners);
        let restored = rec.to_match()?;
        if section == Section::Reset {
            tree.reset_match = Some(restored);
            continue;
        }
        let at = MatchRef::new(section, rec.round, rec.position);
        let m = tree.get_mut(at).ok_or_else(|| {
            BracketError::InvalidRecord(format!("no {:?} match at round {} position {}", section, rec.round, rec.position))
        })?;
        m.id = restored.id;
        m.slots = restored.slots;
        m.result = restored.result;
        m.walkover = restored.walkover;
    }
    let placed: Vec<ParticipantId> = tree
        .winners
        .first()
        .map(|r| r.matches.iter().flat_map(|m| m.slots).flatten().collect())
        .unwrap_or_default();
    crate::logic::seeding::mark_placed(participants, &placed);
    Ok(())
}
