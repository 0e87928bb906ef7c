//! Swiss: round-by-round greedy pairing by standing, avoiding rematches.

use crate::config::{BracketConfig, PointsTable};
use crate::logic::builder::{ensure_participants, round_count};
use crate::logic::records::{BracketRecord, MatchRecord, Saveable, SwissRoundRecord};
use crate::logic::seeding::{mark_placed, seed_order, SeedingIssue};
use crate::models::{
    BracketError, Match, MatchId, MatchResult, Participant, ParticipantId, Placements,
    SeedingStrategy, Standing,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SwissRound {
    /// 1-based.
    pub round_number: u32,
    pub matches: Vec<Match>,
}

impl SwissRound {
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(Match::is_decided)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Win,
    Loss,
    Draw,
}

/// Running score of one participant.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SwissScore {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
    pub opponents: Vec<ParticipantId>,
    pub matches_by_round: BTreeMap<u32, RoundOutcome>,
}

impl SwissScore {
    fn add(&mut self, round: u32, outcome: RoundOutcome, points: &PointsTable) {
        match outcome {
            RoundOutcome::Win => {
                self.wins += 1;
                self.points += points.win;
            }
            RoundOutcome::Loss => {
                self.losses += 1;
                self.points += points.loss;
            }
            RoundOutcome::Draw => {
                self.draws += 1;
                self.points += points.draw;
            }
        }
        self.matches_by_round.insert(round, outcome);
    }

    fn remove(&mut self, round: u32, outcome: RoundOutcome, points: &PointsTable) {
        match outcome {
            RoundOutcome::Win => {
                self.wins = self.wins.saturating_sub(1);
                self.points = self.points.saturating_sub(points.win);
            }
            RoundOutcome::Loss => {
                self.losses = self.losses.saturating_sub(1);
                self.points = self.points.saturating_sub(points.loss);
            }
            RoundOutcome::Draw => {
                self.draws = self.draws.saturating_sub(1);
                self.points = self.points.saturating_sub(points.draw);
            }
        }
        self.matches_by_round.remove(&round);
    }

    pub fn played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Swiss {
    pub rounds: Vec<SwissRound>,
    pub scores: HashMap<ParticipantId, SwissScore>,
    /// Seed order; last tiebreak of the ranking.
    pub order: Vec<ParticipantId>,
    /// Planned number of rounds.
    pub total_rounds: u32,
    pub placements: Placements,
    pub seeded: bool,
    points: PointsTable,
    participant_count: usize,
}

impl Swiss {
    pub fn build(participant_count: usize, config: &BracketConfig) -> Result<Self, BracketError> {
        ensure_participants(participant_count, config)?;
        let total_rounds = config
            .swiss_rounds
            .unwrap_or_else(|| round_count(participant_count))
            .max(1);
        log::info!(
            "Built swiss bracket: {} participants, {} rounds planned",
            participant_count,
            total_rounds
        );
        Ok(Self {
            rounds: Vec::new(),
            scores: HashMap::new(),
            order: Vec::new(),
            total_rounds,
            placements: Placements::default(),
            seeded: false,
            points: config.points,
            participant_count,
        })
    }

    /// Pair round one: seed order, adjacent pairs, odd leftover gets a bye.
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        participants: &mut [Participant],
        strategy: SeedingStrategy,
        rng: &mut R,
    ) -> Result<Vec<SeedingIssue>, BracketError> {
        if self.seeded {
            log::debug!("Swiss round one already paired; seeding skipped");
            return Ok(Vec::new());
        }
        if participants.len() != self.participant_count {
            return Err(BracketError::InvalidState);
        }
        let (order, issues) = seed_order(participants, strategy, rng);
        self.scores = order.iter().map(|&id| (id, SwissScore::default())).collect();
        let pairs: Vec<(ParticipantId, ParticipantId)> =
            order.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        let byes: Vec<ParticipantId> = order.chunks_exact(2).remainder().to_vec();
        self.order = order;
        self.push_round(pairs, byes);
        mark_placed(participants, &self.order);
        self.seeded = true;
        Ok(issues)
    }

    /// Participants ordered by points desc, wins desc, then seed order.
    pub fn ranking(&self) -> Vec<ParticipantId> {
        let mut ranked = self.order.clone();
        ranked.sort_by(|a, b| {
            let sa = self.scores.get(a);
            let sb = self.scores.get(b);
            let key = |s: Option<&SwissScore>| s.map(|s| (s.points, s.wins)).unwrap_or((0, 0));
            key(sb).cmp(&key(sa))
        });
        ranked
    }

    pub fn has_played(&self, a: ParticipantId, b: ParticipantId) -> bool {
        self.scores
            .get(&a)
            .is_some_and(|s| s.opponents.contains(&b))
    }

    pub fn has_had_bye(&self, id: ParticipantId) -> bool {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .any(|m| m.walkover && m.slots == [Some(id), None])
    }

    /// Pair the next round from the current standings. With an odd count one
    /// participant sits out first: the lowest-ranked without an earlier bye
    /// whose absence lets everyone else pair without a rematch.
    pub fn pair_next_round(&mut self) -> Result<&SwissRound, BracketError> {
        if !self.seeded {
            return Err(BracketError::InvalidState);
        }
        if self.rounds.iter().any(|r| !r.is_complete()) {
            return Err(BracketError::IncompleteResults);
        }
        if self.rounds.len() as u32 >= self.total_rounds {
            return Err(BracketError::AllRoundsPlayed);
        }

        let ranking = self.ranking();
        let (pairs, byes) = if ranking.len() % 2 == 1 {
            // bye candidates: no earlier bye first, lowest-ranked first
            let mut candidates: Vec<usize> = (0..ranking.len()).rev().collect();
            candidates.sort_by_key(|&i| self.has_had_bye(ranking[i]));
            let mut fallback = None;
            let mut clean = None;
            for i in candidates {
                let mut rest = ranking.clone();
                let sits_out = rest.remove(i);
                let (pairs, mut leftovers) = self.greedy_pairs(rest);
                leftovers.insert(0, sits_out);
                if leftovers.len() == 1 {
                    clean = Some((pairs, leftovers));
                    break;
                }
                fallback.get_or_insert((pairs, leftovers));
            }
            clean.or(fallback).unwrap_or_default()
        } else {
            self.greedy_pairs(ranking)
        };
        if byes.len() > 1 {
            log::warn!(
                "No rematch-free pairing left for {} participants; awarding byes",
                byes.len()
            );
        }
        self.placements = Placements::default();
        self.push_round(pairs, byes);
        let round = self.rounds.len();
        log::info!("Swiss round {} paired", round);
        Ok(&self.rounds[round - 1])
    }

    /// Top-down greedy pass. Whoever finds no new opponent is returned unpaired.
    fn greedy_pairs(
        &self,
        mut unpaired: Vec<ParticipantId>,
    ) -> (Vec<(ParticipantId, ParticipantId)>, Vec<ParticipantId>) {
        let mut pairs = Vec::new();
        let mut leftovers = Vec::new();
        while !unpaired.is_empty() {
            let top = unpaired.remove(0);
            match unpaired.iter().position(|&o| !self.has_played(top, o)) {
                Some(i) => {
                    let opponent = unpaired.remove(i);
                    pairs.push((top, opponent));
                }
                None => leftovers.push(top),
            }
        }
        (pairs, leftovers)
    }

    fn push_round(&mut self, pairs: Vec<(ParticipantId, ParticipantId)>, byes: Vec<ParticipantId>) {
        let round_number = self.rounds.len() as u32 + 1;
        let mut matches = Vec::with_capacity(pairs.len() + byes.len());
        for (a, b) in pairs {
            self.scores.entry(a).or_default().opponents.push(b);
            self.scores.entry(b).or_default().opponents.push(a);
            matches.push(Match::between(round_number, matches.len() as u32, a, b));
        }
        for id in byes {
            let mut bye = Match::new(round_number, matches.len() as u32);
            bye.slots = [Some(id), None];
            bye.result = Some(MatchResult::Player1);
            bye.walkover = true;
            self.apply(bye.slots, round_number, MatchResult::Player1, false);
            matches.push(bye);
        }
        self.rounds.push(SwissRound {
            round_number,
            matches,
        });
    }

    /// Add (or with `undo`, take back) the effect of a result on both scores.
    fn apply(&mut self, slots: [Option<ParticipantId>; 2], round: u32, result: MatchResult, undo: bool) {
        for (slot, id) in slots.iter().enumerate() {
            let Some(id) = id else { continue };
            let outcome = match result.winning_slot() {
                None => RoundOutcome::Draw,
                Some(s) if s == slot => RoundOutcome::Win,
                Some(_) => RoundOutcome::Loss,
            };
            let score = self.scores.entry(*id).or_default();
            if undo {
                score.remove(round, outcome, &self.points);
            } else {
                score.add(round, outcome, &self.points);
            }
        }
    }

    fn locate(&self, match_id: MatchId) -> Result<(usize, usize), BracketError> {
        self.rounds
            .iter()
            .enumerate()
            .find_map(|(r, round)| {
                round
                    .matches
                    .iter()
                    .position(|m| m.id == match_id)
                    .map(|i| (r, i))
            })
            .ok_or(BracketError::MatchNotFound(match_id))
    }

    /// Locate a match that may still be changed by hand.
    fn editable(&self, match_id: MatchId) -> Result<(usize, usize), BracketError> {
        let (r, i) = self.locate(match_id)?;
        let m = &self.rounds[r].matches[i];
        if m.walkover {
            return Err(BracketError::WalkoverLocked(match_id));
        }
        Ok((r, i))
    }

    pub fn record_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        let (r, i) = self.editable(match_id)?;
        let m = &self.rounds[r].matches[i];
        if m.result.is_some() {
            return Err(BracketError::ResultAlreadyRecorded(match_id));
        }
        if !m.is_full() {
            return Err(BracketError::MatchNotReady(match_id));
        }
        let (slots, round) = (m.slots, m.round);
        self.apply(slots, round, result, false);
        self.rounds[r].matches[i].result = Some(result);
        self.placements = Placements::default();
        Ok(())
    }

    /// Reverse the previous result, then apply the new one.
    pub fn edit_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        let (r, i) = self.editable(match_id)?;
        let m = &self.rounds[r].matches[i];
        let previous = m.result.ok_or(BracketError::NoResultRecorded(match_id))?;
        let (slots, round) = (m.slots, m.round);
        self.apply(slots, round, previous, true);
        self.apply(slots, round, result, false);
        self.rounds[r].matches[i].result = Some(result);
        self.placements = Placements::default();
        Ok(())
    }

    pub fn clear_result(&mut self, match_id: MatchId) -> Result<(), BracketError> {
        let (r, i) = self.editable(match_id)?;
        let m = &self.rounds[r].matches[i];
        let previous = m.result.ok_or(BracketError::NoResultRecorded(match_id))?;
        let (slots, round) = (m.slots, m.round);
        self.apply(slots, round, previous, true);
        self.rounds[r].matches[i].result = None;
        self.placements = Placements::default();
        Ok(())
    }

    /// Table in ranking order. Byes count as played wins.
    pub fn standings(&self) -> Vec<Standing> {
        self.ranking()
            .into_iter()
            .map(|id| {
                let score = self.scores.get(&id).cloned().unwrap_or_default();
                Standing {
                    participant_id: id,
                    played: score.played(),
                    wins: score.wins,
                    draws: score.draws,
                    losses: score.losses,
                    points: score.points,
                }
            })
            .collect()
    }

    /// Top three of the ranking once every paired match has a result.
    pub fn finalize(&mut self) -> Result<Placements, BracketError> {
        if self.rounds.is_empty() {
            return Err(BracketError::InvalidState);
        }
        if self.rounds.iter().any(|r| !r.is_complete()) {
            return Err(BracketError::IncompleteResults);
        }
        if (self.rounds.len() as u32) < self.total_rounds {
            log::warn!(
                "Finalizing swiss after {} of {} planned rounds",
                self.rounds.len(),
                self.total_rounds
            );
        }
        self.placements = Placements::from_order(&self.ranking());
        Ok(self.placements.clone())
    }

    /// Replay persisted rounds. Seed order is recovered from the round-one pairing.
    pub fn from_record(
        participants: &mut [Participant],
        config: &BracketConfig,
        record: &BracketRecord,
    ) -> Result<Self, BracketError> {
        let mut swiss = Self::build(participants.len(), config)?;
        let known: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();

        let mut rounds: Vec<SwissRoundRecord> = record.rounds.clone().unwrap_or_default();
        if rounds.is_empty() {
            // flat match lists group by their round field
            let mut by_round: BTreeMap<u32, Vec<MatchRecord>> = BTreeMap::new();
            for rec in record.matches.iter().flatten() {
                by_round.entry(rec.round).or_default().push(rec.clone());
            }
            rounds = by_round
                .into_iter()
                .map(|(round_number, matches)| SwissRoundRecord {
                    round_number,
                    matches,
                })
                .collect();
        }
        rounds.sort_by_key(|r| r.round_number);

        swiss.scores = known.iter().map(|&id| (id, SwissScore::default())).collect();
        for round in &rounds {
            let mut matches = Vec::with_capacity(round.matches.len());
            for rec in &round.matches {
                if let Some(unknown) = rec.participants().find(|id| !known.contains(id)) {
                    return Err(BracketError::ParticipantNotFound(unknown));
                }
                let mut m = rec.to_match()?;
                m.round = round.round_number;
                if let [Some(a), Some(b)] = m.slots {
                    swiss.scores.entry(a).or_default().opponents.push(b);
                    swiss.scores.entry(b).or_default().opponents.push(a);
                }
                if let Some(result) = m.result {
                    swiss.apply(m.slots, m.round, result, false);
                }
                matches.push(m);
            }
            swiss.rounds.push(SwissRound {
                round_number: round.round_number,
                matches,
            });
        }

        let mut order: Vec<ParticipantId> = swiss
            .rounds
            .first()
            .map(|r| r.matches.iter().flat_map(|m| m.slots).flatten().collect())
            .unwrap_or_default();
        for id in &known {
            if !order.contains(id) {
                order.push(*id);
            }
        }
        swiss.order = order;
        swiss.total_rounds = swiss.total_rounds.max(swiss.rounds.len() as u32);
        swiss.seeded = !swiss.rounds.is_empty();
        if let Some(winner) = record.tournament_winner_id {
            let ranking = swiss.ranking();
            if ranking.first() == Some(&winner) && swiss.rounds.iter().all(SwissRound::is_complete) {
                swiss.placements = Placements::from_order(&ranking);
            }
        }
        mark_placed(participants, &known);
        Ok(swiss)
    }
}

impl Saveable for Swiss {
    fn serialize(&self) -> BracketRecord {
        let rounds = self
            .rounds
            .iter()
            .map(|r| SwissRoundRecord {
                round_number: r.round_number,
                matches: r
                    .matches
                    .iter()
                    .map(|m| MatchRecord::from_match(m, None))
                    .collect(),
            })
            .collect();
        BracketRecord {
            rounds: Some(rounds),
            tournament_winner_id: self.placements.winner,
            ..BracketRecord::default()
        }
    }
}
