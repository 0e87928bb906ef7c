//! Elimination bracket arena.
//!
//! Matches are addressed by [`MatchRef`] (section, round, position) and slots hold participant
//! ids. Advancement is data, not code: each [`Feed`] says "the winner (or loser) of match X goes
//! into slot S of match Y". Single and double elimination only differ in the feeds the builder
//! lays down and in how the final placements are read off the tree.

use crate::models::{BracketError, Match, MatchId, MatchResult, ParticipantId, Round};
use serde::{Deserialize, Serialize};

/// Part of an elimination bracket a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Winners,
    Losers,
    ThirdPlace,
    GrandFinals,
    Reset,
}

/// Address of a match inside an [`EliminationTree`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct MatchRef {
    pub section: Section,
    pub round: u32,
    pub position: u32,
}

impl MatchRef {
    pub fn new(section: Section, round: u32, position: u32) -> Self {
        Self {
            section,
            round,
            position,
        }
    }

    pub fn winners(round: u32, position: u32) -> Self {
        Self::new(Section::Winners, round, position)
    }

    pub fn losers(round: u32, position: u32) -> Self {
        Self::new(Section::Losers, round, position)
    }

    /// Sections holding a single match (third place, grand finals, reset).
    pub fn single(section: Section) -> Self {
        Self::new(section, 0, 0)
    }
}

/// Which participant of a decided match a feed carries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Winner,
    Loser,
}

/// Advancement edge: `outcome` of `from` fills `slot` of `to`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub from: MatchRef,
    pub outcome: Outcome,
    pub to: MatchRef,
    pub slot: usize,
}

/// A match that just got decided, by a recorded result or a walkover.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decided {
    pub at: MatchRef,
    pub winner: ParticipantId,
    /// None for walkovers.
    pub loser: Option<ParticipantId>,
}

/// All matches of an elimination bracket plus the feeds between them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct EliminationTree {
    pub winners: Vec<Round>,
    pub losers: Vec<Round>,
    pub third_place: Option<Match>,
    pub grand_finals: Option<Match>,
    /// Only present once the losers-bracket finalist has won grand finals.
    pub reset_match: Option<Match>,
    feeds: Vec<Feed>,
}

impl EliminationTree {
    pub fn get(&self, at: MatchRef) -> Option<&Match> {
        match at.section {
            Section::Winners => self
                .winners
                .get(at.round as usize)?
                .matches
                .get(at.position as usize),
            Section::Losers => self
                .losers
                .get(at.round as usize)?
                .matches
                .get(at.position as usize),
            Section::ThirdPlace => self.third_place.as_ref(),
            Section::GrandFinals => self.grand_finals.as_ref(),
            Section::Reset => self.reset_match.as_ref(),
        }
    }

    pub fn get_mut(&mut self, at: MatchRef) -> Option<&mut Match> {
        match at.section {
            Section::Winners => self
                .winners
                .get_mut(at.round as usize)?
                .matches
                .get_mut(at.position as usize),
            Section::Losers => self
                .losers
                .get_mut(at.round as usize)?
                .matches
                .get_mut(at.position as usize),
            Section::ThirdPlace => self.third_place.as_mut(),
            Section::GrandFinals => self.grand_finals.as_mut(),
            Section::Reset => self.reset_match.as_mut(),
        }
    }

    pub fn add_feed(&mut self, from: MatchRef, outcome: Outcome, to: MatchRef, slot: usize) {
        self.feeds.push(Feed {
            from,
            outcome,
            to,
            slot,
        });
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Every match address, in an order where feeders come before the matches they feed.
    pub fn refs(&self) -> Vec<MatchRef> {
        let mut refs = Vec::new();
        for (section, rounds) in [(Section::Winners, &self.winners), (Section::Losers, &self.losers)] {
            for (r, round) in rounds.iter().enumerate() {
                for p in 0..round.matches.len() {
                    refs.push(MatchRef::new(section, r as u32, p as u32));
                }
            }
        }
        if self.third_place.is_some() {
            refs.push(MatchRef::single(Section::ThirdPlace));
        }
        if self.grand_finals.is_some() {
            refs.push(MatchRef::single(Section::GrandFinals));
        }
        if self.reset_match.is_some() {
            refs.push(MatchRef::single(Section::Reset));
        }
        refs
    }

    pub fn matches(&self) -> impl Iterator<Item = (MatchRef, &Match)> + '_ {
        self.refs()
            .into_iter()
            .filter_map(move |at| self.get(at).map(|m| (at, m)))
    }

    pub fn locate(&self, id: MatchId) -> Option<MatchRef> {
        self.matches().find(|(_, m)| m.id == id).map(|(at, _)| at)
    }

    /// Number of matches actually contested (byes excluded).
    pub fn contested_count(&self) -> usize {
        self.matches().filter(|(_, m)| m.is_contested()).count()
    }

    fn feed_into(&self, to: MatchRef, slot: usize) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.to == to && f.slot == slot)
    }

    /// Whether a slot holds, or will eventually hold, a participant.
    ///
    /// Seed slots are live when filled. A winner feed is live when its match has a live slot;
    /// a loser feed only when both slots are live (a walkover produces no loser).
    pub fn slot_is_live(&self, at: MatchRef, slot: usize) -> bool {
        match self.feed_into(at, slot) {
            None => self.get(at).is_some_and(|m| m.slots[slot].is_some()),
            Some(feed) => {
                let first = self.slot_is_live(feed.from, 0);
                let second = self.slot_is_live(feed.from, 1);
                match feed.outcome {
                    Outcome::Winner => first || second,
                    Outcome::Loser => first && second,
                }
            }
        }
    }

    /// Fill round-one slots, two per match, left to right.
    pub fn place_round_one(&mut self, slots: &[Option<ParticipantId>]) {
        if let Some(first) = self.winners.first_mut() {
            for (m, pair) in first.matches.iter_mut().zip(slots.chunks(2)) {
                m.slots = [
                    pair.first().copied().flatten(),
                    pair.get(1).copied().flatten(),
                ];
            }
        }
    }

    /// Record a decisive result and move the winner and loser along their feeds.
    pub fn record(&mut self, at: MatchRef, result: MatchResult) -> Result<Decided, BracketError> {
        let m = self.get_mut(at).ok_or(BracketError::InvalidState)?;
        if m.result.is_some() {
            return Err(BracketError::ResultAlreadyRecorded(m.id));
        }
        let (Some(first), Some(second)) = (m.slots[0], m.slots[1]) else {
            return Err(BracketError::MatchNotReady(m.id));
        };
        let winning_slot = result
            .winning_slot()
            .ok_or(BracketError::DrawNotAllowed(m.id))?;
        m.result = Some(result);
        let (winner, loser) = if winning_slot == 0 {
            (first, second)
        } else {
            (second, first)
        };
        let decided = Decided {
            at,
            winner,
            loser: Some(loser),
        };
        self.advance(&decided);
        Ok(decided)
    }

    fn advance(&mut self, decided: &Decided) {
        let targets: Vec<(MatchRef, usize, Option<ParticipantId>)> = self
            .feeds
            .iter()
            .filter(|f| f.from == decided.at)
            .map(|f| {
                let carried = match f.outcome {
                    Outcome::Winner => Some(decided.winner),
                    Outcome::Loser => decided.loser,
                };
                (f.to, f.slot, carried)
            })
            .collect();
        for (to, slot, carried) in targets {
            if let (Some(id), Some(m)) = (carried, self.get_mut(to)) {
                log::debug!("{:?} -> {:?} slot {}", decided.at, to, slot);
                m.slots[slot] = Some(id);
            }
        }
    }

    /// Auto-advance every lone participant whose opponent slot can never be filled.
    /// Returns the walkovers in the order they were applied.
    pub fn settle(&mut self) -> Vec<Decided> {
        let mut decided = Vec::new();
        loop {
            let mut progressed = false;
            for at in self.refs() {
                let Some(m) = self.get(at) else { continue };
                if m.result.is_some() {
                    continue;
                }
                let filled: Vec<usize> = (0..2).filter(|&s| m.slots[s].is_some()).collect();
                if filled.len() != 1 {
                    continue;
                }
                let present = filled[0];
                if self.slot_is_live(at, 1 - present) {
                    continue;
                }
                let Some(m) = self.get_mut(at) else { continue };
                let Some(winner) = m.slots[present] else { continue };
                m.result = Some(MatchResult::for_slot(present));
                m.walkover = true;
                let walkover = Decided {
                    at,
                    winner,
                    loser: None,
                };
                self.advance(&walkover);
                decided.push(walkover);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
        decided
    }

    /// Undo a recorded result and every slot and result downstream that depended on it.
    pub fn clear(&mut self, at: MatchRef) -> Result<(), BracketError> {
        let m = self.get(at).ok_or(BracketError::InvalidState)?;
        if m.result.is_none() {
            return Err(BracketError::NoResultRecorded(m.id));
        }
        if m.walkover {
            return Err(BracketError::WalkoverLocked(m.id));
        }
        self.unwind(at);
        Ok(())
    }

    fn unwind(&mut self, at: MatchRef) {
        if let Some(m) = self.get_mut(at) {
            m.result = None;
            m.walkover = false;
        }
        let targets: Vec<(MatchRef, usize)> = self
            .feeds
            .iter()
            .filter(|f| f.from == at)
            .map(|f| (f.to, f.slot))
            .collect();
        for (to, slot) in targets {
            let Some(m) = self.get_mut(to) else { continue };
            let removed = m.slots[slot].take();
            if removed.is_some() && m.result.is_some() {
                self.unwind(to);
            }
        }
    }
}
