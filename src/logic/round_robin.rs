//! Round robin: groups, all-pairs matches, standings and staged tiebreakers.
//!
//! Standings are never stored; they are recomputed from the full match list on every call.

use crate::config::{BracketConfig, PointsTable};
use crate::logic::builder::{circle_schedule, ensure_participants, group_count, group_label, snake_groups};
use crate::logic::records::{BracketRecord, MatchRecord, Saveable};
use crate::logic::seeding::{mark_placed, seed_order, SeedingIssue};
use crate::logic::standings::{standings, tally};
use crate::models::{
    BracketError, Match, MatchId, MatchResult, Participant, ParticipantId, Placements,
    SeedingStrategy, Standing,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Group id under which tiebreaker matches are saved.
pub const TIEBREAKER_GROUP_ID: &str = "tiebreaker";

/// Positions decided by the rankings (winner, runner-up, third).
const PODIUM: usize = 3;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub members: Vec<ParticipantId>,
}

/// A group with its current table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupStandings {
    pub group: Group,
    pub standings: Vec<Standing>,
}

/// Mini round robin generated to break a tie at one position.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TiebreakStage {
    /// 1-based position being decided.
    pub position: usize,
    pub participants: Vec<ParticipantId>,
    pub matches: Vec<MatchId>,
}

/// Where the podium stands after all regular matches are played.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RankingStatus {
    Decided(Placements),
    /// Tied at `position`; a mini round robin among `participants` must be generated.
    TiebreakerRequired { position: usize, participants: Vec<ParticipantId> },
    /// Tiebreaker matches for `position` are not all played yet.
    TiebreakerPending { position: usize, participants: Vec<ParticipantId> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRobin {
    pub groups: Vec<Group>,
    pub matches: Vec<Match>,
    pub tiebreaker_matches: Vec<Match>,
    pub placements: Placements,
    pub seeded: bool,
    /// Registration order; final fallback of the overall ranking.
    roster: Vec<ParticipantId>,
    points: PointsTable,
    participant_count: usize,
}

impl RoundRobin {
    /// Empty groups: ceil(n / group_size) of them. Members and matches come with seeding.
    pub fn build(participant_count: usize, config: &BracketConfig) -> Result<Self, BracketError> {
        ensure_participants(participant_count, config)?;
        let groups = (0..group_count(participant_count, config.effective_group_size()))
            .map(|i| {
                let label = group_label(i);
                Group {
                    id: label.clone(),
                    name: format!("Group {label}"),
                    members: Vec::new(),
                }
            })
            .collect::<Vec<_>>();
        log::info!(
            "Built round robin: {} participants in {} group(s)",
            participant_count,
            groups.len()
        );
        Ok(Self {
            groups,
            matches: Vec::new(),
            tiebreaker_matches: Vec::new(),
            placements: Placements::default(),
            seeded: false,
            roster: Vec::new(),
            points: config.points,
            participant_count,
        })
    }

    /// Distribute participants over the groups (snake order) and schedule every pairing.
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        participants: &mut [Participant],
        strategy: SeedingStrategy,
        rng: &mut R,
    ) -> Result<Vec<SeedingIssue>, BracketError> {
        if self.seeded {
            log::debug!("Groups already generated; seeding skipped");
            return Ok(Vec::new());
        }
        if participants.len() != self.participant_count {
            return Err(BracketError::InvalidState);
        }
        let (order, issues) = seed_order(participants, strategy, rng);
        let members = snake_groups(&order, self.groups.len());
        for (group, members) in self.groups.iter_mut().zip(members) {
            group.members = members;
            for (round, pairs) in circle_schedule(&group.members).into_iter().enumerate() {
                for (position, (a, b)) in pairs.into_iter().enumerate() {
                    let mut m = Match::between(round as u32, position as u32, a, b);
                    m.group_id = Some(group.id.clone());
                    m.group_name = Some(group.name.clone());
                    self.matches.push(m);
                }
            }
        }
        mark_placed(participants, &order);
        self.roster = participants.iter().map(|p| p.id).collect();
        self.seeded = true;
        Ok(issues)
    }

    fn find_mut(&mut self, match_id: MatchId) -> Result<&mut Match, BracketError> {
        self.matches
            .iter_mut()
            .chain(self.tiebreaker_matches.iter_mut())
            .find(|m| m.id == match_id)
            .ok_or(BracketError::MatchNotFound(match_id))
    }

    /// Record a result. A match that already has one must be edited or cleared instead.
    pub fn record_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        let m = self.find_mut(match_id)?;
        if m.result.is_some() {
            return Err(BracketError::ResultAlreadyRecorded(match_id));
        }
        if m.is_tiebreaker && result == MatchResult::Draw {
            return Err(BracketError::DrawNotAllowed(match_id));
        }
        m.result = Some(result);
        let regular = !m.is_tiebreaker;
        self.results_changed(regular, false);
        Ok(())
    }

    /// Replace an existing result.
    pub fn edit_result(&mut self, match_id: MatchId, result: MatchResult) -> Result<(), BracketError> {
        let m = self.find_mut(match_id)?;
        if m.result.is_none() {
            return Err(BracketError::NoResultRecorded(match_id));
        }
        if m.is_tiebreaker && result == MatchResult::Draw {
            return Err(BracketError::DrawNotAllowed(match_id));
        }
        m.result = Some(result);
        let regular = !m.is_tiebreaker;
        self.results_changed(regular, true);
        Ok(())
    }

    pub fn clear_result(&mut self, match_id: MatchId) -> Result<(), BracketError> {
        let m = self.find_mut(match_id)?;
        if m.result.take().is_none() {
            return Err(BracketError::NoResultRecorded(match_id));
        }
        let regular = !m.is_tiebreaker;
        self.results_changed(regular, true);
        Ok(())
    }

    /// Changing a regular result after tiebreakers were generated makes them meaningless.
    fn results_changed(&mut self, regular: bool, edited: bool) {
        self.placements = Placements::default();
        if regular && edited && !self.tiebreaker_matches.is_empty() {
            log::warn!(
                "Regular result changed; discarding {} tiebreaker match(es)",
                self.tiebreaker_matches.len()
            );
            self.tiebreaker_matches.clear();
        }
    }

    /// Table of one group, recomputed from its matches.
    pub fn group_standings(&self, group: &Group) -> Vec<Standing> {
        standings(
            &group.members,
            self.matches
                .iter()
                .filter(|m| m.group_id.as_deref() == Some(group.id.as_str())),
            &self.points,
        )
    }

    pub fn all_group_standings(&self) -> Vec<GroupStandings> {
        self.groups
            .iter()
            .map(|g| GroupStandings {
                group: g.clone(),
                standings: self.group_standings(g),
            })
            .collect()
    }

    /// Every participant ranked across groups (tiebreaker matches excluded).
    pub fn standings(&self) -> Vec<Standing> {
        standings(&self.roster, &self.matches, &self.points)
    }

    /// Commit positions 1, 2, 3 in order; stop at the first tie that tiebreakers do not settle.
    pub fn evaluate_rankings(&self) -> Result<RankingStatus, BracketError> {
        if self.matches.iter().any(|m| m.result.is_none()) {
            return Err(BracketError::IncompleteResults);
        }
        let overall = self.standings();
        let podium = PODIUM.min(overall.len());
        let mut committed: Vec<ParticipantId> = Vec::new();
        while committed.len() < podium {
            let remaining: Vec<&Standing> = overall
                .iter()
                .filter(|r| !committed.contains(&r.participant_id))
                .collect();
            let top = remaining[0].points;
            let tied: Vec<ParticipantId> = remaining
                .iter()
                .filter(|r| r.points == top)
                .map(|r| r.participant_id)
                .collect();
            if tied.len() == 1 {
                committed.push(tied[0]);
                continue;
            }

            let position = committed.len() + 1;
            let between: Vec<&Match> = self
                .tiebreaker_matches
                .iter()
                .filter(|m| m.slots.iter().all(|s| s.is_some_and(|id| tied.contains(&id))))
                .collect();
            if between.iter().any(|m| m.result.is_none()) {
                return Ok(RankingStatus::TiebreakerPending {
                    position,
                    participants: tied,
                });
            }
            if between.is_empty() {
                return Ok(RankingStatus::TiebreakerRequired {
                    position,
                    participants: tied,
                });
            }
            let mini = tally(&tied, between.iter().copied(), &self.points);
            let best = mini.iter().map(|r| r.points).max().unwrap_or(0);
            let leaders: Vec<ParticipantId> = mini
                .iter()
                .filter(|r| r.points == best)
                .map(|r| r.participant_id)
                .collect();
            if leaders.len() == 1 {
                committed.push(leaders[0]);
            } else {
                return Ok(RankingStatus::TiebreakerRequired {
                    position,
                    participants: leaders,
                });
            }
        }
        Ok(RankingStatus::Decided(Placements::from_order(&committed)))
    }

    /// Generate the mini round robin for the first open tie, if any.
    pub fn generate_tiebreaker(&mut self) -> Result<Option<TiebreakStage>, BracketError> {
        let (position, participants) = match self.evaluate_rankings()? {
            RankingStatus::Decided(_) => return Ok(None),
            RankingStatus::TiebreakerPending { position, .. } => {
                return Err(BracketError::TiebreakerPending { position })
            }
            RankingStatus::TiebreakerRequired {
                position,
                participants,
            } => (position, participants),
        };
        let base = self
            .tiebreaker_matches
            .iter()
            .map(|m| m.round + 1)
            .max()
            .unwrap_or(0);
        let name = format!("{} place tiebreaker", ordinal(position));
        let mut created = Vec::new();
        for (round, pairs) in circle_schedule(&participants).into_iter().enumerate() {
            for (p, (a, b)) in pairs.into_iter().enumerate() {
                let mut m = Match::between(base + round as u32, p as u32, a, b);
                m.group_id = Some(TIEBREAKER_GROUP_ID.to_string());
                m.group_name = Some(name.clone());
                m.is_tiebreaker = true;
                created.push(m.id);
                self.tiebreaker_matches.push(m);
            }
        }
        log::info!(
            "{}: {} participants, {} match(es)",
            name,
            participants.len(),
            created.len()
        );
        Ok(Some(TiebreakStage {
            position,
            participants,
            matches: created,
        }))
    }

    /// Finalize 1st/2nd/3rd from the rankings. Fails while a relevant position is tied.
    pub fn declare_winners(&mut self) -> Result<Placements, BracketError> {
        match self.evaluate_rankings()? {
            RankingStatus::Decided(placements) => {
                log::info!("Round robin winners declared: {:?}", placements);
                self.placements = placements.clone();
                Ok(placements)
            }
            RankingStatus::TiebreakerRequired { position, .. } => {
                Err(BracketError::UnresolvedTie { position })
            }
            RankingStatus::TiebreakerPending { position, .. } => {
                Err(BracketError::TiebreakerPending { position })
            }
        }
    }

    /// Rebuild groups and matches from a persisted list (groups come from the groupId tags).
    pub fn from_record(
        participants: &mut [Participant],
        config: &BracketConfig,
        record: &BracketRecord,
    ) -> Result<Self, BracketError> {
        let mut bracket = Self::build(participants.len(), config)?;
        let known: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
        let mut groups: Vec<Group> = Vec::new();
        for rec in record.all_matches() {
            if let Some(unknown) = rec.participants().find(|id| !known.contains(id)) {
                return Err(BracketError::ParticipantNotFound(unknown));
            }
            let m = rec.to_match()?;
            if rec.is_tiebreaker || rec.group_id.as_deref() == Some(TIEBREAKER_GROUP_ID) {
                let mut m = m;
                m.is_tiebreaker = true;
                bracket.tiebreaker_matches.push(m);
                continue;
            }
            let group_id = rec
                .group_id
                .clone()
                .ok_or_else(|| BracketError::InvalidRecord(format!("match {} has no group", rec.id)))?;
            let idx = match groups.iter().position(|g| g.id == group_id) {
                Some(idx) => idx,
                None => {
                    groups.push(Group {
                        name: rec
                            .group_name
                            .clone()
                            .unwrap_or_else(|| format!("Group {group_id}")),
                        id: group_id,
                        members: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            for id in m.slots.iter().flatten() {
                if !groups[idx].members.contains(id) {
                    groups[idx].members.push(*id);
                }
            }
            bracket.matches.push(m);
        }

        // participants without a single match (a group of one) get their own group back
        let grouped: Vec<ParticipantId> = groups.iter().flat_map(|g| g.members.clone()).collect();
        for id in known.iter().filter(|id| !grouped.contains(id)) {
            let label = group_label(groups.len());
            groups.push(Group {
                id: label.clone(),
                name: format!("Group {label}"),
                members: vec![*id],
            });
        }

        bracket.groups = groups;
        bracket.roster = known.clone();
        mark_placed(participants, &known);
        bracket.seeded = true;
        if record.tournament_winner_id.is_some() {
            if let Ok(RankingStatus::Decided(placements)) = bracket.evaluate_rankings() {
                if placements.winner == record.tournament_winner_id {
                    bracket.placements = placements;
                }
            }
        }
        Ok(bracket)
    }
}

impl Saveable for RoundRobin {
    fn serialize(&self) -> BracketRecord {
        let matches = self
            .matches
            .iter()
            .chain(self.tiebreaker_matches.iter())
            .map(|m| MatchRecord::from_match(m, None))
            .collect();
        BracketRecord {
            matches: Some(matches),
            tournament_winner_id: self.placements.winner,
            ..BracketRecord::default()
        }
    }
}

fn ordinal(position: usize) -> &'static str {
    match position {
        1 => "First",
        2 => "Second",
        3 => "Third",
        _ => "Next",
    }
}
