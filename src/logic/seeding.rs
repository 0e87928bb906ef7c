//! Seeding: order participants by strategy and lay them out in round-one slots.

use crate::logic::tree::EliminationTree;
use crate::models::{Participant, ParticipantId, SeedingStrategy};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Problem found while ordering by explicit seed numbers. Seeding still succeeds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SeedingIssue {
    /// No seed number; appended after the seeded participants.
    MissingSeed(ParticipantId),
    /// Seed number already used by an earlier participant; registration order decides.
    DuplicateSeed { seed: u32, participant: ParticipantId },
}

/// Order participants for placement.
///
/// - `Random`: Fisher-Yates shuffle.
/// - `SkillBased`: skill descending, stable (ties keep registration order).
/// - `Manual`: seed number ascending; unseeded participants appended in registration order.
/// - `Registration`: as given.
pub fn seed_order<R: Rng + ?Sized>(
    participants: &[Participant],
    strategy: SeedingStrategy,
    rng: &mut R,
) -> (Vec<ParticipantId>, Vec<SeedingIssue>) {
    let mut issues = Vec::new();
    let order = match strategy {
        SeedingStrategy::Random => {
            let mut ids: Vec<_> = participants.iter().map(|p| p.id).collect();
            ids.shuffle(rng);
            ids
        }
        SeedingStrategy::SkillBased => {
            let mut sorted: Vec<&Participant> = participants.iter().collect();
            sorted.sort_by(|a, b| b.skill.unwrap_or(0).cmp(&a.skill.unwrap_or(0)));
            sorted.into_iter().map(|p| p.id).collect()
        }
        SeedingStrategy::Manual => {
            let mut seen = HashSet::new();
            let mut seeded: Vec<(u32, ParticipantId)> = Vec::new();
            let mut unseeded = Vec::new();
            for p in participants {
                match p.seed_number {
                    Some(seed) => {
                        if !seen.insert(seed) {
                            issues.push(SeedingIssue::DuplicateSeed {
                                seed,
                                participant: p.id,
                            });
                        }
                        seeded.push((seed, p.id));
                    }
                    None => {
                        issues.push(SeedingIssue::MissingSeed(p.id));
                        unseeded.push(p.id);
                    }
                }
            }
            seeded.sort_by_key(|(seed, _)| *seed);
            seeded
                .into_iter()
                .map(|(_, id)| id)
                .chain(unseeded)
                .collect()
        }
        SeedingStrategy::Registration => participants.iter().map(|p| p.id).collect(),
    };
    for issue in &issues {
        log::warn!("Manual seeding degraded: {:?}", issue);
    }
    (order, issues)
}

/// Standard bracket positions for `size` seeds (power of two): seed indices in slot order.
///
/// Seed `i` meets seed `size - 1 - i` in round one, and the top two seeds land in opposite halves.
/// `bracket_order(8) == [0, 7, 3, 4, 1, 6, 2, 5]`.
pub fn bracket_order(size: usize) -> Vec<usize> {
    let mut order = vec![0usize];
    while order.len() < size {
        let next = order.len() * 2;
        order = order
            .iter()
            .flat_map(|&s| [s, next - 1 - s])
            .collect();
    }
    order
}

/// Lay the seed order out over `size` round-one slots (two per match).
///
/// Skill-based seeding uses standard bracket positions (absent seeds become byes for the top
/// seeds); every other strategy fills slots left to right.
pub fn round_one_slots(
    order: &[ParticipantId],
    size: usize,
    strategy: SeedingStrategy,
) -> Vec<Option<ParticipantId>> {
    match strategy {
        SeedingStrategy::SkillBased => bracket_order(size)
            .into_iter()
            .map(|seed| order.get(seed).copied())
            .collect(),
        _ => (0..size).map(|i| order.get(i).copied()).collect(),
    }
}

/// Mark which participants now occupy a slot.
pub fn mark_placed(participants: &mut [Participant], placed: &[ParticipantId]) {
    let placed: HashSet<_> = placed.iter().copied().collect();
    for p in participants {
        p.is_placed = placed.contains(&p.id);
    }
}

/// Seed an elimination bracket: order, lay out round one, mark the placed participants.
pub fn seed_tree<R: Rng + ?Sized>(
    tree: &mut EliminationTree,
    participants: &mut [Participant],
    strategy: SeedingStrategy,
    rng: &mut R,
) -> Vec<SeedingIssue> {
    let size = tree.winners.first().map_or(0, |r| r.matches.len() * 2);
    let (order, issues) = seed_order(participants, strategy, rng);
    let slots = round_one_slots(&order, size, strategy);
    tree.place_round_one(&slots);
    mark_placed(participants, &order);
    issues
}
