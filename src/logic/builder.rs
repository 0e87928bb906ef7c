//! Bracket structure builder: empty skeletons from a participant count.

use crate::config::BracketConfig;
use crate::logic::tree::{EliminationTree, MatchRef, Outcome, Section};
use crate::models::{BracketError, Match, ParticipantId, Round};

/// Fail with `InsufficientParticipants` below the configured minimum (never below 2).
pub fn ensure_participants(count: usize, config: &BracketConfig) -> Result<(), BracketError> {
    let required = config.required_participants();
    if count < required {
        return Err(BracketError::InsufficientParticipants {
            required,
            actual: count,
        });
    }
    Ok(())
}

/// Elimination rounds needed for `count` participants: ceil(log2 count).
pub fn round_count(count: usize) -> u32 {
    count.max(1).next_power_of_two().trailing_zeros()
}

/// Round-one slot count: the next power of two.
pub fn bracket_size(count: usize) -> usize {
    count.max(1).next_power_of_two()
}

/// Display name of a single elimination round, counted from the final backwards.
pub fn elimination_round_name(total: usize, round: usize) -> String {
    match total - round {
        1 => "Final".to_string(),
        2 => "Semifinals".to_string(),
        3 => "Quarterfinals".to_string(),
        _ => format!("Round {}", round + 1),
    }
}

fn empty_round(name: String, round: u32, matches: usize) -> Round {
    Round {
        name,
        matches: (0..matches as u32).map(|p| Match::new(round, p)).collect(),
    }
}

/// Winners-side rounds: round `r` has `size / 2^(r+1)` matches; winner of `(r, p)` feeds
/// `(r+1, p/2)`, slot `p % 2`.
fn lay_winners_rounds(tree: &mut EliminationTree, count: usize, name: impl Fn(usize, usize) -> String) {
    let rounds = round_count(count) as usize;
    let size = bracket_size(count);
    for r in 0..rounds {
        let matches = size >> (r + 1);
        tree.winners
            .push(empty_round(name(rounds, r), r as u32, matches));
        if r > 0 {
            for p in 0..matches as u32 {
                for slot in 0..2u32 {
                    tree.add_feed(
                        MatchRef::winners(r as u32 - 1, 2 * p + slot),
                        Outcome::Winner,
                        MatchRef::winners(r as u32, p),
                        slot as usize,
                    );
                }
            }
        }
    }
}

/// Single elimination skeleton, optionally with a third-place match fed by the semifinal losers.
pub fn single_elimination_tree(count: usize, third_place: bool) -> EliminationTree {
    let mut tree = EliminationTree::default();
    lay_winners_rounds(&mut tree, count, elimination_round_name);
    let rounds = tree.winners.len() as u32;
    if third_place && rounds >= 2 {
        let mut m = Match::new(0, 0);
        m.group_name = Some("Third Place".to_string());
        tree.third_place = Some(m);
        for slot in 0..2u32 {
            tree.add_feed(
                MatchRef::winners(rounds - 2, slot),
                Outcome::Loser,
                MatchRef::single(Section::ThirdPlace),
                slot as usize,
            );
        }
    }
    tree
}

/// Double elimination skeleton.
///
/// With `k` winners rounds (0-based) the losers bracket has `2k - 2` rounds:
/// - `L0`: losers of winners round 0, two per match.
/// - `L(2j-1)` for `j >= 1`: winner of `L(2j-2)` (slot 0) against the loser of winners round `j`
///   (slot 1). Drop-in positions are reversed on odd `j` so early rematches are pushed back.
/// - `L(2j)` for `1 <= j < k-1`: winners of `L(2j-1)` paired up.
///
/// Grand finals: winners-final winner (slot 0) against losers-final winner (slot 1). With two
/// participants there is no losers bracket and the winners-final loser goes straight to grand
/// finals.
pub fn double_elimination_tree(count: usize) -> EliminationTree {
    let mut tree = EliminationTree::default();
    lay_winners_rounds(&mut tree, count, |total, r| {
        if r + 1 == total {
            "Winners Final".to_string()
        } else {
            format!("Winners Round {}", r + 1)
        }
    });
    let k = tree.winners.len() as u32;
    let size = bracket_size(count);
    let grand_finals = MatchRef::single(Section::GrandFinals);
    tree.grand_finals = Some(Match::new(0, 0));
    tree.add_feed(MatchRef::winners(k - 1, 0), Outcome::Winner, grand_finals, 0);

    if k == 1 {
        tree.add_feed(MatchRef::winners(0, 0), Outcome::Loser, grand_finals, 1);
        return tree;
    }

    let losers_rounds = 2 * k - 2;
    let losers_name = |r: u32| {
        if r + 1 == losers_rounds {
            "Losers Final".to_string()
        } else {
            format!("Losers Round {}", r + 1)
        }
    };

    let first = size >> 2;
    tree.losers.push(empty_round(losers_name(0), 0, first));
    for p in 0..first as u32 {
        for slot in 0..2u32 {
            tree.add_feed(
                MatchRef::winners(0, 2 * p + slot),
                Outcome::Loser,
                MatchRef::losers(0, p),
                slot as usize,
            );
        }
    }

    for j in 1..k {
        let drop_in = 2 * j - 1;
        let matches = size >> (j + 1);
        tree.losers
            .push(empty_round(losers_name(drop_in), drop_in, matches));
        for p in 0..matches as u32 {
            let from = if j % 2 == 1 {
                matches as u32 - 1 - p
            } else {
                p
            };
            tree.add_feed(
                MatchRef::losers(drop_in - 1, p),
                Outcome::Winner,
                MatchRef::losers(drop_in, p),
                0,
            );
            tree.add_feed(
                MatchRef::winners(j, from),
                Outcome::Loser,
                MatchRef::losers(drop_in, p),
                1,
            );
        }

        if j < k - 1 {
            let consolidation = 2 * j;
            let matches = size >> (j + 2);
            tree.losers
                .push(empty_round(losers_name(consolidation), consolidation, matches));
            for p in 0..matches as u32 {
                for slot in 0..2u32 {
                    tree.add_feed(
                        MatchRef::losers(drop_in, 2 * p + slot),
                        Outcome::Winner,
                        MatchRef::losers(consolidation, p),
                        slot as usize,
                    );
                }
            }
        }
    }

    tree.add_feed(
        MatchRef::losers(losers_rounds - 1, 0),
        Outcome::Winner,
        grand_finals,
        1,
    );
    tree
}

/// Number of round robin groups: ceil(count / group_size).
pub fn group_count(count: usize, group_size: usize) -> usize {
    count.div_ceil(group_size.max(2)).max(1)
}

/// Distribute an ordered list over `groups` in snake order (sizes differ by at most one).
pub fn snake_groups(order: &[ParticipantId], groups: usize) -> Vec<Vec<ParticipantId>> {
    let groups = groups.max(1);
    let mut out = vec![Vec::new(); groups];
    for (i, id) in order.iter().enumerate() {
        let row = i / groups;
        let col = i % groups;
        let g = if row % 2 == 0 { col } else { groups - 1 - col };
        out[g].push(*id);
    }
    out
}

/// Label for the i-th group: A, B, C, ...
pub fn group_label(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        format!("G{}", index + 1)
    }
}

/// All-pairs schedule by the circle method: one entry per round, nobody plays twice in a round.
/// `m` members give `m(m-1)/2` pairings.
pub fn circle_schedule(members: &[ParticipantId]) -> Vec<Vec<(ParticipantId, ParticipantId)>> {
    let mut ring: Vec<Option<ParticipantId>> = members.iter().copied().map(Some).collect();
    if ring.len() % 2 == 1 {
        ring.push(None);
    }
    let n = ring.len();
    if n < 2 {
        return Vec::new();
    }
    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let pairs: Vec<_> = (0..n / 2)
            .filter_map(|i| match (ring[i], ring[n - 1 - i]) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            })
            .collect();
        if !pairs.is_empty() {
            rounds.push(pairs);
        }
        ring[1..].rotate_right(1);
    }
    rounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn round_count_is_ceil_log2() {
        assert_eq!(round_count(2), 1);
        assert_eq!(round_count(3), 2);
        assert_eq!(round_count(4), 2);
        assert_eq!(round_count(5), 3);
        assert_eq!(round_count(16), 4);
        assert_eq!(round_count(17), 5);
    }

    #[test]
    fn circle_schedule_covers_every_pair_once() {
        for m in 2..=9 {
            let members = ids(m);
            let schedule = circle_schedule(&members);
            let mut seen = HashSet::new();
            for round in &schedule {
                let mut in_round = HashSet::new();
                for &(a, b) in round {
                    assert!(in_round.insert(a) && in_round.insert(b));
                    let key = if a < b { (a, b) } else { (b, a) };
                    assert!(seen.insert(key));
                }
            }
            assert_eq!(seen.len(), m * (m - 1) / 2);
        }
    }

    #[test]
    fn snake_groups_are_balanced() {
        let groups = snake_groups(&ids(10), group_count(10, 4));
        let sizes: Vec<_> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
    }

    #[test]
    fn double_elimination_losers_bracket_shape() {
        let tree = double_elimination_tree(8);
        let sizes: Vec<_> = tree.losers.iter().map(|r| r.matches.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1, 1]);
        assert_eq!(tree.losers.last().unwrap().name, "Losers Final");

        let tree = double_elimination_tree(2);
        assert!(tree.losers.is_empty());
        assert!(tree.grand_finals.is_some());
    }
}
