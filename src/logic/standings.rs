//! Standings: tally a match list and rank it with deterministic tie rules.

use crate::config::PointsTable;
use crate::models::{Match, MatchResult, ParticipantId, Standing};
use std::collections::{HashMap, HashSet};

/// Tally decided, contested matches for `members` (table keeps the members' order).
/// Matches against non-members still count for the member side.
pub fn tally<'a>(
    members: &[ParticipantId],
    matches: impl IntoIterator<Item = &'a Match>,
    points: &PointsTable,
) -> Vec<Standing> {
    let mut table: Vec<Standing> = members.iter().map(|&id| Standing::new(id)).collect();
    let index: HashMap<ParticipantId, usize> =
        members.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    for m in matches {
        let (Some(result), [Some(first), Some(second)]) = (m.result, m.slots) else {
            continue;
        };
        if m.walkover {
            continue;
        }
        let outcomes = match result {
            MatchResult::Player1 => [(first, Outcome::Win), (second, Outcome::Loss)],
            MatchResult::Player2 => [(first, Outcome::Loss), (second, Outcome::Win)],
            MatchResult::Draw => [(first, Outcome::Draw), (second, Outcome::Draw)],
        };
        for (id, outcome) in outcomes {
            if let Some(&i) = index.get(&id) {
                let row = &mut table[i];
                row.played += 1;
                match outcome {
                    Outcome::Win => {
                        row.wins += 1;
                        row.points += points.win;
                    }
                    Outcome::Draw => {
                        row.draws += 1;
                        row.points += points.draw;
                    }
                    Outcome::Loss => {
                        row.losses += 1;
                        row.points += points.loss;
                    }
                }
            }
        }
    }
    table
}

#[derive(Clone, Copy)]
enum Outcome {
    Win,
    Draw,
    Loss,
}

/// Points each member of `block` earned in games between members of `block`.
pub fn head_to_head_points<'a>(
    block: &[ParticipantId],
    matches: impl IntoIterator<Item = &'a Match>,
    points: &PointsTable,
) -> HashMap<ParticipantId, u32> {
    let set: HashSet<ParticipantId> = block.iter().copied().collect();
    let between = matches.into_iter().filter(|m| {
        m.slots
            .iter()
            .all(|s| s.is_some_and(|id| set.contains(&id)))
    });
    tally(block, between, points)
        .into_iter()
        .map(|row| (row.participant_id, row.points))
        .collect()
}

/// Rank a table: points desc, wins desc, head-to-head among the tied block, played desc.
/// Anything still level keeps its incoming order.
pub fn rank(mut table: Vec<Standing>, matches: &[&Match], points: &PointsTable) -> Vec<Standing> {
    table.sort_by(|a, b| b.points.cmp(&a.points).then(b.wins.cmp(&a.wins)));
    let mut start = 0;
    while start < table.len() {
        let mut end = start + 1;
        while end < table.len()
            && table[end].points == table[start].points
            && table[end].wins == table[start].wins
        {
            end += 1;
        }
        if end - start > 1 {
            let block: Vec<ParticipantId> =
                table[start..end].iter().map(|r| r.participant_id).collect();
            let h2h = head_to_head_points(&block, matches.iter().copied(), points);
            table[start..end].sort_by(|a, b| {
                let ha = h2h.get(&a.participant_id).copied().unwrap_or(0);
                let hb = h2h.get(&b.participant_id).copied().unwrap_or(0);
                hb.cmp(&ha).then(b.played.cmp(&a.played))
            });
        }
        start = end;
    }
    table
}

/// Tally then rank in one go.
pub fn standings<'a>(
    members: &[ParticipantId],
    matches: impl IntoIterator<Item = &'a Match>,
    points: &PointsTable,
) -> Vec<Standing> {
    let matches: Vec<&Match> = matches.into_iter().collect();
    let table = tally(members, matches.iter().copied(), points);
    rank(table, &matches, points)
}
