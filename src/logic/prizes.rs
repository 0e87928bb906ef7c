//! Prize money for the podium: 50% / 30% / 20% of the pool.

use crate::logic::records::WinnerRecord;
use crate::models::{Participant, Placements};

/// Percentage of the pool for 1st, 2nd and 3rd place.
pub const PRIZE_SPLIT: [u64; 3] = [50, 30, 20];

/// Share of `pool` (minor currency units) for each place. Rounding leftovers go to first place.
pub fn prize_shares(pool: u64) -> [u64; 3] {
    // same as pool * pct / 100 without overflowing
    let mut shares = PRIZE_SPLIT.map(|pct| pool / 100 * pct + pool % 100 * pct / 100);
    let paid: u64 = shares.iter().sum();
    shares[0] += pool - paid;
    shares
}

/// One record per filled podium place. Unfilled places are not paid and not redistributed.
pub fn prize_distribution(
    pool: u64,
    placements: &Placements,
    participants: &[Participant],
) -> Vec<WinnerRecord> {
    let shares = prize_shares(pool);
    placements
        .podium()
        .into_iter()
        .map(|(position, id)| {
            let is_team = participants
                .iter()
                .find(|p| p.id == id)
                .is_some_and(|p| p.is_team);
            WinnerRecord {
                user_id: (!is_team).then_some(id),
                team_id: is_team.then_some(id),
                position,
                prize_money: shares[usize::from(position) - 1],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_first_place() {
        assert_eq!(prize_shares(1000), [500, 300, 200]);
        assert_eq!(prize_shares(101), [51, 30, 20]);
        assert_eq!(prize_shares(0), [0, 0, 0]);
    }

    #[test]
    fn largest_pool_is_split_without_overflow() {
        let shares = prize_shares(u64::MAX);
        assert_eq!(shares[1], u64::MAX / 100 * 30 + u64::MAX % 100 * 30 / 100);
        assert_eq!(shares[2], u64::MAX / 100 * 20 + u64::MAX % 100 * 20 / 100);
        assert_eq!(shares.iter().map(|&s| u128::from(s)).sum::<u128>(), u128::from(u64::MAX));
        assert!(shares[0] > shares[1] && shares[1] > shares[2]);
    }

    #[test]
    fn teams_are_paid_by_team_id() {
        let solo = Participant::new("Solo");
        let squad = Participant::team("Squad");
        let placements = Placements {
            winner: Some(squad.id),
            runner_up: Some(solo.id),
            third_place: None,
        };
        let records = prize_distribution(1000, &placements, &[solo.clone(), squad.clone()]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].team_id, Some(squad.id));
        assert_eq!(records[0].user_id, None);
        assert_eq!(records[0].prize_money, 500);
        assert_eq!(records[1].user_id, Some(solo.id));
        assert_eq!(records[1].position, 2);
        assert_eq!(records[1].prize_money, 300);
    }
}
