//! Integration tests for double elimination: losers bracket drop-ins, grand finals and the reset.

use bracket_engine::logic::double_elimination::DoubleElimination;
use bracket_engine::logic::tree::{MatchRef, Outcome, Section};
use bracket_engine::{
    clear_match_result, declare_winners, edit_match_result, generate_bracket_with_rng,
    record_match_result, set_match_winner, BracketConfig, BracketEngine, BracketError, Format,
    MatchResult, Participant, ParticipantId, SeedingStrategy, Tournament, TournamentState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn started(names: &[&str]) -> Tournament {
    let mut t = Tournament::new("Major", Format::DoubleElimination, BracketConfig::default());
    for name in names {
        t.add_participant(*name).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(11);
    generate_bracket_with_rng(&mut t, SeedingStrategy::Registration, &mut rng).unwrap();
    t
}

fn id(t: &Tournament, name: &str) -> ParticipantId {
    t.participants.iter().find(|p| p.name == name).unwrap().id
}

fn bracket(t: &Tournament) -> &DoubleElimination {
    match t.bracket.as_ref().unwrap() {
        BracketEngine::DoubleElimination(b) => b,
        other => panic!("unexpected bracket {:?}", other.format()),
    }
}

fn beat(t: &mut Tournament, winner: &str, loser: &str) {
    let (w, l) = (id(t, winner), id(t, loser));
    let m = t
        .bracket
        .as_ref()
        .unwrap()
        .matches()
        .into_iter()
        .find(|m| m.contains(w) && m.contains(l) && !m.is_decided())
        .map(|m| m.id)
        .unwrap();
    set_match_winner(t, m, w).unwrap();
}

/// A, B, C, D down to grand finals: A from the winners side, C from the losers side.
fn to_grand_finals() -> Tournament {
    let mut t = started(&["A", "B", "C", "D"]);
    beat(&mut t, "A", "B");
    beat(&mut t, "C", "D");
    beat(&mut t, "A", "C");
    beat(&mut t, "B", "D");
    beat(&mut t, "C", "B");
    t
}

#[test]
fn bracket_names_and_shape() {
    let t = started(&["A", "B", "C", "D"]);
    let b = bracket(&t);
    assert_eq!(b.tree.winners.len(), 2);
    assert_eq!(b.tree.winners[1].name, "Winners Final");
    assert_eq!(b.tree.losers.len(), 2);
    assert_eq!(b.tree.losers[1].name, "Losers Final");
    assert!(b.tree.grand_finals.is_some());
    assert!(b.tree.reset_match.is_none());
}

#[test]
fn grand_finals_won_from_the_winners_side_ends_it() {
    let mut t = to_grand_finals();
    let gf = bracket(&t).tree.grand_finals.clone().unwrap();
    assert_eq!(gf.slots, [Some(id(&t, "A")), Some(id(&t, "C"))]);

    record_match_result(&mut t, gf.id, MatchResult::Player1).unwrap();
    assert!(bracket(&t).tree.reset_match.is_none());

    let placements = declare_winners(&mut t).unwrap();
    assert_eq!(placements.winner, Some(id(&t, "A")));
    assert_eq!(placements.runner_up, Some(id(&t, "C")));
    assert_eq!(placements.third_place, Some(id(&t, "B")));
}

#[test]
fn grand_finals_won_from_the_losers_side_forces_one_reset() {
    let mut t = to_grand_finals();
    let gf = bracket(&t).tree.grand_finals.clone().unwrap();
    record_match_result(&mut t, gf.id, MatchResult::Player2).unwrap();

    let reset = bracket(&t).tree.reset_match.clone().unwrap();
    assert_eq!(reset.slots, gf.slots);
    assert_eq!(bracket(&t).placements.winner, None);
    assert_eq!(declare_winners(&mut t), Err(BracketError::IncompleteResults));

    record_match_result(&mut t, reset.id, MatchResult::Player2).unwrap();
    let b = bracket(&t);
    assert_eq!(b.tree.reset_match.as_ref().map(|m| m.id), Some(reset.id));
    assert_eq!(b.placements.winner, Some(id(&t, "C")));
    assert_eq!(b.placements.runner_up, Some(id(&t, "A")));

    let open = b.tree.matches().filter(|(_, m)| m.is_full() && !m.is_decided()).count();
    assert_eq!(open, 0);
    declare_winners(&mut t).unwrap();
    assert_eq!(t.state, TournamentState::Completed);
}

#[test]
fn clearing_or_editing_grand_finals_drops_the_reset() {
    let mut t = to_grand_finals();
    let gf = bracket(&t).tree.grand_finals.clone().unwrap();
    record_match_result(&mut t, gf.id, MatchResult::Player2).unwrap();
    assert!(bracket(&t).tree.reset_match.is_some());

    clear_match_result(&mut t, gf.id).unwrap();
    assert!(bracket(&t).tree.reset_match.is_none());

    record_match_result(&mut t, gf.id, MatchResult::Player2).unwrap();
    edit_match_result(&mut t, gf.id, MatchResult::Player1).unwrap();
    let b = bracket(&t);
    assert!(b.tree.reset_match.is_none());
    assert_eq!(b.placements.winner, Some(id(&t, "A")));
}

#[test]
fn two_players_meet_again_in_grand_finals() {
    let mut t = started(&["A", "B"]);
    assert!(bracket(&t).tree.losers.is_empty());
    beat(&mut t, "A", "B");
    let gf = bracket(&t).tree.grand_finals.clone().unwrap();
    assert_eq!(gf.slots, [Some(id(&t, "A")), Some(id(&t, "B"))]);
}

#[test]
fn every_winners_loser_drops_into_exactly_one_losers_match() {
    for n in [4usize, 8, 16] {
        let mut participants: Vec<Participant> =
            (0..n).map(|i| Participant::new(format!("P{i}"))).collect();
        let mut b = DoubleElimination::build(n, &BracketConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(n as u64);
        b.seed(&mut participants, SeedingStrategy::Random, &mut rng).unwrap();

        for (r, round) in b.tree.winners.iter().enumerate() {
            for p in 0..round.matches.len() {
                let from = MatchRef::winners(r as u32, p as u32);
                let drops = b
                    .tree
                    .feeds()
                    .iter()
                    .filter(|f| f.from == from && f.outcome == Outcome::Loser)
                    .count();
                assert_eq!(drops, 1, "{n} participants, winners round {r} match {p}");
            }
        }

        // play everything out; each winners-bracket loser must show up in the losers bracket
        loop {
            let next = b
                .tree
                .matches()
                .find(|(_, m)| m.is_full() && !m.is_decided())
                .map(|(_, m)| m.id);
            match next {
                Some(match_id) => b.record_result(match_id, MatchResult::Player1).unwrap(),
                None => break,
            }
        }
        let winners_losers: Vec<ParticipantId> = b
            .tree
            .winners
            .iter()
            .flat_map(|r| r.matches.iter().filter_map(|m| m.loser()))
            .collect();
        assert_eq!(winners_losers.len(), n - 1);
        for loser in winners_losers {
            let landed = b
                .tree
                .feeds()
                .iter()
                .filter(|f| f.outcome == Outcome::Loser)
                .filter(|f| {
                    b.tree
                        .get(f.from)
                        .is_some_and(|m| m.loser() == Some(loser))
                })
                .filter(|f| {
                    f.to.section == Section::Losers
                        && b.tree.get(f.to).is_some_and(|m| m.slots[f.slot] == Some(loser))
                })
                .count();
            assert_eq!(landed, 1);
        }
        assert!(b.placements.is_complete());
        assert!(b.placements.third_place.is_some());
    }
}
