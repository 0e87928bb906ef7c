//! Integration tests for saving to and loading from the persistence API shape.

use bracket_engine::logic::tree::Section;
use bracket_engine::{
    declare_winners, generate_bracket_with_rng, generate_tiebreaker, load_bracket,
    record_match_result, save_bracket, set_match_winner, winners, BracketConfig, BracketEngine,
    BracketError, BracketRecord, Format, MatchResult, MemorySink, ParticipantId, PersistenceSink,
    RankingStatus, Saveable, SeedingStrategy, Tournament, TournamentId, TournamentState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn started(format: Format, names: &[&str]) -> Tournament {
    let mut t = Tournament::new("Saved", format, BracketConfig::default());
    for name in names {
        t.add_participant(*name).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(21);
    generate_bracket_with_rng(&mut t, SeedingStrategy::Registration, &mut rng).unwrap();
    t
}

fn id(t: &Tournament, name: &str) -> ParticipantId {
    t.participants.iter().find(|p| p.name == name).unwrap().id
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

/// Same roster and options, back in Setup without a bracket.
fn fresh_copy(t: &Tournament) -> Tournament {
    let mut copy = t.clone();
    copy.restart_tournament().unwrap();
    copy
}

fn saved(t: &Tournament, prize_pool: u64) -> BracketRecord {
    let mut sink = MemorySink::default();
    save_bracket(t, &mut sink, prize_pool).unwrap();
    sink.saved.remove(&t.id).unwrap()
}

/// Fails the first `failures` saves, then keeps records in memory.
struct FlakySink {
    failures: usize,
    inner: MemorySink,
}

impl PersistenceSink for FlakySink {
    fn persist(&mut self, tournament_id: TournamentId, record: &BracketRecord) -> Result<(), String> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err("503 Service Unavailable".to_string());
        }
        self.inner.persist(tournament_id, record)
    }
}

#[test]
fn single_elimination_resumes_where_it_was_saved() {
    let mut t = started(Format::SingleElimination, &["A", "B", "C", "D"]);
    beat(&mut t, "A", "B");
    let record = saved(&t, 0);

    let mut loaded = fresh_copy(&t);
    load_bracket(&mut loaded, &record).unwrap();
    assert_eq!(loaded.state, TournamentState::InProgress);

    let shape = |t: &Tournament| -> Vec<_> {
        t.bracket
            .as_ref()
            .unwrap()
            .matches()
            .into_iter()
            .map(|m| (m.id, m.slots, m.result))
            .collect()
    };
    assert_eq!(shape(&loaded), shape(&t));
    assert!(loaded.participants.iter().all(|p| p.is_placed));

    beat(&mut loaded, "C", "D");
    beat(&mut loaded, "A", "C");
    assert_eq!(declare_winners(&mut loaded).unwrap().winner, Some(id(&t, "A")));
}

#[test]
fn double_elimination_reopens_a_missing_reset() {
    let mut t = started(Format::DoubleElimination, &["A", "B", "C", "D"]);
    beat(&mut t, "A", "B");
    beat(&mut t, "C", "D");
    beat(&mut t, "A", "C");
    beat(&mut t, "B", "D");
    beat(&mut t, "C", "B");
    beat(&mut t, "C", "A");

    let mut record = saved(&t, 0);
    let matches = record.matches.as_mut().unwrap();
    assert!(matches.iter().any(|m| m.bracket == Some(Section::Reset)));
    matches.retain(|m| m.bracket != Some(Section::Reset));

    let mut loaded = fresh_copy(&t);
    load_bracket(&mut loaded, &record).unwrap();
    let reset = match loaded.bracket.as_ref().unwrap() {
        BracketEngine::DoubleElimination(b) => b.tree.reset_match.clone().unwrap(),
        _ => unreachable!(),
    };
    assert_eq!(reset.slots, [Some(id(&t, "A")), Some(id(&t, "C"))]);
    assert!(reset.result.is_none());

    record_match_result(&mut loaded, reset.id, MatchResult::Player1).unwrap();
    assert_eq!(declare_winners(&mut loaded).unwrap().winner, Some(id(&t, "A")));
}

#[test]
fn round_robin_keeps_groups_and_open_tiebreakers() {
    let mut t = started(Format::RoundRobin, &["A", "B", "C"]);
    beat(&mut t, "A", "B");
    beat(&mut t, "B", "C");
    beat(&mut t, "C", "A");
    generate_tiebreaker(&mut t).unwrap();
    let record = saved(&t, 0);
    assert!(record
        .matches
        .as_ref()
        .unwrap()
        .iter()
        .any(|m| m.is_tiebreaker && m.group_name.as_deref() == Some("First place tiebreaker")));

    let mut loaded = fresh_copy(&t);
    load_bracket(&mut loaded, &record).unwrap();
    let rr = match loaded.bracket.as_ref().unwrap() {
        BracketEngine::RoundRobin(b) => b,
        _ => unreachable!(),
    };
    assert_eq!(rr.groups.len(), 1);
    assert_eq!(rr.groups[0].members.len(), 3);
    assert_eq!(rr.matches.len(), 3);
    assert_eq!(rr.tiebreaker_matches.len(), 3);
    assert!(matches!(
        rr.evaluate_rankings().unwrap(),
        RankingStatus::TiebreakerPending { position: 1, .. }
    ));
}

#[test]
fn swiss_scores_are_replayed_from_the_rounds() {
    let mut t = started(Format::Swiss, &["A", "B", "C", "D", "E"]);
    beat(&mut t, "A", "B");
    beat(&mut t, "C", "D");
    let record = saved(&t, 0);
    assert!(record.matches.is_none());
    let rounds = record.rounds.as_ref().unwrap();
    assert_eq!(rounds.len(), 1);
    assert!(rounds[0].matches.iter().any(|m| m.is_bye));

    let mut loaded = fresh_copy(&t);
    load_bracket(&mut loaded, &record).unwrap();
    let (before, after) = match (t.bracket.as_ref(), loaded.bracket.as_ref()) {
        (Some(BracketEngine::Swiss(a)), Some(BracketEngine::Swiss(b))) => (a, b),
        _ => unreachable!(),
    };
    assert_eq!(after.scores, before.scores);
    assert_eq!(after.order, before.order);
    assert_eq!(after.rounds, before.rounds);
}

#[test]
fn failed_save_can_be_retried() {
    let mut t = started(Format::SingleElimination, &["A", "B"]);
    beat(&mut t, "A", "B");
    let mut sink = FlakySink {
        failures: 1,
        inner: MemorySink::default(),
    };

    let err = save_bracket(&t, &mut sink, 100).unwrap_err();
    assert!(matches!(err, BracketError::PersistenceFailure(ref msg) if msg.contains("503")));
    assert_eq!(t.state, TournamentState::InProgress);
    assert!(sink.inner.saved.is_empty());

    save_bracket(&t, &mut sink, 100).unwrap();
    assert!(sink.inner.saved.contains_key(&t.id));
}

#[test]
fn records_use_the_api_field_names() {
    let mut t = started(Format::SingleElimination, &["A", "B"]);
    beat(&mut t, "A", "B");
    declare_winners(&mut t).unwrap();
    let json = serde_json::to_value(saved(&t, 1000)).unwrap();

    assert_eq!(json["tournamentWinnerId"], id(&t, "A").to_string());
    let m = &json["matches"][0];
    assert_eq!(m["bracket"], "winners");
    assert_eq!(m["player1Id"], id(&t, "A").to_string());
    assert_eq!(m["winnerId"], id(&t, "A").to_string());
    assert_eq!(m["score"], "1-0");
    assert_eq!(m["isBye"], false);
    assert_eq!(json["winners"][0]["userId"], id(&t, "A").to_string());
    assert_eq!(json["winners"][0]["prizeMoney"], 500);
    assert!(json.get("rounds").is_none());
}

#[test]
fn completed_tournament_loads_as_completed() {
    let mut t = started(Format::SingleElimination, &["A", "B"]);
    beat(&mut t, "A", "B");
    declare_winners(&mut t).unwrap();
    let record = saved(&t, 1000);

    let mut loaded = fresh_copy(&t);
    load_bracket(&mut loaded, &record).unwrap();
    assert_eq!(loaded.state, TournamentState::Completed);
    assert_eq!(Some(winners(&loaded, 1000).unwrap()), record.winners);

    // the same record without prize records only resumes the bracket
    let mut unpaid = record.clone();
    unpaid.winners = None;
    let mut resumed = fresh_copy(&t);
    load_bracket(&mut resumed, &unpaid).unwrap();
    assert_eq!(resumed.state, TournamentState::InProgress);
}

#[test]
fn foreign_or_inconsistent_records_are_rejected() {
    let t = started(Format::SingleElimination, &["A", "B", "C", "D"]);
    let record = saved(&t, 0);

    let stranger = uuid::Uuid::new_v4();
    let mut foreign = record.clone();
    foreign.matches.as_mut().unwrap()[0].player1_id = Some(stranger);
    let mut target = fresh_copy(&t);
    assert_eq!(
        load_bracket(&mut target, &foreign),
        Err(BracketError::ParticipantNotFound(stranger))
    );
    assert_eq!(target.state, TournamentState::Setup);
    assert!(target.bracket.is_none());

    let mut wrong_winner = record.clone();
    wrong_winner.matches.as_mut().unwrap()[0].winner_id = Some(id(&t, "C"));
    assert!(matches!(
        load_bracket(&mut target, &wrong_winner),
        Err(BracketError::InvalidRecord(_))
    ));

    let mut off_grid = record.clone();
    off_grid.matches.as_mut().unwrap()[0].position = 9;
    assert!(matches!(
        load_bracket(&mut target, &off_grid),
        Err(BracketError::InvalidRecord(_))
    ));

    let mut running = t.clone();
    assert_eq!(load_bracket(&mut running, &record), Err(BracketError::InvalidState));
}

#[test]
fn engine_record_is_the_format_record() {
    let formats = [
        Format::SingleElimination,
        Format::DoubleElimination,
        Format::RoundRobin,
        Format::Swiss,
    ];
    for format in formats {
        let mut t = started(format, &["A", "B", "C", "D"]);
        beat(&mut t, "A", "B");
        let engine = t.bracket.as_ref().unwrap();
        let inner = match engine {
            BracketEngine::SingleElimination(b) => Saveable::serialize(b),
            BracketEngine::DoubleElimination(b) => Saveable::serialize(b),
            BracketEngine::RoundRobin(b) => Saveable::serialize(b),
            BracketEngine::Swiss(b) => Saveable::serialize(b),
        };
        assert_eq!(Saveable::serialize(engine), inner);
        assert_eq!(saved(&t, 0), inner);
    }
}
