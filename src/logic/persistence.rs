//! Saving to and loading from the persistence API's flat bracket shape.

use crate::logic::engine::BracketEngine;
use crate::logic::prizes::prize_distribution;
use crate::logic::records::{BracketRecord, PersistenceSink, Saveable};
use crate::models::{BracketError, Tournament, TournamentState};

/// Payload for `POST /bracket`. Completed tournaments carry their prize records.
pub fn bracket_payload(tournament: &Tournament, prize_pool: u64) -> Result<BracketRecord, BracketError> {
    let bracket = tournament.bracket.as_ref().ok_or(BracketError::InvalidState)?;
    let mut record = bracket.serialize();
    if tournament.state == TournamentState::Completed {
        record.winners = Some(prize_distribution(
            prize_pool,
            bracket.placements(),
            &tournament.participants,
        ));
    }
    Ok(record)
}

/// Hand the bracket to `sink`. On failure nothing in memory changes, so the save can be retried.
pub fn save_bracket<S: PersistenceSink + ?Sized>(
    tournament: &Tournament,
    sink: &mut S,
    prize_pool: u64,
) -> Result<BracketRecord, BracketError> {
    let record = bracket_payload(tournament, prize_pool)?;
    sink.persist(tournament.id, &record).map_err(|e| {
        log::error!("Saving bracket of tournament {} failed: {}", tournament.id, e);
        BracketError::PersistenceFailure(e)
    })?;
    log::info!("Saved bracket of tournament {}", tournament.id);
    Ok(record)
}

/// Rebuild the bracket from a persisted record (Setup only). The tournament resumes
/// in progress, or completed if the record was saved with its winners.
pub fn load_bracket(tournament: &mut Tournament, record: &BracketRecord) -> Result<(), BracketError> {
    if tournament.state != TournamentState::Setup {
        return Err(BracketError::InvalidState);
    }
    let bracket = BracketEngine::from_record(
        tournament.format,
        &mut tournament.participants,
        &tournament.config,
        record,
    )?;
    let completed = record.winners.is_some()
        && record.tournament_winner_id.is_some()
        && bracket.placements().winner == record.tournament_winner_id;
    tournament.state = if completed {
        TournamentState::Completed
    } else {
        TournamentState::InProgress
    };
    tournament.bracket = Some(bracket);
    tournament.touch();
    log::info!(
        "Loaded {:?} bracket for tournament {} ({:?})",
        tournament.format,
        tournament.id,
        tournament.state
    );
    Ok(())
}
