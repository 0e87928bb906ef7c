//! In-progress phase: results, swiss rounds, tiebreakers and the final podium.

use crate::logic::engine::BracketEngine;
use crate::logic::prizes::prize_distribution;
use crate::logic::records::WinnerRecord;
use crate::logic::round_robin::TiebreakStage;
use crate::logic::swiss::SwissRound;
use crate::models::{
    BracketError, MatchId, MatchResult, ParticipantId, Placements, Standing, Tournament,
    TournamentState,
};

/// The bracket of a tournament that is being played.
fn bracket_in_progress(tournament: &mut Tournament) -> Result<&mut BracketEngine, BracketError> {
    if tournament.state != TournamentState::InProgress {
        return Err(BracketError::InvalidState);
    }
    tournament.bracket.as_mut().ok_or(BracketError::InvalidState)
}

/// Record a result. A second submission for the same match is refused.
pub fn record_match_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    result: MatchResult,
) -> Result<(), BracketError> {
    bracket_in_progress(tournament)?.record_result(match_id, result)?;
    tournament.touch();
    Ok(())
}

/// Record "`winner` won `match_id`".
pub fn set_match_winner(
    tournament: &mut Tournament,
    match_id: MatchId,
    winner: ParticipantId,
) -> Result<(), BracketError> {
    let bracket = bracket_in_progress(tournament)?;
    let result = bracket
        .find_match(match_id)
        .ok_or(BracketError::MatchNotFound(match_id))?
        .result_for_winner(winner)
        .ok_or(BracketError::ParticipantNotFound(winner))?;
    bracket.record_result(match_id, result)?;
    tournament.touch();
    Ok(())
}

pub fn edit_match_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    result: MatchResult,
) -> Result<(), BracketError> {
    bracket_in_progress(tournament)?.edit_result(match_id, result)?;
    tournament.touch();
    Ok(())
}

pub fn clear_match_result(tournament: &mut Tournament, match_id: MatchId) -> Result<(), BracketError> {
    bracket_in_progress(tournament)?.clear_result(match_id)?;
    tournament.touch();
    Ok(())
}

/// Swiss only: pair the next round once the current one is complete.
pub fn next_swiss_round(tournament: &mut Tournament) -> Result<SwissRound, BracketError> {
    let round = bracket_in_progress(tournament)?.pair_next_round()?.clone();
    tournament.touch();
    Ok(round)
}

/// Round robin only: generate the mini round robin for the first open tie.
pub fn generate_tiebreaker(tournament: &mut Tournament) -> Result<Option<TiebreakStage>, BracketError> {
    let stage = bracket_in_progress(tournament)?.generate_tiebreaker()?;
    tournament.touch();
    Ok(stage)
}

/// Fix the podium and complete the tournament.
pub fn declare_winners(tournament: &mut Tournament) -> Result<Placements, BracketError> {
    let placements = bracket_in_progress(tournament)?.declare_winners()?;
    tournament.state = TournamentState::Completed;
    tournament.touch();
    log::info!("Tournament {} completed: {:?}", tournament.id, placements);
    Ok(placements)
}

/// Current table; empty before the bracket exists.
pub fn tournament_standings(tournament: &Tournament) -> Vec<Standing> {
    let ids: Vec<ParticipantId> = tournament.participants.iter().map(|p| p.id).collect();
    tournament
        .bracket
        .as_ref()
        .map(|b| b.standings(&ids, &tournament.config))
        .unwrap_or_default()
}

/// Prize records for a completed tournament.
pub fn winners(tournament: &Tournament, prize_pool: u64) -> Result<Vec<WinnerRecord>, BracketError> {
    if tournament.state != TournamentState::Completed {
        return Err(BracketError::InvalidState);
    }
    let bracket = tournament.bracket.as_ref().ok_or(BracketError::InvalidState)?;
    Ok(prize_distribution(
        prize_pool,
        bracket.placements(),
        &tournament.participants,
    ))
}
