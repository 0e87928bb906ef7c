//! Setup phase: build and seed the bracket (transition from Setup to InProgress).

use crate::logic::engine::BracketEngine;
use crate::logic::seeding::SeedingIssue;
use crate::models::{BracketError, SeedingStrategy, Tournament, TournamentState};
use rand::Rng;

/// Generate the bracket with a fresh random source.
pub fn generate_bracket(
    tournament: &mut Tournament,
    strategy: SeedingStrategy,
) -> Result<Vec<SeedingIssue>, BracketError> {
    generate_bracket_with_rng(tournament, strategy, &mut rand::thread_rng())
}

/// Build the skeleton for the tournament's format and seed it. Generating twice is a no-op.
pub fn generate_bracket_with_rng<R: Rng + ?Sized>(
    tournament: &mut Tournament,
    strategy: SeedingStrategy,
    rng: &mut R,
) -> Result<Vec<SeedingIssue>, BracketError> {
    if tournament.bracket.is_some() {
        log::debug!("Tournament {} already has a bracket", tournament.id);
        return Ok(Vec::new());
    }
    if tournament.state != TournamentState::Setup {
        return Err(BracketError::InvalidState);
    }
    let mut bracket =
        BracketEngine::build(tournament.format, tournament.participants.len(), &tournament.config)?;
    let issues = bracket.seed(&mut tournament.participants, strategy, rng)?;
    tournament.bracket = Some(bracket);
    tournament.state = TournamentState::InProgress;
    tournament.touch();
    log::info!(
        "Tournament {} started: {:?} with {} participants ({:?} seeding)",
        tournament.id,
        tournament.format,
        tournament.participants.len(),
        strategy
    );
    Ok(issues)
}
