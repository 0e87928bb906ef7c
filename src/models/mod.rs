//! Data structures for brackets: participants, matches, standings, tournament state.

mod game;
mod participant;
mod standing;
mod tournament;

pub use game::{Match, MatchId, MatchResult, Round};
pub use participant::{Participant, ParticipantId};
pub use standing::{Placements, Standing};
pub use tournament::{
    BracketError, Format, SeedingStrategy, Tournament, TournamentId, TournamentState,
};
