//! Esports bracket engine: library with models, bracket logic and roster import.

pub mod config;
pub mod logic;
pub mod models;
pub mod roster;

pub use config::{BracketConfig, PointsTable, ServerConfig};
pub use logic::{
    bracket_payload, clear_match_result, declare_winners, edit_match_result, generate_bracket,
    generate_bracket_with_rng, generate_tiebreaker, load_bracket, next_swiss_round,
    record_match_result, save_bracket, set_match_winner, tournament_standings, winners,
    BracketEngine, BracketRecord, MatchRecord, MemorySink, PersistenceSink, RankingStatus,
    Saveable, SeedingIssue, TiebreakStage, WinnerRecord,
};
pub use models::{
    BracketError, Format, Match, MatchId, MatchResult, Participant, ParticipantId, Placements,
    Round, SeedingStrategy, Standing, Tournament, TournamentId, TournamentState,
};
pub use roster::{import_roster, read_roster};
