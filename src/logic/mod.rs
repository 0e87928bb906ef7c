//! Bracket logic: builders, seeding, the four engines and the tournament lifecycle.

pub mod builder;
pub mod double_elimination;
pub mod engine;
mod persistence;
pub mod prizes;
pub mod records;
mod results;
pub mod round_robin;
pub mod seeding;
mod setup;
pub mod single_elimination;
pub mod standings;
pub mod swiss;
pub mod tree;

pub use engine::BracketEngine;
pub use persistence::{bracket_payload, load_bracket, save_bracket};
pub use records::{BracketRecord, MatchRecord, MemorySink, PersistenceSink, Saveable, WinnerRecord};
pub use results::{
    clear_match_result, declare_winners, edit_match_result, generate_tiebreaker, next_swiss_round,
    record_match_result, set_match_winner, tournament_standings, winners,
};
pub use round_robin::{RankingStatus, TiebreakStage};
pub use seeding::SeedingIssue;
pub use setup::{generate_bracket, generate_bracket_with_rng};
