//! Configuration: bracket options (per tournament) and the web host settings (from env).

use serde::{Deserialize, Serialize};

/// Competition points awarded per outcome (round robin and swiss).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsTable {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for PointsTable {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Per-tournament bracket options. Every field has a default so partial JSON bodies work.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketConfig {
    /// Round robin group size.
    pub group_size: usize,
    /// Single elimination: play a match between the two semifinal losers.
    pub third_place_match: bool,
    /// Swiss: planned number of rounds (defaults to ceil(log2 n)).
    pub swiss_rounds: Option<u32>,
    /// Minimum participants to build a bracket (never below 2).
    pub min_participants: usize,
    pub points: PointsTable,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            group_size: 4,
            third_place_match: false,
            swiss_rounds: None,
            min_participants: 2,
            points: PointsTable::default(),
        }
    }
}

impl BracketConfig {
    pub fn required_participants(&self) -> usize {
        self.min_participants.max(2)
    }

    /// Group size clamped to something that can hold a match.
    pub fn effective_group_size(&self) -> usize {
        self.group_size.max(2)
    }
}

/// Web host settings. Override with env: HOST, PORT, INACTIVITY_HOURS.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tournaments not touched for this many hours are dropped.
    pub inactivity_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            inactivity_hours: 12,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            inactivity_hours: lookup("INACTIVITY_HOURS")
                .and_then(|h| h.parse().ok())
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.inactivity_hours),
        }
    }
}
