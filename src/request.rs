//! Shape of an incoming "start a match / tournament" request and its validation.
//!
//! These bounds are looser than the bracket's own roster rules: a request may name any port,
//! [`bracket::validate`](crate::bracket::validate) narrows it down afterwards.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    coordinator::{TournamentOptions, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS},
    error::ValidationError,
    player::Player,
};

pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRequest {
    #[serde(default)]
    pub player1: Option<Player>,
    #[serde(default)]
    pub player2: Option<Player>,
    #[serde(default)]
    pub players: Vec<Player>,
    pub timeout_ms: Option<u64>,
    pub board_size: Option<usize>,
    pub no_tie: Option<bool>,
    /// Pause between rounds, in milliseconds.
    pub speed: Option<u64>,
}

impl TournamentRequest {
    /// `players` when given, otherwise the `player1`/`player2` pair.
    pub fn entrants(&self) -> Vec<Player> {
        if !self.players.is_empty() {
            return self.players.clone();
        }
        self.player1
            .iter()
            .chain(self.player2.iter())
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<TournamentOptions, ValidationError> {
        for player in self.entrants() {
            if player.name.chars().count() > MAX_NAME_LEN {
                return Err(ValidationError::NameTooLong {
                    name: player.name,
                    max: MAX_NAME_LEN,
                });
            }
            if player.port == Some(0) {
                return Err(ValidationError::InvalidPort {
                    name: player.name,
                    port: Some(0),
                    min: 1,
                    max: u16::MAX,
                });
            }
        }

        let defaults = TournamentOptions::default();
        let timeout_ms = self.timeout_ms.unwrap_or(defaults.timeout_ms);
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
            return Err(ValidationError::TimeoutOutOfRange(timeout_ms));
        }

        let options = TournamentOptions {
            timeout_ms,
            board_size: self.board_size.unwrap_or(defaults.board_size),
            no_tie: self.no_tie.unwrap_or(defaults.no_tie),
            round_delay: self.speed.filter(|&ms| ms > 0).map(Duration::from_millis),
            ..defaults
        };
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(value: serde_json::Value) -> TournamentRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn pair_requests_expand_to_two_entrants() {
        let req = request(json!({
            "player1": {"name": "A", "port": 3001},
            "player2": {"name": "B", "port": 3002},
        }));
        assert_eq!(req.entrants().len(), 2);
        assert_eq!(req.validate().unwrap(), TournamentOptions::default());
    }

    #[test]
    fn options_are_carried_over() {
        let req = request(json!({
            "players": [{"name": "A", "port": 3001}],
            "timeoutMs": 1000,
            "boardSize": 5,
            "noTie": true,
            "speed": 200,
        }));
        let options = req.validate().unwrap();
        assert_eq!(options.timeout_ms, 1000);
        assert_eq!(options.board_size, 5);
        assert!(options.no_tie);
        assert_eq!(options.round_delay, Some(Duration::from_millis(200)));
    }

    #[test]
    fn bounds_are_enforced() {
        let long_name = "x".repeat(51);
        let req = request(json!({"players": [{"name": long_name, "port": 3001}]}));
        assert!(matches!(req.validate(), Err(ValidationError::NameTooLong { .. })));

        let req = request(json!({"players": [{"name": "A", "port": 0}]}));
        assert!(matches!(req.validate(), Err(ValidationError::InvalidPort { .. })));

        let req = request(json!({"players": [], "timeoutMs": 99}));
        assert_eq!(req.validate(), Err(ValidationError::TimeoutOutOfRange(99)));

        let req = request(json!({"players": [], "timeoutMs": 30000}));
        assert!(req.validate().is_ok());
    }
}
