//! Config for tournament runs
//!
//! This module provides configuration options for controlling how tournaments are played.
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Flags are case-insensitive, set them to `"true"` to enable them.
//! Unparsable numbers fall back to the default.
//!
//! - `TOURNAMENT_VERBOSE` — Log to stdout (default: `true`)
//! - `TOURNAMENT_LOG` — Log to a timestamped file (default: `false`)
//! - `TOURNAMENT_TIMEOUT_MS` — Time a bot has to answer a move request (default: `3000`)
//! - `TOURNAMENT_BOARD_SIZE` — `3` or `5` (default: `3`)
//! - `TOURNAMENT_NO_TIE` — Sliding-window mode, boards never fill up (default: `false`)
//! - `TOURNAMENT_MAX_PARALLEL_MATCHES` — Matches of a round played at once (default: `1`)
//! - `TOURNAMENT_ROUND_DELAY_MS` — Pause between rounds (default: `0`)
//! - `TOURNAMENT_SEED` — Seed of the bracket shuffle (default: random)

use std::time::Duration;

use crate::{arbitrator::MatchOptions, coordinator::TournamentOptions, error::ValidationError};

/// Configuration of tournament runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) timeout_ms: u64,
    pub(crate) board_size: usize,
    pub(crate) no_tie: bool,
    pub(crate) max_parallel_matches: usize,
    pub(crate) round_delay_ms: u64,
    pub(crate) seed: Option<u64>,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Progress is logged to stdout, not to a file.
    /// - Bots have 3 seconds per move on a 3×3 board, draws allowed.
    /// - Matches of a round are played one after the other, without pause between rounds.
    /// - The bracket shuffle is seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
            timeout_ms: 3000,
            board_size: 3,
            no_tie: false,
            max_parallel_matches: 1,
            round_delay_ms: 0,
            seed: None,
        }
    }

    /// Create configuration from environment variables (see module documentation).
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_number<N: std::str::FromStr>(var: &str) -> Option<N> {
            std::env::var(var).ok()?.trim().parse().ok()
        }

        let defaults = Self::new();
        Self {
            verbose: get_env_flag("TOURNAMENT_VERBOSE", defaults.verbose),
            log: get_env_flag("TOURNAMENT_LOG", defaults.log),
            timeout_ms: get_env_number("TOURNAMENT_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            board_size: get_env_number("TOURNAMENT_BOARD_SIZE").unwrap_or(defaults.board_size),
            no_tie: get_env_flag("TOURNAMENT_NO_TIE", defaults.no_tie),
            max_parallel_matches: get_env_number("TOURNAMENT_MAX_PARALLEL_MATCHES")
                .unwrap_or(defaults.max_parallel_matches),
            round_delay_ms: get_env_number("TOURNAMENT_ROUND_DELAY_MS")
                .unwrap_or(defaults.round_delay_ms),
            seed: get_env_number("TOURNAMENT_SEED"),
        }
    }

    /// Enable or disable stdout logging.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Per-move timeout, in milliseconds.
    pub fn with_timeout_ms(mut self, value: u64) -> Self {
        self.timeout_ms = value;
        self
    }

    pub fn with_board_size(mut self, value: usize) -> Self {
        self.board_size = value;
        self
    }

    pub fn with_no_tie(mut self, value: bool) -> Self {
        self.no_tie = value;
        self
    }

    /// Matches of a round played at once. Values below 1 are treated as 1.
    pub fn with_max_parallel_matches(mut self, value: usize) -> Self {
        self.max_parallel_matches = value.max(1);
        self
    }

    pub fn with_round_delay_ms(mut self, value: u64) -> Self {
        self.round_delay_ms = value;
        self
    }

    pub fn with_seed(mut self, value: Option<u64>) -> Self {
        self.seed = value;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn log(&self) -> bool {
        self.log
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Options of a tournament run.
    ///
    /// # Errors
    ///
    /// When the timeout is outside `100..=30000` ms or the board size is neither 3 nor 5.
    pub fn tournament_options(&self) -> Result<TournamentOptions, ValidationError> {
        let options = TournamentOptions {
            timeout_ms: self.timeout_ms,
            no_tie: self.no_tie,
            board_size: self.board_size,
            max_parallel_matches: self.max_parallel_matches.max(1),
            round_delay: (self.round_delay_ms > 0)
                .then(|| Duration::from_millis(self.round_delay_ms)),
        };
        options.validate()?;
        Ok(options)
    }

    /// Options of a single match.
    pub fn match_options(&self) -> Result<MatchOptions, ValidationError> {
        Ok(self.tournament_options()?.match_options())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = Configuration::new().tournament_options().unwrap();
        assert_eq!(options, TournamentOptions::default());
    }

    #[test]
    fn setters_flow_into_options() {
        let options = Configuration::new()
            .with_timeout_ms(500)
            .with_board_size(5)
            .with_no_tie(true)
            .with_max_parallel_matches(0)
            .with_round_delay_ms(250)
            .tournament_options()
            .unwrap();
        assert_eq!(options.timeout_ms, 500);
        assert_eq!(options.board_size, 5);
        assert!(options.no_tie);
        assert_eq!(options.max_parallel_matches, 1);
        assert_eq!(options.round_delay, Some(Duration::from_millis(250)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert_eq!(
            Configuration::new().with_timeout_ms(50).match_options(),
            Err(ValidationError::TimeoutOutOfRange(50))
        );
        assert_eq!(
            Configuration::new().with_board_size(4).match_options(),
            Err(ValidationError::BoardSize(4))
        );
    }
}
