//! Error taxonomy of the tournament engine.
//!
//! - [`ValidationError`]: bad rosters or options, raised before any network call.
//! - [`TransportError`]: a player service could not give an answer. Never crosses the
//!   [`PlayerClient`](crate::player_client::PlayerClient) boundary as an error, it is turned
//!   into a [`MoveReply::Error`](crate::player_client::MoveReply).
//! - [`TournamentError`]: what [`run_tournament`](crate::coordinator::TournamentCoordinator::run_tournament)
//!   can fail with. Match execution failures are absorbed and never show up here.

use thiserror::Error;

/// Structural or configuration problem. Fatal for the tournament.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("players must be a list")]
    NotAList,

    #[error("a tournament needs between {min} and {max} players, got {count}")]
    PlayerCount { count: usize, min: usize, max: usize },

    #[error("player #{index} is not an object")]
    NotAnObject { index: usize },

    #[error("player #{index} has no name")]
    MissingName { index: usize },

    #[error("player name '{name}' is longer than {max} characters")]
    NameTooLong { name: String, max: usize },

    #[error("player '{name}' has an invalid port {port:?}, expected {min}..={max}")]
    InvalidPort {
        name: String,
        port: Option<i64>,
        min: u16,
        max: u16,
    },

    #[error("player #{index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },

    #[error("timeout {0}ms is out of range, expected 100..=30000")]
    TimeoutOutOfRange(u64),

    #[error("unsupported board size {0}, expected 3 or 5")]
    BoardSize(usize),

    #[error("Movimiento fuera de rango")]
    MoveOutOfRange { cell: i64, board_size: usize },
}

/// Failure to obtain an answer from a player service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request ran past its deadline.
    #[error("Tiempo de espera agotado")]
    Timeout,

    /// The service answered with a non-2xx status.
    #[error("Respuesta {0}")]
    Status(u16),

    /// Connection refused, DNS failure, unreadable body...
    #[error("No fue posible contactar al jugador.")]
    Unreachable(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }
}

/// Errors returned by a tournament run.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Both slots of a match were empty when its round ran.
    #[error("round {round}, match {index} has no players")]
    EmptyMatch { round: usize, index: usize },

    #[error("round {round} produced {got} winners, next round needs {expected}")]
    WinnerCount {
        round: usize,
        expected: usize,
        got: usize,
    },

    #[error("tournament aborted during round {round}")]
    Aborted { round: usize },
}
