//! Match adjudication.
//!
//! The coordinator only knows the [`Arbitrator`] trait: given two players, play a match and
//! report who won. [`BoardArbitrator`] is the implementation for tic-tac-toe bots served over
//! HTTP: it asks each bot in turn for a move through a [`PlayerClient`], and forfeits a bot that
//! times out, answers garbage or plays an illegal move.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    board::{Board, Symbol},
    clock::Clock,
    events::{EventsAdapter, TournamentEvent},
    player::Player,
    player_client::{
        validate_move, HttpTransport, MoveReply, PlayerClient, RequestOptions, Transport,
        MOVE_ENDPOINT,
    },
};

/// Turn cap of a no-tie match is `board_size² × MOVE_CAP_FACTOR` moves.
pub const MOVE_CAP_FACTOR: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOptions {
    pub timeout_ms: u64,
    pub board_size: usize,
    pub no_tie: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            board_size: 3,
            no_tie: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResultKind {
    Win,
    Draw,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub player: String,
    pub cell: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub result: MatchResultKind,
    pub winner: Option<Player>,
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchOutcome {
    pub fn win(winner: Player) -> Self {
        Self {
            result: MatchResultKind::Win,
            winner: Some(winner),
            moves: vec![],
            duration_ms: None,
            error: None,
        }
    }

    pub fn draw() -> Self {
        Self {
            result: MatchResultKind::Draw,
            winner: None,
            moves: vec![],
            duration_ms: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: MatchResultKind::Error,
            winner: None,
            moves: vec![],
            duration_ms: None,
            error: Some(message.into()),
        }
    }

    fn with_moves(mut self, moves: Vec<MoveRecord>) -> Self {
        self.moves = moves;
        self
    }

    fn timed(mut self, started: Instant) -> Self {
        self.duration_ms = Some(started.elapsed().as_millis() as u64);
        self
    }
}

/// Plays one match between two real players.
///
/// An `Err` means the match could not be run at all. The caller decides what to do with it.
#[async_trait]
pub trait Arbitrator: Send + Sync {
    async fn run_match(
        &self,
        players: [Player; 2],
        options: MatchOptions,
    ) -> anyhow::Result<MatchOutcome>;
}

/// Referee for 3×3 and 5×5 tic-tac-toe between HTTP bots.
pub struct BoardArbitrator<T = HttpTransport> {
    client: PlayerClient<T>,
    events: Arc<dyn EventsAdapter>,
    clock: Arc<dyn Clock>,
    endpoint: String,
}

impl BoardArbitrator<HttpTransport> {
    pub fn new(events: Arc<dyn EventsAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self::with_client(PlayerClient::new(), events, clock)
    }
}

impl<T: Transport> BoardArbitrator<T> {
    pub fn with_client(
        client: PlayerClient<T>,
        events: Arc<dyn EventsAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            events,
            clock,
            endpoint: MOVE_ENDPOINT.to_string(),
        }
    }

    /// Path asked for moves, `/move` by default.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn client(&self) -> &PlayerClient<T> {
        &self.client
    }

    fn timestamp(&self) -> String {
        self.clock.to_iso_string()
    }

    fn forfeit(
        &self,
        offender: &Player,
        opponent: &Player,
        error: String,
        moves: Vec<MoveRecord>,
        started: Instant,
    ) -> MatchOutcome {
        warn!(player = %offender, %error, "forfeit, {} wins", opponent.name);
        self.events.broadcast(TournamentEvent::MatchError {
            player: offender.clone(),
            error: error.clone(),
            timestamp: self.timestamp(),
        });
        let mut outcome = MatchOutcome::win(opponent.clone())
            .with_moves(moves)
            .timed(started);
        outcome.error = Some(error);
        outcome
    }

    fn draw(&self, players: [Player; 2], board: &Board, moves: Vec<MoveRecord>, started: Instant) -> MatchOutcome {
        info!(x = %players[0], o = %players[1], moves = moves.len(), "draw");
        self.events.broadcast(TournamentEvent::MatchDraw {
            players,
            board: board.cells().to_vec(),
            timestamp: self.timestamp(),
        });
        MatchOutcome::draw().with_moves(moves).timed(started)
    }
}

#[async_trait]
impl<T: Transport> Arbitrator for BoardArbitrator<T> {
    async fn run_match(
        &self,
        players: [Player; 2],
        options: MatchOptions,
    ) -> anyhow::Result<MatchOutcome> {
        let started = Instant::now();
        let mut board = Board::new(options.board_size)?;

        self.events.broadcast(TournamentEvent::MatchStart {
            players: players.clone(),
            board_size: board.size(),
            timestamp: self.timestamp(),
        });

        if let Some(human) = players.iter().find(|p| p.is_human) {
            let error = format!("{} is a human seat, this arbitrator only plays bots", human.name);
            self.events.broadcast(TournamentEvent::MatchError {
                player: human.clone(),
                error: error.clone(),
                timestamp: self.timestamp(),
            });
            return Ok(MatchOutcome::error(error).timed(started));
        }

        let max_marks = options.no_tie.then_some(board.size());
        let request = RequestOptions::with_timeout_ms(options.timeout_ms);
        let max_turns = board.size() * board.size() * MOVE_CAP_FACTOR;
        let mut moves = Vec::new();

        for turn in 0..max_turns {
            let seat = turn % 2;
            let (player, opponent) = (&players[seat], &players[1 - seat]);
            let symbol = Symbol::for_seat(seat);

            let reply = self
                .client
                .request_move(player, &self.endpoint, board.cells(), symbol, &request)
                .await;

            let placed = match reply {
                MoveReply::Move(cell) => validate_move(cell, board.size())
                    .map_err(|e| e.to_string())
                    .and_then(|cell| {
                        board
                            .place(cell, symbol, max_marks)
                            .map(|removed| (cell, removed))
                            .map_err(|e| e.to_string())
                    }),
                MoveReply::Error(error) => Err(error),
            };
            let (cell, removed) = match placed {
                Ok(placed) => placed,
                Err(error) => return Ok(self.forfeit(player, opponent, error, moves, started)),
            };

            if let Some(old) = removed {
                self.events.broadcast(TournamentEvent::MoveRemoved {
                    player: player.clone(),
                    cell: old,
                    timestamp: self.timestamp(),
                });
            }
            debug!(player = %player, cell, "move");
            moves.push(MoveRecord {
                player: player.name.clone(),
                cell,
            });
            self.events.broadcast(TournamentEvent::MatchMove {
                player: player.clone(),
                cell,
                board: board.cells().to_vec(),
                timestamp: self.timestamp(),
            });

            if let Some(line) = board.winning_line(symbol) {
                info!(winner = %player, moves = moves.len(), "match won");
                self.events.broadcast(TournamentEvent::MatchWin {
                    winner: player.clone(),
                    line,
                    board: board.cells().to_vec(),
                    timestamp: self.timestamp(),
                });
                return Ok(MatchOutcome::win(player.clone())
                    .with_moves(moves)
                    .timed(started));
            }
            if board.is_full() {
                return Ok(self.draw(players.clone(), &board, moves, started));
            }
        }

        warn!(max_turns, "move cap reached");
        Ok(self.draw(players.clone(), &board, moves, started))
    }
}
