//! Lifecycle events emitted while matches and tournaments run.
//!
//! The engine only ever pushes events, it never reads anything back from an
//! [`EventsAdapter`]. Two adapters are provided: [`TracingEvents`] logs every event, and
//! [`BroadcastEvents`] republishes them on a tokio broadcast channel for any number of
//! subscribers (a websocket layer, a TUI...).

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::{
    bracket::Bracket,
    player::Player,
    round_executor::{RoundResult, Winners},
};

/// Wire representation of an event, tagged by `type` (`"match:start"`, ...).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum TournamentEvent {
    #[serde(rename = "match:start")]
    MatchStart {
        players: [Player; 2],
        board_size: usize,
        timestamp: String,
    },
    #[serde(rename = "match:move")]
    MatchMove {
        player: Player,
        cell: usize,
        board: Vec<u8>,
        timestamp: String,
    },
    #[serde(rename = "match:win")]
    MatchWin {
        winner: Player,
        line: Vec<usize>,
        board: Vec<u8>,
        timestamp: String,
    },
    #[serde(rename = "match:draw")]
    MatchDraw {
        players: [Player; 2],
        board: Vec<u8>,
        timestamp: String,
    },
    #[serde(rename = "match:error")]
    MatchError {
        player: Player,
        error: String,
        timestamp: String,
    },
    #[serde(rename = "move:removed")]
    MoveRemoved {
        player: Player,
        cell: usize,
        timestamp: String,
    },
    #[serde(rename = "tournament:start")]
    TournamentStart {
        players: Vec<Player>,
        bracket: Bracket,
        timestamp: String,
    },
    #[serde(rename = "tournament:complete")]
    TournamentComplete {
        winners: Winners,
        bracket: Bracket,
        results: Vec<RoundResult>,
        timestamp: String,
    },
}

impl TournamentEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TournamentEvent::MatchStart { .. } => "match:start",
            TournamentEvent::MatchMove { .. } => "match:move",
            TournamentEvent::MatchWin { .. } => "match:win",
            TournamentEvent::MatchDraw { .. } => "match:draw",
            TournamentEvent::MatchError { .. } => "match:error",
            TournamentEvent::MoveRemoved { .. } => "move:removed",
            TournamentEvent::TournamentStart { .. } => "tournament:start",
            TournamentEvent::TournamentComplete { .. } => "tournament:complete",
        }
    }
}

/// Fire-and-forget sink for [`TournamentEvent`]s.
pub trait EventsAdapter: Send + Sync {
    fn broadcast(&self, event: TournamentEvent);
}

/// Logs every event. Tournament-level events at `info`, per-match ones at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventsAdapter for TracingEvents {
    fn broadcast(&self, event: TournamentEvent) {
        match &event {
            TournamentEvent::TournamentStart { players, .. } => {
                info!(event = event.name(), players = players.len());
            }
            TournamentEvent::TournamentComplete { winners, .. } => {
                info!(event = event.name(), ?winners);
            }
            _ => debug!(event = event.name(), payload = ?event),
        }
    }
}

/// Republishes events on a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEvents {
    sender: broadcast::Sender<TournamentEvent>,
}

impl BroadcastEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TournamentEvent> {
        self.sender.subscribe()
    }
}

impl EventsAdapter for BroadcastEvents {
    fn broadcast(&self, event: TournamentEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            trace!(event = name, "no subscriber");
        }
    }
}
