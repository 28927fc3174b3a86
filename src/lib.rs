//! # Bot Tournament
//!
//! Single-elimination tournaments between board-game bots, each bot being an independent HTTP
//! service.
//!
//! It provides:
//! - Bracket construction with BYE padding for player counts that are not a power of two
//!   ([`bracket`])
//! - Round execution with a round barrier and winner propagation ([`round_executor`])
//! - Tournament orchestration ([`TournamentCoordinator`](crate::coordinator::TournamentCoordinator))
//! - Communication with bot services, tolerant to several response shapes ([`player_client`])
//! - A tic-tac-toe referee playing matches over HTTP
//!   ([`BoardArbitrator`](crate::arbitrator::BoardArbitrator))
//!
//! # Documentation Overview
//!
//! - To run a tournament, see [`coordinator`].
//! - To plug in another game, implement the [`Arbitrator`](crate::arbitrator::Arbitrator) trait.
//! - To observe a tournament, implement [`EventsAdapter`](crate::events::EventsAdapter) or
//!   subscribe to a [`BroadcastEvents`](crate::events::BroadcastEvents).
//! - For the bot wire protocol, see [`player_client`].
//!
//! # Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bot_tournament::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let events: Arc<dyn EventsAdapter> = Arc::new(TracingEvents);
//!     let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!     let arbitrator = Arc::new(BoardArbitrator::new(events.clone(), clock.clone()));
//!
//!     let coordinator = TournamentCoordinator::builder()
//!         .with_arbitrator(arbitrator)
//!         .with_events(events)
//!         .with_clock(clock)
//!         .build()?;
//!
//!     let players = TournamentCoordinator::build_player_list(&RosterConfig {
//!         total_players: 6,
//!         include_random: true,
//!         human_name: None,
//!     })?;
//!     let result = coordinator
//!         .run_tournament(&players, TournamentOptions::default())
//!         .await?;
//!
//!     println!("winner: {:?}", result.winners.winner);
//!     Ok(())
//! }
//! ```
//!
//! ## Bot Requirements
//!
//! - `GET /move?board=[...]&symbol=X&timeout=3000` answers `{"move": <cell>}`
//! - `GET /health` answers `{"status": "ok", ...}`
//! - `GET /info` answers `{"name": ..., "strategy": ..., "version": ..., "port": ...}`

pub use anyhow;
pub mod arbitrator;
pub mod board;
pub mod bracket;
pub mod clock;
pub mod configuration;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod logger;
pub mod player;
pub mod player_client;
pub mod request;
pub mod round_executor;

/// Commonly used types and traits for quick access.
///
/// ```rust
/// use bot_tournament::prelude::*;
/// ```
pub mod prelude {
    pub use crate::arbitrator::{Arbitrator, BoardArbitrator, MatchOptions, MatchOutcome};
    pub use crate::bracket::{Bracket, Match, Round};
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::configuration::Configuration;
    pub use crate::coordinator::{
        abort_pair, RosterConfig, TournamentCoordinator, TournamentOptions, TournamentResult,
    };
    pub use crate::error::{TournamentError, TransportError, ValidationError};
    pub use crate::events::{BroadcastEvents, EventsAdapter, TournamentEvent, TracingEvents};
    pub use crate::player::{Player, Protocol};
    pub use crate::player_client::PlayerClient;
}
