#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bot_tournament::{
    arbitrator::{Arbitrator, MatchOptions, MatchOutcome},
    clock::FixedClock,
    error::TransportError,
    events::{EventsAdapter, TournamentEvent},
    player::Player,
    player_client::Transport,
};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .without_time()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn bots(count: u16) -> Vec<Player> {
    (1..=count)
        .map(|i| Player::new(format!("P{i}"), 3000 + i))
        .collect()
}

pub fn epoch_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(OffsetDateTime::UNIX_EPOCH))
}

type Policy = dyn Fn(&[Player; 2]) -> anyhow::Result<MatchOutcome> + Send + Sync;

/// Arbitrator deciding every match with a plain function, and remembering what it was asked.
pub struct StubArbitrator {
    policy: Box<Policy>,
    calls: AtomicUsize,
    played: Mutex<Vec<[Player; 2]>>,
}

impl StubArbitrator {
    pub fn new(
        policy: impl Fn(&[Player; 2]) -> anyhow::Result<MatchOutcome> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            policy: Box::new(policy),
            calls: AtomicUsize::new(0),
            played: Mutex::new(vec![]),
        })
    }

    /// Seat 1 always wins.
    pub fn player1_wins() -> Arc<Self> {
        Self::new(|pair| Ok(MatchOutcome::win(pair[0].clone())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn played(&self) -> Vec<[Player; 2]> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl Arbitrator for StubArbitrator {
    async fn run_match(
        &self,
        players: [Player; 2],
        _options: MatchOptions,
    ) -> anyhow::Result<MatchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.played.lock().unwrap().push(players.clone());
        (self.policy)(&players)
    }
}

/// Keeps every event, in emission order.
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<TournamentEvent>>,
}

impl RecordingEvents {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    pub fn events(&self) -> Vec<TournamentEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventsAdapter for RecordingEvents {
    fn broadcast(&self, event: TournamentEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Transport answering from a per-port script. An exhausted script makes the player unreachable.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<u16, VecDeque<Result<Value, TransportError>>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn script(self, port: u16, replies: impl IntoIterator<Item = Result<Value, TransportError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(port)
            .or_default()
            .extend(replies);
        self
    }

    /// Scripts `{"move": cell}` answers.
    pub fn moves(self, port: u16, cells: &[i64]) -> Self {
        let replies: Vec<_> = cells
            .iter()
            .map(|cell| Ok(serde_json::json!({ "move": cell })))
            .collect();
        self.script(port, replies)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(
        &self,
        url: &str,
        _query: &[(&'static str, String)],
        _timeout: Duration,
    ) -> Result<Value, TransportError> {
        self.urls.lock().unwrap().push(url.to_string());
        let port = url
            .rsplit(':')
            .next()
            .and_then(|rest| rest.split('/').next())
            .and_then(|port| port.parse().ok());
        port.and_then(|port: u16| self.scripts.lock().unwrap().get_mut(&port)?.pop_front())
            .unwrap_or_else(|| Err(TransportError::Unreachable("script exhausted".into())))
    }
}
