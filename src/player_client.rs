//! Communication with player services.
//!
//! Request shaping ([`build_url`], [`build_request_data`]) and response parsing
//! ([`parse_move`], [`validate_move`], [`handle_request_error`]) are plain functions, so they
//! can be tested without any transport. The network call itself goes through the
//! [`Transport`] trait; [`HttpTransport`] is the reqwest implementation.
//!
//! # Wire format
//!
//! `GET {protocol}://{host}:{port}{endpoint}?board=[0,1,2,...]&symbol=X&timeout=3000`
//!
//! The canonical answer is `{"move": 4}`. Older bots answer with other shapes, which are
//! accepted through the [`MOVE_SHIMS`] table.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    board::Symbol,
    error::{TransportError, ValidationError},
    player::Player,
};

pub const DEFAULT_MOVE_TIMEOUT_MS: u64 = 30_000;
pub const MOVE_ENDPOINT: &str = "/move";

/// JSON pointers where a move may be found, in priority order.
pub const MOVE_SHIMS: [&str; 4] = ["/move", "/movimiento", "/data/move", "/data/movimiento"];

/// Answer of [`PlayerClient::request_move`]. Serialized as `{"move": n}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveReply {
    Move(i64),
    Error(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    pub timeout_ms: Option<u64>,
}

impl RequestOptions {
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout_ms: Some(timeout_ms),
        }
    }

    /// A missing or zero timeout falls back to [`DEFAULT_MOVE_TIMEOUT_MS`].
    fn timeout_ms(&self) -> u64 {
        self.timeout_ms
            .filter(|&ms| ms > 0)
            .unwrap_or(DEFAULT_MOVE_TIMEOUT_MS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRequestData {
    pub board: Vec<u8>,
    pub symbol: Symbol,
    pub timeout: u64,
}

impl MoveRequestData {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let board = serde_json::to_string(&self.board).unwrap_or_else(|_| "[]".to_string());
        vec![
            ("board", board),
            ("symbol", self.symbol.as_str().to_string()),
            ("timeout", self.timeout.to_string()),
        ]
    }
}

/// Answer of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// Answer of `GET /info`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// `"{protocol}://{host}:{port}{endpoint}"`, defaulting to `http` and `localhost`.
///
/// Players without a port (humans, BYEs) get a URL without one.
pub fn build_url(player: &Player, endpoint: &str) -> String {
    let protocol = player.protocol.unwrap_or_default();
    let host = player.host.as_deref().unwrap_or("localhost");
    match player.port {
        Some(port) => format!("{protocol}://{host}:{port}{endpoint}"),
        None => format!("{protocol}://{host}{endpoint}"),
    }
}

pub fn build_request_data(board: &[u8], symbol: Symbol, options: &RequestOptions) -> MoveRequestData {
    MoveRequestData {
        board: board.to_vec(),
        symbol,
        timeout: options.timeout_ms(),
    }
}

/// Extracts a move from a response body.
///
/// The first shim that holds a non-null value wins. Numbers and numeric strings are accepted.
pub fn parse_move(body: &Value) -> Option<i64> {
    let value = MOVE_SHIMS
        .iter()
        .filter_map(|pointer| body.pointer(pointer))
        .find(|v| !v.is_null())?;

    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// Checks `0 <= cell < board_size²`.
pub fn validate_move(cell: i64, board_size: usize) -> Result<usize, ValidationError> {
    let cells = (board_size * board_size) as i64;
    if (0..cells).contains(&cell) {
        Ok(cell as usize)
    } else {
        Err(ValidationError::MoveOutOfRange { cell, board_size })
    }
}

/// The message reported for a failed request.
pub fn handle_request_error(error: &TransportError) -> String {
    match error {
        TransportError::Unreachable(cause) => warn!(%cause, "player unreachable"),
        other => warn!(error = %other, "player request failed"),
    }
    error.to_string()
}

/// A way of issuing `GET` requests that answer JSON.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<Value, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

/// Talks to player services over a [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct PlayerClient<T = HttpTransport> {
    transport: T,
}

impl PlayerClient<HttpTransport> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Transport> PlayerClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Asks `player` for a move. Never fails: every problem becomes a [`MoveReply::Error`].
    #[instrument(skip_all, fields(player = %player, endpoint = endpoint))]
    pub async fn request_move(
        &self,
        player: &Player,
        endpoint: &str,
        board: &[u8],
        symbol: Symbol,
        options: &RequestOptions,
    ) -> MoveReply {
        if player.port.is_none() {
            return MoveReply::Error(handle_request_error(&TransportError::Unreachable(
                format!("{} has no port", player.name),
            )));
        }

        let url = build_url(player, endpoint);
        let data = build_request_data(board, symbol, options);
        let timeout = Duration::from_millis(data.timeout);

        let body = match self.transport.get_json(&url, &data.to_query(), timeout).await {
            Ok(body) => body,
            Err(e) => return MoveReply::Error(handle_request_error(&e)),
        };

        match parse_move(&body) {
            Some(cell) => {
                debug!(cell, "move received");
                MoveReply::Move(cell)
            }
            None => {
                warn!(%body, "response carries no move");
                MoveReply::Error("Respuesta sin movimiento válido".to_string())
            }
        }
    }

    pub async fn health(
        &self,
        player: &Player,
        timeout: Duration,
    ) -> Result<HealthReport, TransportError> {
        self.get_typed(player, "/health", timeout).await
    }

    pub async fn info(&self, player: &Player, timeout: Duration) -> Result<PlayerInfo, TransportError> {
        self.get_typed(player, "/info", timeout).await
    }

    async fn get_typed<R: for<'de> Deserialize<'de>>(
        &self,
        player: &Player,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<R, TransportError> {
        let body = self
            .transport
            .get_json(&build_url(player, endpoint), &[], timeout)
            .await?;
        serde_json::from_value(body)
            .map_err(|e| TransportError::Unreachable(format!("unexpected {endpoint} body: {e}")))
    }
}
