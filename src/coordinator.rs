//! Tournament orchestration.
//!
//! [`TournamentCoordinator::run_tournament`] drives a whole knockout:
//!
//! 1. validate the roster and the options,
//! 2. shuffle the players and build the bracket (BYE-padded when needed),
//! 3. broadcast `tournament:start`,
//! 4. for every round: resolve its matches through the [`Arbitrator`], wait for all of them,
//!    then seat the winners in the next round,
//! 5. read the final's slots, broadcast `tournament:complete` and return a
//!    [`TournamentResult`].
//!
//! Only validation errors (and an explicit abort) stop a tournament. A match whose arbitrator
//! call fails is logged and player 1 advances, so a single broken bot cannot take the bracket
//! down with it.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use anyhow::bail;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    arbitrator::{Arbitrator, MatchOptions},
    bracket::{self, Bracket, MAX_PLAYERS, MIN_PLAYERS},
    clock::{Clock, SystemClock},
    error::{TournamentError, ValidationError},
    events::{EventsAdapter, TournamentEvent},
    player::Player,
    round_executor::{
        advance_bracket, execute_round, final_match_winner, get_round_info,
        get_tournament_winners, is_tournament_complete, Resolution, RoundResult, Winners,
    },
};

pub const MIN_TIMEOUT_MS: u64 = 100;
pub const MAX_TIMEOUT_MS: u64 = 30_000;

/// Bot names used by [`TournamentCoordinator::build_player_list`] before falling back to
/// `Bot1`, `Bot2`...
pub const BOT_POOL: [&str; 6] = ["Strategic", "Aggressive", "Defensive", "Mirror", "Corner", "Center"];
pub const FIRST_BOT_PORT: u16 = 3001;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentOptions {
    pub timeout_ms: u64,
    pub no_tie: bool,
    pub board_size: usize,
    /// Matches of a round allowed to run at the same time. 1 plays them one after the other.
    pub max_parallel_matches: usize,
    /// Pause between two rounds.
    pub round_delay: Option<Duration>,
}

impl Default for TournamentOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            no_tie: false,
            board_size: 3,
            max_parallel_matches: 1,
            round_delay: None,
        }
    }
}

impl TournamentOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ValidationError::TimeoutOutOfRange(self.timeout_ms));
        }
        if self.board_size != 3 && self.board_size != 5 {
            return Err(ValidationError::BoardSize(self.board_size));
        }
        Ok(())
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            timeout_ms: self.timeout_ms,
            board_size: self.board_size,
            no_tie: self.no_tie,
        }
    }
}

/// Input of [`TournamentCoordinator::build_player_list`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterConfig {
    pub total_players: usize,
    #[serde(default)]
    pub include_random: bool,
    #[serde(default)]
    pub human_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResult {
    /// Final bracket snapshot, every round seated.
    pub bracket: Bracket,
    pub results: Vec<RoundResult>,
    pub winners: Winners,
    pub total_rounds: usize,
    pub completed: bool,
}

/// Receiving side of an abort request. See [`abort_pair`].
#[derive(Debug, Clone)]
pub struct AbortSignal(watch::Receiver<bool>);

/// Sending side of an abort request.
#[derive(Debug)]
pub struct AbortHandle(watch::Sender<bool>);

/// Creates a linked handle and signal.
pub fn abort_pair() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle(tx), AbortSignal(rx))
}

impl AbortHandle {
    pub fn abort(&self) {
        self.0.send_replace(true);
    }
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        abort_pair().1
    }

    pub fn is_aborted(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the handle aborted. Pending forever if the handle is gone.
    pub async fn aborted(&mut self) {
        if self.0.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Builder of a [`TournamentCoordinator`]. The arbitrator and the events adapter are mandatory.
#[derive(Default)]
pub struct CoordinatorBuilder {
    arbitrator: Option<Arc<dyn Arbitrator>>,
    events: Option<Arc<dyn EventsAdapter>>,
    clock: Option<Arc<dyn Clock>>,
    seed: Option<u64>,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_arbitrator(mut self, arbitrator: Arc<dyn Arbitrator>) -> Self {
        self.arbitrator = Some(arbitrator);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventsAdapter>) -> Self {
        self.events = Some(events);
        self
    }

    /// Defaults to [`SystemClock`].
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Makes the seeding reproducible. Defaults to OS entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Fails when the arbitrator or the events adapter is missing.
    pub fn build(self) -> anyhow::Result<TournamentCoordinator> {
        let Some(arbitrator) = self.arbitrator else {
            bail!("TournamentCoordinator requires an arbitrator");
        };
        let Some(events) = self.events else {
            bail!("TournamentCoordinator requires an events adapter");
        };
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(TournamentCoordinator {
            arbitrator,
            events,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            rng: Mutex::new(rng),
        })
    }
}

/// Runs knockout tournaments. Every run works on its own bracket.
pub struct TournamentCoordinator {
    arbitrator: Arc<dyn Arbitrator>,
    events: Arc<dyn EventsAdapter>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl TournamentCoordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// Deterministic roster: the human seat first, then `Random`, then the [`BOT_POOL`], then
    /// `BotN`. Bots get consecutive ports from [`FIRST_BOT_PORT`].
    pub fn build_player_list(config: &RosterConfig) -> Result<Vec<Player>, ValidationError> {
        let total = config.total_players;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&total) {
            return Err(ValidationError::PlayerCount {
                count: total,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }

        let mut players = Vec::with_capacity(total);
        if let Some(name) = config.human_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                players.push(Player::human(name));
            }
        }

        let mut ports = FIRST_BOT_PORT..;
        let mut names = config
            .include_random
            .then(|| "Random".to_string())
            .into_iter()
            .chain(BOT_POOL.iter().map(|name| name.to_string()))
            .chain((1..).map(|i| format!("Bot{i}")));

        while players.len() < total {
            let (Some(name), Some(port)) = (names.next(), ports.next()) else {
                break;
            };
            players.push(Player::new(name, port));
        }
        Ok(players)
    }

    pub async fn run_tournament(
        &self,
        players: &[Player],
        options: TournamentOptions,
    ) -> Result<TournamentResult, TournamentError> {
        self.run_tournament_with_abort(players, options, AbortSignal::never())
            .await
    }

    /// Same as [`run_tournament`](Self::run_tournament), stopping with
    /// [`TournamentError::Aborted`] as soon as `abort` fires. Matches in flight are dropped.
    #[instrument(skip_all, fields(players = players.len()))]
    pub async fn run_tournament_with_abort(
        &self,
        players: &[Player],
        options: TournamentOptions,
        mut abort: AbortSignal,
    ) -> Result<TournamentResult, TournamentError> {
        options.validate()?;
        bracket::validate(players)?;

        let (shuffled, mut bracket) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let shuffled = bracket::shuffle(players, &mut *rng);
            let bracket = bracket::create_bracket(&shuffled, &mut *rng);
            (shuffled, bracket)
        };
        let total_rounds = bracket.len();
        info!(
            players = shuffled.len(),
            rounds = total_rounds,
            ?options,
            "tournament starting"
        );
        self.events.broadcast(TournamentEvent::TournamentStart {
            players: shuffled.clone(),
            bracket: bracket.clone(),
            timestamp: self.clock.to_iso_string(),
        });

        let match_options = options.match_options();
        let arbitrator = &self.arbitrator;
        let mut results: Vec<RoundResult> = Vec::with_capacity(total_rounds);

        for number in 1..=total_rounds {
            if abort.is_aborted() {
                warn!(round = number, "tournament aborted");
                return Err(TournamentError::Aborted { round: number });
            }
            let Some(round) = bracket.round(number).cloned() else {
                break;
            };
            let info = get_round_info(number, total_rounds);
            info!(round = number, name = %info.name, matches = round.matches.len(), "round starting");

            let play = |pair: [Player; 2]| async move { arbitrator.run_match(pair, match_options).await };
            let outcome = tokio::select! {
                outcome = execute_round(&round, options.max_parallel_matches, play) => outcome?,
                _ = abort.aborted() => {
                    warn!(round = number, "tournament aborted");
                    return Err(TournamentError::Aborted { round: number });
                }
            };

            for record in &outcome.matches {
                match &record.result {
                    Resolution::Played(result) => info!(
                        round = number,
                        pairing = %record.pairing,
                        result = ?result.result,
                        winner = %record.winner,
                        "match resolved"
                    ),
                    Resolution::Failed { error } => warn!(
                        round = number,
                        pairing = %record.pairing,
                        %error,
                        winner = %record.winner,
                        "match failed"
                    ),
                    Resolution::Bye | Resolution::Walkover => debug!(
                        round = number,
                        pairing = %record.pairing,
                        winner = %record.winner,
                        "advanced without playing"
                    ),
                }
            }

            bracket = advance_bracket(&bracket, number, &outcome.winners())?;
            results.push(outcome);

            if number < total_rounds {
                if let Some(delay) = options.round_delay {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let winners = get_tournament_winners(&bracket);
        if let (Some(declared), Some(played)) = (&winners.winner, final_match_winner(&results)) {
            if declared != played {
                warn!(
                    %declared,
                    %played,
                    "declared winner sits in the final's first slot but lost the final"
                );
            }
        }
        let completed = results.len() == total_rounds && is_tournament_complete(&bracket);
        info!(winner = ?winners.winner, runner_up = ?winners.runner_up, completed, "tournament complete");

        self.events.broadcast(TournamentEvent::TournamentComplete {
            winners: winners.clone(),
            bracket: bracket.clone(),
            results: results.clone(),
            timestamp: self.clock.to_iso_string(),
        });

        Ok(TournamentResult {
            bracket,
            results,
            winners,
            total_rounds,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_fills_human_random_pool_then_generic_names() {
        let players = TournamentCoordinator::build_player_list(&RosterConfig {
            total_players: 10,
            include_random: true,
            human_name: Some("Ana".into()),
        })
        .unwrap();

        let names: Vec<_> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Ana",
                "Random",
                "Strategic",
                "Aggressive",
                "Defensive",
                "Mirror",
                "Corner",
                "Center",
                "Bot1",
                "Bot2"
            ]
        );
        assert!(players[0].is_human);
        assert_eq!(players[0].port, None);
        assert_eq!(players[1].port, Some(3001));
        assert_eq!(players[9].port, Some(3009));
        assert_eq!(bracket::validate(&players), Ok(()));
    }

    #[test]
    fn roster_without_extras_starts_with_the_pool() {
        let players = TournamentCoordinator::build_player_list(&RosterConfig {
            total_players: 2,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(players, vec![Player::new("Strategic", 3001), Player::new("Aggressive", 3002)]);
    }

    #[test]
    fn roster_size_is_bounded() {
        for total in [0, 1, 13] {
            let err = TournamentCoordinator::build_player_list(&RosterConfig {
                total_players: total,
                ..Default::default()
            })
            .unwrap_err();
            assert!(matches!(err, ValidationError::PlayerCount { .. }));
        }
    }

    #[test]
    fn options_bounds() {
        assert_eq!(TournamentOptions::default().validate(), Ok(()));
        let slow = TournamentOptions {
            timeout_ms: 30_001,
            ..Default::default()
        };
        assert_eq!(slow.validate(), Err(ValidationError::TimeoutOutOfRange(30_001)));
        let odd = TournamentOptions {
            board_size: 4,
            ..Default::default()
        };
        assert_eq!(odd.validate(), Err(ValidationError::BoardSize(4)));
    }

    #[test]
    fn builder_fails_fast_without_collaborators() {
        assert!(TournamentCoordinator::builder().build().is_err());
        let err = TournamentCoordinator::builder()
            .with_events(Arc::new(crate::events::TracingEvents))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("arbitrator"));
    }

    #[tokio::test]
    async fn abort_signal_fires_once_handle_aborts() {
        let (handle, mut signal) = abort_pair();
        assert!(!signal.is_aborted());
        handle.abort();
        assert!(signal.is_aborted());
        signal.aborted().await;
    }

    #[tokio::test]
    async fn never_signal_stays_pending() {
        let mut signal = AbortSignal::never();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(waited.is_err());
    }
}
