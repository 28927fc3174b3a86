use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context};
use bot_tournament::{
    bracket::parse_roster,
    clock::{Clock, SystemClock},
    configuration::Configuration,
    coordinator::{RosterConfig, TournamentCoordinator},
    events::{EventsAdapter, TracingEvents},
    logger,
    player::Player,
    player_client::PlayerClient,
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "referee")]
#[command(about = "Knockout tournaments between tic-tac-toe bots served over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tournament and print its result as JSON
    Run {
        #[command(flatten)]
        roster: RosterArgs,
        /// Per-move timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Board size, 3 or 5
        #[arg(long)]
        board_size: Option<usize>,
        /// Sliding-window mode
        #[arg(long)]
        no_tie: bool,
        /// Matches of a round played at once
        #[arg(long)]
        parallel: Option<usize>,
        /// Pause between rounds in milliseconds
        #[arg(long)]
        round_delay_ms: Option<u64>,
        /// Seed of the bracket shuffle
        #[arg(long)]
        seed: Option<u64>,
        /// Skip players failing their health check instead of aborting
        #[arg(long)]
        drop_unhealthy: bool,
    },
    /// Query /health and /info of every player
    Probe {
        #[command(flatten)]
        roster: RosterArgs,
    },
}

#[derive(Args)]
struct RosterArgs {
    /// Player as NAME:PORT, repeatable
    #[arg(short, long = "player")]
    players: Vec<String>,
    /// JSON file holding a list of players
    #[arg(short, long)]
    roster: Option<std::path::PathBuf>,
    /// Generate a roster of N local bots
    #[arg(short, long)]
    bots: Option<usize>,
}

impl RosterArgs {
    fn load(&self) -> anyhow::Result<Vec<Player>> {
        if let Some(path) = &self.roster {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            return Ok(parse_roster(&value)?);
        }
        if let Some(total) = self.bots {
            return Ok(TournamentCoordinator::build_player_list(&RosterConfig {
                total_players: total,
                ..Default::default()
            })?);
        }
        if self.players.is_empty() {
            bail!("no players given, use --player, --roster or --bots");
        }
        self.players.iter().map(|arg| parse_player(arg)).collect()
    }
}

fn parse_player(arg: &str) -> anyhow::Result<Player> {
    let Some((name, port)) = arg.rsplit_once(':') else {
        bail!("expected NAME:PORT, got '{arg}'");
    };
    let port = port
        .parse()
        .with_context(|| format!("invalid port in '{arg}'"))?;
    Ok(Player::new(name, port))
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Configuration::from_env();
    if config.log() {
        logger::init_logger()?;
    } else if config.verbose() {
        logger::init_stdout_logger(false)?;
    }

    match cli.command {
        Commands::Run {
            roster,
            timeout_ms,
            board_size,
            no_tie,
            parallel,
            round_delay_ms,
            seed,
            drop_unhealthy,
        } => {
            let mut config = config;
            if no_tie {
                config = config.with_no_tie(true);
            }
            if let Some(value) = timeout_ms {
                config = config.with_timeout_ms(value);
            }
            if let Some(value) = board_size {
                config = config.with_board_size(value);
            }
            if let Some(value) = parallel {
                config = config.with_max_parallel_matches(value);
            }
            if let Some(value) = round_delay_ms {
                config = config.with_round_delay_ms(value);
            }
            if seed.is_some() {
                config = config.with_seed(seed);
            }
            let options = config.tournament_options()?;

            let mut players = roster.load()?;
            if drop_unhealthy {
                players = healthy_only(players).await;
            }

            let events: Arc<dyn EventsAdapter> = Arc::new(TracingEvents);
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let arbitrator = Arc::new(bot_tournament::arbitrator::BoardArbitrator::new(
                events.clone(),
                clock.clone(),
            ));
            let mut builder = TournamentCoordinator::builder()
                .with_arbitrator(arbitrator)
                .with_events(events)
                .with_clock(clock);
            if let Some(seed) = config.seed() {
                builder = builder.with_seed(seed);
            }

            let result = builder.build()?.run_tournament(&players, options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Probe { roster } => {
            let client = PlayerClient::new();
            for player in roster.load()?.iter().filter(|p| p.is_bot()) {
                match client.health(player, PROBE_TIMEOUT).await {
                    Ok(health) => println!("{player}: {}", health.status),
                    Err(e) => println!("{player}: {e}"),
                }
                if let Ok(info) = client.info(player, PROBE_TIMEOUT).await {
                    println!(
                        "  {} strategy={} version={}",
                        info.name,
                        info.strategy.as_deref().unwrap_or("-"),
                        info.version.as_deref().unwrap_or("-"),
                    );
                }
            }
        }
    }
    Ok(())
}

async fn healthy_only(players: Vec<Player>) -> Vec<Player> {
    let client = PlayerClient::new();
    let mut healthy = Vec::with_capacity(players.len());
    for player in players {
        if !player.is_bot() {
            healthy.push(player);
            continue;
        }
        match client.health(&player, PROBE_TIMEOUT).await {
            Ok(report) if report.status == "ok" => healthy.push(player),
            Ok(report) => warn!(%player, status = %report.status, "dropping unhealthy player"),
            Err(error) => warn!(%player, %error, "dropping unreachable player"),
        }
    }
    info!(kept = healthy.len(), "health check done");
    healthy
}
