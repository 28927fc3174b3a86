use std::fs::File;

use anyhow::Context;
use time::{format_description::parse_borrowed, OffsetDateTime, UtcOffset};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::{
    fmt::{
        time::{FormatTime, OffsetTime},
        writer::BoxMakeWriter,
    },
    FmtSubscriber,
};

const TIMER_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// Logs everything down to `TRACE` into `<date>_tournament_log.txt`.
pub fn init_logger() -> anyhow::Result<()> {
    let file_name = get_log_file_name()?;
    let file = File::create(&file_name).with_context(|| format!("creating {file_name}"))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_ansi(false)
        .with_timer(local_timer()?)
        .with_writer(BoxMakeWriter::new(file))
        .finish();

    set_global_default(subscriber).context(
        "Could not set global default tracing subscriber. Consider disabling logs if you are already setting a subscriber.",
    )
}

/// Logs `INFO` and above (`DEBUG` when `verbose`) to stdout.
pub fn init_stdout_logger(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_timer(local_timer()?)
        .with_target(false)
        .finish();

    set_global_default(subscriber).context("Could not set global default tracing subscriber")
}

fn local_timer() -> anyhow::Result<impl FormatTime> {
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    Ok(OffsetTime::new(local_offset, parse_borrowed::<2>(TIMER_FORMAT)?))
}

fn get_log_file_name() -> anyhow::Result<String> {
    let format = parse_borrowed::<2>("[year]-[month]-[day]_[hour]:[minute]:[second]_tournament_log.txt")?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Ok(now.format(&format)?)
}
