//! friendwatch entry point.
//!
//! Runs one monitoring pass and exits. Schedule it externally (cron, a
//! systemd timer); each invocation is also the retry for anything that
//! failed in the previous one.
//!
//! # Architecture
//!
//! ```text
//! roster.yaml --> SteamClient (concurrent) --> diff --> friend_counts.json
//!                                                  \--> TelegramSink
//! ```
//!
//! Private or failing accounts are skipped for the run. The process exits
//! non-zero only when configuration is unusable or state cannot be written.

mod config;
mod error;
mod steam;
mod telegram;

use friendwatch_core::{
    FileRunLatch, FileSnapshotStore, MessageFormatter, Monitor, Notifier, Roster,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::steam::SteamClient;
use crate::telegram::TelegramSink;

/// Application entry point.
///
/// Initializes logging, loads configuration and the roster, wires the HTTP
/// clients into a [`Monitor`], and performs a single run.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the run fails fatally.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("friendwatch starting");
    run().await?;
    Ok(())
}

/// Load configuration and the roster, then perform one monitoring pass.
async fn run() -> Result<(), WatchError> {
    let config = WatchConfig::from_env()?;
    info!(
        roster_file = %config.roster_file.display(),
        state_file = %config.state_file.display(),
        fetch_timeout_ms = config.fetch_timeout.as_millis(),
        send_timeout_ms = config.send_timeout.as_millis(),
        max_message_len = config.max_message_len,
        "configuration loaded"
    );

    let roster = Roster::from_file(&config.roster_file)?;
    info!(accounts = roster.len(), "roster loaded");

    let monitor = build_monitor(&config, roster)?;
    let report = monitor.run().await?;

    info!(
        first_run = report.first_run,
        monitored = report.monitored,
        unavailable = report.unavailable,
        changes = report.events.len(),
        messages_sent = report.messages_sent,
        "friendwatch finished"
    );
    Ok(())
}

/// Wire configuration into a ready-to-run monitor.
fn build_monitor(
    config: &WatchConfig,
    roster: Roster,
) -> Result<Monitor<SteamClient, TelegramSink>, WatchError> {
    let steam_http = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .build()
        .map_err(|e| WatchError::Http(format!("failed to build Steam client: {e}")))?;
    let telegram_http = reqwest::Client::builder()
        .timeout(config.send_timeout)
        .build()
        .map_err(|e| WatchError::Http(format!("failed to build Telegram client: {e}")))?;

    let formatter = MessageFormatter::with_overrides(
        config.templates_dir.as_deref(),
        config.profile_url_prefix.clone(),
        config.detail_listing_limit,
    )?;

    Ok(Monitor::new(
        roster,
        SteamClient::new(steam_http, &config.steam),
        Box::new(FileSnapshotStore::new(&config.state_file)),
        Box::new(FileRunLatch::new(&config.init_marker_file)),
        Notifier::new(
            TelegramSink::new(telegram_http, &config.telegram),
            config.max_message_len,
        )
        .with_send_timeout(config.send_timeout),
        formatter,
        config.fetch_timeout,
    ))
}
