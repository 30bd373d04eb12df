//! The monitoring run: from stored state to delivered notifications.
//!
//! A run is one linear pass through [`RunPhase`]:
//!
//! 1. **Loaded** -- check the first-run latch, read the previous snapshot
//! 2. **Fetched** -- query every roster account concurrently and wait for all
//! 3. **Diffed** -- compare previous and current counts
//! 4. **Persisted** -- replace the stored snapshot with the current one
//! 5. **Notified** -- send change alerts, or the baseline summary on a first run
//!
//! Fetch and delivery failures are logged and absorbed. Only failing to
//! write the marker or the snapshot aborts the run, because either would
//! corrupt the next diff.

use std::time::Duration;

use friendwatch_types::{
    Account, ChangeEvent, ChangeKind, FetchOutcome, RunPhase, Snapshot, UnavailableReason,
};
use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::diff::diff;
use crate::notify::{MessageSink, Notifier};
use crate::roster::Roster;
use crate::source::FriendSource;
use crate::store::{RunLatch, SnapshotStore, StoreError};
use crate::templates::MessageFormatter;

/// Default per-account fetch deadline.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fatal errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The first-run marker or the snapshot could not be written.
    #[error("state error: {0}")]
    Store(#[from] StoreError),
}

/// What a completed run observed and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Whether this run only established the baseline.
    pub first_run: bool,
    /// Accounts with a count this run.
    pub monitored: usize,
    /// Accounts that were private or failed this run.
    pub unavailable: usize,
    /// Change events, in roster order.
    pub events: Vec<ChangeEvent>,
    /// Messages the sink accepted, counting each chunk separately.
    pub messages_sent: usize,
}

/// Runs one diff-and-notify pass over a roster.
pub struct Monitor<F, S> {
    roster: Roster,
    source: F,
    store: Box<dyn SnapshotStore>,
    latch: Box<dyn RunLatch>,
    notifier: Notifier<S>,
    formatter: MessageFormatter,
    fetch_timeout: Duration,
}

impl<F, S> Monitor<F, S>
where
    F: FriendSource,
    S: MessageSink,
{
    /// Assemble a monitor from its collaborators.
    pub fn new(
        roster: Roster,
        source: F,
        store: Box<dyn SnapshotStore>,
        latch: Box<dyn RunLatch>,
        notifier: Notifier<S>,
        formatter: MessageFormatter,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            roster,
            source,
            store,
            latch,
            notifier,
            formatter,
            fetch_timeout,
        }
    }

    /// Execute one complete run.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Store`] if the first-run marker or the current
    /// snapshot cannot be written.
    pub async fn run(&self) -> Result<RunReport, RunError> {
        debug!(
            phase = %RunPhase::Start,
            accounts = self.roster.len(),
            "run starting"
        );

        let first_run = self.latch.check_and_set()?;
        let previous = self.store.load();
        debug!(
            phase = %RunPhase::Loaded,
            first_run,
            previous_accounts = previous.len(),
            "state loaded"
        );

        let outcomes = self.fetch_all().await;
        let current = collect_counts(&outcomes);
        let unavailable = outcomes.len().saturating_sub(current.len());
        debug!(
            phase = %RunPhase::Fetched,
            fetched = current.len(),
            unavailable,
            "all fetches complete"
        );

        let events = diff(self.roster.accounts(), &previous, &current, first_run);
        debug!(phase = %RunPhase::Diffed, events = events.len(), "diff computed");

        self.store.save(&current)?;
        debug!(phase = %RunPhase::Persisted, accounts = current.len(), "snapshot persisted");

        let messages_sent = if first_run {
            self.announce_baseline(&current, unavailable).await
        } else {
            self.announce_changes(&events).await
        };
        debug!(phase = %RunPhase::Notified, messages_sent, "notifications attempted");

        info!(
            phase = %RunPhase::Done,
            first_run,
            monitored = current.len(),
            unavailable,
            changes = events.len(),
            messages_sent,
            "run complete"
        );

        Ok(RunReport {
            first_run,
            monitored: current.len(),
            unavailable,
            events,
            messages_sent,
        })
    }

    /// Fetch every roster account concurrently, preserving roster order.
    async fn fetch_all(&self) -> Vec<(&Account, FetchOutcome)> {
        let deadline = self.fetch_timeout;
        let fetches = self.roster.accounts().iter().map(|account| async move {
            let outcome = match timeout(deadline, self.source.fetch(account)).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    FetchOutcome::error(format!("timed out after {}ms", deadline.as_millis()))
                }
            };
            log_outcome(account, &outcome);
            (account, outcome)
        });
        join_all(fetches).await
    }

    /// Send the first-run summary and, for small rosters, the listing.
    async fn announce_baseline(&self, current: &Snapshot, unavailable: usize) -> usize {
        let mut sent = 0usize;

        match self.formatter.summary(current.len(), unavailable) {
            Ok(text) => sent = sent.saturating_add(self.notifier.notify(&text).await),
            Err(e) => error!(error = %e, "failed to render summary"),
        }

        match self.formatter.details(self.roster.accounts(), current) {
            Ok(Some(text)) => sent = sent.saturating_add(self.notifier.notify(&text).await),
            Ok(None) => debug!(monitored = current.len(), "account listing skipped"),
            Err(e) => error!(error = %e, "failed to render account listing"),
        }

        sent
    }

    /// Send one alert per change event, in order.
    async fn announce_changes(&self, events: &[ChangeEvent]) -> usize {
        if events.is_empty() {
            info!("no changes detected");
            return 0;
        }

        let summary = events
            .iter()
            .map(|event| match event.kind() {
                ChangeKind::Gained => format!("{}: +{}", event.account.id, event.magnitude()),
                ChangeKind::Lost => format!("{}: -{}", event.account.id, event.magnitude()),
            })
            .collect::<Vec<_>>()
            .join(", ");
        info!(changes = %summary, "changes detected");

        let mut sent = 0usize;
        for event in events {
            match self.formatter.change(event) {
                Ok(text) => sent = sent.saturating_add(self.notifier.notify(&text).await),
                Err(e) => error!(
                    account = %event.account.id,
                    error = %e,
                    "failed to render change notification"
                ),
            }
        }
        sent
    }
}

/// Build the current snapshot from successful fetches only.
fn collect_counts(outcomes: &[(&Account, FetchOutcome)]) -> Snapshot {
    outcomes
        .iter()
        .filter_map(|(account, outcome)| outcome.count().map(|n| (account.id.clone(), n)))
        .collect()
}

fn log_outcome(account: &Account, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Count(friends) => {
            debug!(account = %account.id, friends, "friend count fetched");
        }
        FetchOutcome::Unavailable(UnavailableReason::Private) => {
            warn!(account = %account.id, "profile is private");
        }
        FetchOutcome::Unavailable(UnavailableReason::Error(detail)) => {
            error!(account = %account.id, error = %detail, "failed to fetch friend count");
        }
    }
}
