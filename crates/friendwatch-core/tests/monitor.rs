//! End-to-end tests for a monitoring run.
//!
//! Each test drives [`Monitor::run`] with a scripted friend source, a
//! recording message sink, and in-memory state, so no network or
//! filesystem access is involved.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use friendwatch_core::{
    FriendSource, MemoryRunLatch, MemorySnapshotStore, MessageFormatter, MessageSink, Monitor,
    Notifier, NotifyError, RunError, RunLatch, Roster, SnapshotStore, StoreError,
};
use friendwatch_types::{Account, AccountId, ChangeKind, FetchOutcome, Snapshot, UnavailableReason};

// =============================================================================
// Stand-ins
// =============================================================================

#[derive(Default)]
struct ScriptedSource {
    script: HashMap<String, (FetchOutcome, Duration)>,
}

impl ScriptedSource {
    fn with(mut self, id: &str, outcome: FetchOutcome) -> Self {
        self.script.insert(id.to_owned(), (outcome, Duration::ZERO));
        self
    }

    fn delayed(mut self, id: &str, outcome: FetchOutcome, delay: Duration) -> Self {
        self.script.insert(id.to_owned(), (outcome, delay));
        self
    }
}

impl FriendSource for ScriptedSource {
    async fn fetch(&self, account: &Account) -> FetchOutcome {
        match self.script.get(account.id.as_str()) {
            Some((outcome, delay)) => {
                tokio::time::sleep(*delay).await;
                outcome.clone()
            }
            None => FetchOutcome::error("unscripted account"),
        }
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    sent: Arc<Mutex<Vec<String>>>,
    reject_all: bool,
}

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MessageSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if self.reject_all {
            return Err(NotifyError::Transport("connection refused".to_owned()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
        Ok(())
    }
}

struct ReadOnlyStore;

impl SnapshotStore for ReadOnlyStore {
    fn load(&self) -> Snapshot {
        Snapshot::new()
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "friend_counts.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

struct BrokenLatch;

impl RunLatch for BrokenLatch {
    fn check_and_set(&self) -> Result<bool, StoreError> {
        Err(StoreError::Io {
            path: ".initialized".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

/// Counts fetches so a test can assert none were issued.
#[derive(Clone, Default)]
struct CountingSource {
    calls: Arc<Mutex<usize>>,
}

impl FriendSource for CountingSource {
    async fn fetch(&self, _account: &Account) -> FetchOutcome {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        *calls = calls.saturating_add(1);
        FetchOutcome::Count(1)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn roster(ids: &[&str]) -> Roster {
    Roster::new(ids.iter().map(|id| Account::new(*id)))
}

fn snapshot(entries: &[(&str, u64)]) -> Snapshot {
    entries
        .iter()
        .map(|(id, count)| (AccountId::from(*id), *count))
        .collect()
}

fn monitor(
    roster: Roster,
    source: ScriptedSource,
    store: &MemorySnapshotStore,
    latch: &MemoryRunLatch,
    sink: &RecordingSink,
    detail_limit: usize,
) -> Monitor<ScriptedSource, RecordingSink> {
    Monitor::new(
        roster,
        source,
        Box::new(store.clone()),
        Box::new(latch.clone()),
        Notifier::new(sink.clone(), 4000),
        MessageFormatter::new("profiles/", detail_limit).unwrap(),
        Duration::from_secs(10),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn first_run_establishes_baseline_and_summarizes() {
    let store = MemorySnapshotStore::default();
    let latch = MemoryRunLatch::default();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default()
        .with("A", FetchOutcome::Count(3))
        .with("B", FetchOutcome::Count(7));

    let report = monitor(roster(&["A", "B"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert!(report.first_run);
    assert!(report.events.is_empty());
    assert_eq!(report.monitored, 2);
    assert_eq!(report.unavailable, 0);
    assert_eq!(store.current(), snapshot(&[("A", 3), ("B", 7)]));

    let messages = sink.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("Initial Setup Complete"));
    assert!(messages[0].contains("Monitoring 2 accounts"));
    assert!(messages[1].contains("• profiles/A: 3 friends"));
    assert!(messages[1].contains("• profiles/B: 7 friends"));
    assert_eq!(report.messages_sent, 2);
}

#[tokio::test]
async fn first_run_ignores_stale_previous_counts() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 1)]));
    let latch = MemoryRunLatch::default();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default().with("A", FetchOutcome::Count(99));

    let report = monitor(roster(&["A"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert!(report.first_run);
    assert!(report.events.is_empty());
    assert!(sink.messages().iter().all(|m| !m.contains("New Friend Alert")));
}

#[tokio::test]
async fn later_run_reports_increase() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 10)]));
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default().with("A", FetchOutcome::Count(15));

    let report = monitor(roster(&["A"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert!(!report.first_run);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].delta, 5);
    assert_eq!(report.events[0].kind(), ChangeKind::Gained);
    assert_eq!(
        sink.messages(),
        vec!["🎮 <b>New Friend Alert!</b>\n\nprofiles/A: 10 → 15 (+5)".to_owned()]
    );
    assert_eq!(store.current(), snapshot(&[("A", 15)]));
}

#[tokio::test]
async fn private_account_is_dropped_from_snapshot() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 4), ("C", 20)]));
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default()
        .with("A", FetchOutcome::Count(2))
        .with("C", FetchOutcome::Unavailable(UnavailableReason::Private));

    let report = monitor(roster(&["A", "C"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert_eq!(report.unavailable, 1);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].account.id.as_str(), "A");
    assert_eq!(report.events[0].kind(), ChangeKind::Lost);
    assert!(!store.current().contains(&AccountId::from("C")));
    assert_eq!(sink.messages().len(), 1);
    assert!(sink.messages()[0].contains("Friend Removed"));
}

#[tokio::test]
async fn unchanged_counts_send_nothing() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 4), ("B", 8)]));
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default()
        .with("A", FetchOutcome::Count(4))
        .with("B", FetchOutcome::error("503 Service Unavailable"));

    let report = monitor(roster(&["A", "B"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert!(report.events.is_empty());
    assert_eq!(report.messages_sent, 0);
    assert!(sink.messages().is_empty());
    assert_eq!(store.current(), snapshot(&[("A", 4)]));
}

#[tokio::test(start_paused = true)]
async fn events_keep_roster_order_regardless_of_completion_order() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("slow", 1), ("mid", 1), ("fast", 1)]));
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default()
        .delayed("slow", FetchOutcome::Count(2), Duration::from_secs(3))
        .delayed("mid", FetchOutcome::Count(3), Duration::from_secs(2))
        .delayed("fast", FetchOutcome::Count(4), Duration::from_secs(1));

    let report = monitor(roster(&["slow", "mid", "fast"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    let order: Vec<&str> = report.events.iter().map(|e| e.account.id.as_str()).collect();
    assert_eq!(order, vec!["slow", "mid", "fast"]);

    let messages = sink.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("profiles/slow"));
    assert!(messages[2].contains("profiles/fast"));
}

#[tokio::test(start_paused = true)]
async fn hanging_fetch_times_out_without_blocking_others() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 1), ("B", 1)]));
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default()
        .with("A", FetchOutcome::Count(2))
        .delayed("B", FetchOutcome::Count(50), Duration::from_secs(3600));

    let report = monitor(roster(&["A", "B"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert_eq!(report.unavailable, 1);
    assert_eq!(report.events.len(), 1);
    assert_eq!(store.current(), snapshot(&[("A", 2)]));
}

#[tokio::test]
async fn delivery_failures_do_not_fail_the_run() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 1)]));
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink {
        reject_all: true,
        ..RecordingSink::default()
    };
    let source = ScriptedSource::default().with("A", FetchOutcome::Count(5));

    let report = monitor(roster(&["A"]), source, &store, &latch, &sink, 50)
        .run()
        .await
        .unwrap();

    assert_eq!(report.events.len(), 1);
    assert_eq!(report.messages_sent, 0);
    assert_eq!(store.current(), snapshot(&[("A", 5)]));
}

#[tokio::test]
async fn second_run_diffs_against_first() {
    let store = MemorySnapshotStore::default();
    let latch = MemoryRunLatch::default();
    let sink = RecordingSink::default();

    let first = monitor(
        roster(&["A"]),
        ScriptedSource::default().with("A", FetchOutcome::Count(3)),
        &store,
        &latch,
        &sink,
        50,
    )
    .run()
    .await
    .unwrap();
    assert!(first.first_run);

    let second = monitor(
        roster(&["A"]),
        ScriptedSource::default().with("A", FetchOutcome::Count(1)),
        &store,
        &latch,
        &sink,
        50,
    )
    .run()
    .await
    .unwrap();
    assert!(!second.first_run);
    assert_eq!(second.events.len(), 1);
    assert_eq!(second.events[0].delta, -2);
}

#[tokio::test]
async fn large_first_run_roster_skips_listing() {
    let store = MemorySnapshotStore::default();
    let latch = MemoryRunLatch::default();
    let sink = RecordingSink::default();
    let source = ScriptedSource::default()
        .with("A", FetchOutcome::Count(1))
        .with("B", FetchOutcome::Count(2))
        .with("C", FetchOutcome::Unavailable(UnavailableReason::Private));

    let report = monitor(roster(&["A", "B", "C"]), source, &store, &latch, &sink, 1)
        .run()
        .await
        .unwrap();

    assert_eq!(report.monitored, 2);
    assert_eq!(report.unavailable, 1);
    let messages = sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("🔒 1 accounts are private or unreachable"));
}

#[tokio::test]
async fn failed_snapshot_write_is_fatal() {
    let latch = MemoryRunLatch::initialized();
    let sink = RecordingSink::default();
    let monitor = Monitor::new(
        roster(&["A"]),
        ScriptedSource::default().with("A", FetchOutcome::Count(1)),
        Box::new(ReadOnlyStore),
        Box::new(latch),
        Notifier::new(sink.clone(), 4000),
        MessageFormatter::new("profiles/", 50).unwrap(),
        Duration::from_secs(10),
    );

    let result = monitor.run().await;
    assert!(matches!(result, Err(RunError::Store(_))));
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn failed_marker_write_is_fatal_before_any_fetch() {
    let store = MemorySnapshotStore::with_snapshot(snapshot(&[("A", 1)]));
    let sink = RecordingSink::default();
    let source = CountingSource::default();
    let monitor = Monitor::new(
        roster(&["A"]),
        source.clone(),
        Box::new(store.clone()),
        Box::new(BrokenLatch),
        Notifier::new(sink.clone(), 4000),
        MessageFormatter::new("profiles/", 50).unwrap(),
        Duration::from_secs(10),
    );

    let result = monitor.run().await;
    assert!(matches!(result, Err(RunError::Store(_))));
    assert_eq!(*source.calls.lock().unwrap(), 0);
    assert!(sink.messages().is_empty());
    assert_eq!(store.current(), snapshot(&[("A", 1)]));
}
