//! Enumeration types for the monitor.

use serde::{Deserialize, Serialize};

/// Direction of a friend-count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The account has more friends than at the previous observation.
    Gained,
    /// The account has fewer friends than at the previous observation.
    Lost,
}

/// Why an account produced no count this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum UnavailableReason {
    /// The profile is private (the API answered 403).
    Private,
    /// Any other status, transport failure, timeout, or malformed body.
    Error(String),
}

impl core::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Private => f.write_str("private profile"),
            Self::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// Result of fetching one account's friend count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The friend list was retrieved; the value is its length.
    Count(u64),
    /// No count could be obtained this run.
    Unavailable(UnavailableReason),
}

impl FetchOutcome {
    /// Shorthand for an error outcome with a detail message.
    pub fn error(detail: impl Into<String>) -> Self {
        Self::Unavailable(UnavailableReason::Error(detail.into()))
    }

    /// The friend count, if the fetch succeeded.
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Unavailable(_) => None,
        }
    }
}

/// Phases of a single monitoring run, in execution order.
///
/// The run is strictly linear: `Start -> Loaded -> Fetched -> Diffed ->
/// Persisted -> Notified -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Nothing has happened yet.
    Start,
    /// Previous snapshot and first-run latch have been read.
    Loaded,
    /// Every account fetch has completed.
    Fetched,
    /// Change events have been computed.
    Diffed,
    /// The current snapshot has replaced the previous one on disk.
    Persisted,
    /// All notifications have been attempted.
    Notified,
    /// The run finished.
    Done,
}

impl core::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Loaded => "loaded",
            Self::Fetched => "fetched",
            Self::Diffed => "diffed",
            Self::Persisted => "persisted",
            Self::Notified => "notified",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
