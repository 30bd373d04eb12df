//! Core data structs: accounts, snapshots, and change events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::ChangeKind;
use crate::ids::AccountId;

/// A monitored account, supplied by the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// External identifier passed to the social-graph API.
    pub id: AccountId,
    /// Optional human-readable label used in notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Account {
    /// Create an account without a label.
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    /// Attach a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Friend counts keyed by account, observed at one point in time.
///
/// Serializes as a flat JSON object (`{"76561...": 42}`), which is the
/// on-disk state format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<AccountId, u64>);

impl Snapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count for an account, replacing any earlier value.
    pub fn insert(&mut self, id: AccountId, count: u64) {
        self.0.insert(id, count);
    }

    /// Look up the count for an account.
    pub fn get(&self, id: &AccountId) -> Option<u64> {
        self.0.get(id).copied()
    }

    /// Whether the account has a recorded count.
    pub fn contains(&self, id: &AccountId) -> bool {
        self.0.contains_key(id)
    }

    /// Number of accounts with a recorded count.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no counts are recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AccountId, u64)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (AccountId, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A detected change in an account's friend count between two runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The account that changed.
    pub account: Account,
    /// Count from the previous snapshot.
    pub previous: u64,
    /// Count from the current snapshot.
    pub current: u64,
    /// `current - previous`; positive for gains, negative for losses.
    pub delta: i64,
}

impl ChangeEvent {
    /// Build an event from two differing counts.
    ///
    /// Returns `None` when the counts are equal.
    pub fn between(account: Account, previous: u64, current: u64) -> Option<Self> {
        let delta = if current > previous {
            i64::try_from(current.abs_diff(previous)).unwrap_or(i64::MAX)
        } else if current < previous {
            i64::try_from(current.abs_diff(previous))
                .map_or(i64::MIN, |magnitude| magnitude.saturating_neg())
        } else {
            return None;
        };
        Some(Self {
            account,
            previous,
            current,
            delta,
        })
    }

    /// Whether friends were gained or lost.
    pub const fn kind(&self) -> ChangeKind {
        if self.delta > 0 {
            ChangeKind::Gained
        } else {
            ChangeKind::Lost
        }
    }

    /// Size of the change regardless of direction.
    pub const fn magnitude(&self) -> u64 {
        self.delta.unsigned_abs()
    }
}
