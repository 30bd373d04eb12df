//! Account roster loading.
//!
//! The roster is a YAML document listing the accounts to monitor, in the
//! order notifications should follow:
//!
//! ```yaml
//! accounts:
//!   - 76561199419240292
//!   - "76561199528974295"
//!   - id: 76561199418027556
//!     label: Main
//! ```
//!
//! Entries may be bare identifiers (quoted or not) or `{ id, label }`
//! mappings. Duplicate identifiers are dropped, keeping the first.

use std::collections::HashSet;
use std::path::Path;

use friendwatch_types::{Account, AccountId};
use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading the roster.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the roster file from disk.
    #[error("failed to read roster file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse roster YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An entry is unusable (e.g. a blank identifier).
    #[error("invalid roster entry at position {index}: {reason}")]
    InvalidAccount {
        /// Zero-based position of the entry in the file.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    accounts: Vec<RosterEntry>,
}

/// Steam IDs written without quotes arrive as integers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterEntry {
    Numeric(u64),
    Text(String),
    Detailed {
        id: RawId,
        #[serde(default)]
        label: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Numeric(u64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            Self::Numeric(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl RosterEntry {
    fn into_account(self, index: usize) -> Result<Account, ConfigError> {
        let (id, label) = match self {
            Self::Numeric(n) => (n.to_string(), None),
            Self::Text(s) => (s, None),
            Self::Detailed { id, label } => (id.into_string(), label),
        };

        let id = id.trim();
        if id.is_empty() {
            return Err(ConfigError::InvalidAccount {
                index,
                reason: "identifier is blank".to_owned(),
            });
        }

        let label = label
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());

        Ok(Account {
            id: AccountId::from(id),
            label,
        })
    }
}

/// The ordered, de-duplicated list of accounts to monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    accounts: Vec<Account>,
}

impl Roster {
    /// Build a roster, dropping repeated identifiers after their first
    /// occurrence.
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for account in accounts {
            if seen.insert(account.id.clone()) {
                kept.push(account);
            } else {
                warn!(account = %account.id, "duplicate roster entry ignored");
            }
        }
        Self { accounts: kept }
    }

    /// Load the roster from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::InvalidAccount`] for a blank identifier.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a roster from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidAccount`] for a blank identifier.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: RosterFile = serde_yml::from_str(yaml)?;
        let accounts = file
            .accounts
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_account(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(accounts))
    }

    /// Accounts in configured order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Number of monitored accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the roster has no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
