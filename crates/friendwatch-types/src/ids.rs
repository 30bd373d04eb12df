//! Type-safe wrapper around the external account identifier.
//!
//! The social-graph API identifies accounts by an opaque token (a 64-bit
//! Steam ID rendered as decimal text). It is kept as a string so that the
//! persisted state file stays a plain `{ "id": count }` JSON object.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a monitored account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an identifier token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_string() {
        let id = AccountId::from("76561199419240292");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"76561199419240292\"");
    }

    #[test]
    fn display_matches_token() {
        let id = AccountId::new(String::from("abc"));
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
    }
}
