//! Error types for the friendwatch binary.
//!
//! [`WatchError`] wraps every failure that can stop a run before or during
//! execution, giving `main` a single type to propagate with `?`.

use friendwatch_core::{ConfigError, RunError, TemplateError};

/// Top-level error for the friendwatch binary.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// An environment variable is missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// An HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// The roster file could not be loaded.
    #[error("roster error: {source}")]
    Roster {
        /// The underlying roster error.
        #[from]
        source: ConfigError,
    },

    /// Message templates could not be loaded.
    #[error("template error: {source}")]
    Template {
        /// The underlying template error.
        #[from]
        source: TemplateError,
    },

    /// The run failed fatally.
    #[error("run error: {source}")]
    Run {
        /// The underlying run error.
        #[from]
        source: RunError,
    },
}
