//! Change detection and notification pipeline for friendwatch.
//!
//! This crate holds everything between the roster and the wire: the
//! snapshot store and first-run latch, the diff engine, message chunking
//! and templating, and the [`Monitor`](monitor::Monitor) that sequences a
//! run. Network access is abstracted behind [`FriendSource`] and
//! [`MessageSink`] so the whole pipeline runs against stand-ins in tests.
//!
//! # Modules
//!
//! - [`roster`] -- YAML roster loading and de-duplication
//! - [`store`] -- Snapshot persistence and the first-run marker
//! - [`source`] -- Friend-count lookup trait
//! - [`diff`] -- Snapshot comparison
//! - [`chunk`] -- Line-aware message splitting
//! - [`templates`] -- Notification text rendering
//! - [`notify`] -- Chunked, failure-tolerant delivery
//! - [`monitor`] -- Run orchestration

pub mod chunk;
pub mod diff;
pub mod monitor;
pub mod notify;
pub mod roster;
pub mod source;
pub mod store;
pub mod templates;

pub use monitor::{Monitor, RunError, RunReport};
pub use notify::{MessageSink, Notifier, NotifyError};
pub use roster::{ConfigError, Roster};
pub use source::FriendSource;
pub use store::{
    FileRunLatch, FileSnapshotStore, MemoryRunLatch, MemorySnapshotStore, RunLatch,
    SnapshotStore, StoreError,
};
pub use templates::{MessageFormatter, TemplateError};
