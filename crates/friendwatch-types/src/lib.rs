//! Shared type definitions for the friendwatch monitor.
//!
//! This crate holds the data model shared by the orchestration core and the
//! runner binary: account identifiers, friend-count snapshots, change events,
//! and fetch outcomes.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed account identifier
//! - [`enums`] -- Change direction, fetch outcomes, run phases
//! - [`structs`] -- Accounts, snapshots, change events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ChangeKind, FetchOutcome, RunPhase, UnavailableReason};
pub use ids::AccountId;
pub use structs::{Account, ChangeEvent, Snapshot};
