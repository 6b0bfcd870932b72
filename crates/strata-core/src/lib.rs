//! strata-core — Core library for the strata version tracker.
//!
//! Strata records a working directory as an ever-incrementing linear
//! sequence of **versions**. Each version is a self-contained, full
//! copy of every tracked file; there are no deltas, branches, or
//! merges. The three moving parts are the snapshot store (version
//! derivation), the history log (append-only version/message ledger),
//! and the checkout engine (working-directory reconciliation).

pub mod error;
pub mod fsutil;
pub mod history;
pub mod repo;

pub use error::{StrataError, StrataResult};
pub use history::{HistoryLog, LogEntry};
pub use repo::Repository;
