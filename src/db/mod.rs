//! Local persistence for analysis history.
//!
//! Storage is optional: the pipeline runs without it and a failed write is
//! only logged.

pub mod history;

pub use history::{HistoryEntry, HistoryStatus, HistoryStore};
