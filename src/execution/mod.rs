//! Execution output types.

pub mod result;

pub use result::QueryResult;
