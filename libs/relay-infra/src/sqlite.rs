//! SQLite client module
//!
//! Pool construction with pragmas suitable for a single-writer gateway
//! database, plus small maintenance helpers.

pub mod client;

pub use client::{SqliteClient, SqlitePool};
