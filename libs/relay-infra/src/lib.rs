//! Relay Infrastructure Layer
//!
//! This library provides database infrastructure for RelayEMS:
//! - SQLite client with settings tuned for edge gateways
//!
//! The rule store and exchange codecs live in `relay-rules`; this crate
//! only knows how to build and maintain connection pools.

pub mod sqlite;

pub use sqlite::{SqliteClient, SqlitePool};
