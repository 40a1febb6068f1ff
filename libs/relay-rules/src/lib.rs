//! Relay Rules - Rule Persistence and Exchange Library
//!
//! SQLite-backed storage for relay linkage rules providing:
//! - Two-table persistence (rules + ordered condition groups)
//! - Atomic CRUD with whole-rule replacement semantics
//! - Flat CSV exchange with the condition group embedded as JSON
//! - Structured JSON ingestion accepting legacy long-name aliases
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │ csv_exchange │────▶│              │     ┌────────────────┐
//! └──────────────┘     │  RuleStore   │────▶│     SQLite     │
//! ┌──────────────┐     │ (tx per op)  │     │ rules +        │
//! │ json_exchange│────▶│              │     │ rule_group_data│
//! └──────────────┘     └──────────────┘     └────────────────┘
//! ```

mod config;
pub mod csv_exchange;
mod error;
pub mod json_exchange;
pub mod schema;
mod store;
pub mod types;

// Re-export public API
pub use config::StoreConfig;
pub use csv_exchange::{export_csv, import_csv, ImportSummary, CSV_HEADER};
pub use error::{Result, StoreError};
pub use json_exchange::{ingest, ingest_file, rule_from_value};
pub use schema::ensure_schema;
pub use store::{RuleStore, UpsertOutcome};

// Re-export rule types for convenience
pub use types::{GroupEntry, IdPolicy, Rule};
