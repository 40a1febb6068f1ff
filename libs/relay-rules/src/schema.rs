//! Database schema definitions
//!
//! Two-table layout: the `rules` parent table and the `rule_group_data`
//! child table with a cascade foreign key and an explicit `position`
//! column. `position` is the only ordering truth for group entries.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// Rules table
///
/// `enable` is a nullable BOOLEAN; the `True`/`False` text convention
/// belongs to the flat exchange format, not to storage.
pub const RULES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS rules (
        id TEXT PRIMARY KEY,
        enable BOOLEAN,
        name TEXT,
        mode TEXT,
        trg_mtd TEXT,
        ops TEXT,
        trg_cnds TEXT,
        trg_val TEXT,
        func_name TEXT,
        out_net TEXT,
        out_reg_addr TEXT,
        out_data_unit TEXT,
        out_data_bit TEXT,
        net TEXT,
        data_addr TEXT,
        data_unit TEXT,
        data_bit TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Condition group table
///
/// `item_index` holds the caller's sequence label verbatim ("index" is a
/// reserved word in most SQL dialects).
pub const RULE_GROUP_DATA_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS rule_group_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        rule_id TEXT NOT NULL,
        item_index TEXT,
        lgcl_cnds TEXT,
        net TEXT,
        data_addr TEXT,
        data_unit TEXT,
        data_bit TEXT,
        position INTEGER NOT NULL,
        FOREIGN KEY (rule_id) REFERENCES rules(id) ON DELETE CASCADE
    )
"#;

/// Create both tables and the child lookup index if absent.
///
/// Idempotent; safe to call on every process start.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(RULES_TABLE).execute(pool).await?;
    sqlx::query(RULE_GROUP_DATA_TABLE).execute(pool).await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_rule_group_data_rule ON rule_group_data(rule_id)",
    )
    .execute(pool)
    .await?;

    debug!("Rule tables ready");
    Ok(())
}
