//! Rule store - SQLite persistence for rules
//!
//! Parent rows live in `rules`, condition groups in `rule_group_data`.
//! Every mutating operation runs inside a transaction so a failure never
//! leaves a parent without its group or half a group behind. Group order
//! is written from array position and read back via `ORDER BY position`.

use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use relay_infra::SqliteClient;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::schema;
use crate::types::{GroupEntry, IdPolicy, Rule};

/// Parent columns accepted by [`RuleStore::find_by_field`].
///
/// Every name here is a fixed `rules` column; the match below is what
/// keeps caller input out of the SQL text.
const QUERYABLE_FIELDS: &[&str] = &[
    "id",
    "name",
    "mode",
    "trg_mtd",
    "ops",
    "trg_cnds",
    "trg_val",
    "func_name",
    "out_net",
    "out_reg_addr",
    "out_data_unit",
    "out_data_bit",
    "net",
    "data_addr",
    "data_unit",
    "data_bit",
];

/// Whether an upsert created the rule or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// SQLite-backed rule store
#[derive(Clone)]
pub struct RuleStore {
    pool: SqlitePool,
    policy: IdPolicy,
}

impl RuleStore {
    /// Create a store over an existing pool with the external id policy
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_policy(pool, IdPolicy::External)
    }

    /// Create a store over an existing pool with an explicit id policy
    pub fn with_policy(pool: SqlitePool, policy: IdPolicy) -> Self {
        Self { pool, policy }
    }

    /// Open the configured database file and prepare the schema
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let client = SqliteClient::new(&config.db_path)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let store = Self::with_policy(client.pool().clone(), config.id_policy);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create both tables and indexes if absent; idempotent
    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn policy(&self) -> IdPolicy {
        self.policy
    }

    /// Insert a new rule and its group entries, returning the stored id
    ///
    /// Under [`IdPolicy::External`] the rule must carry an id and a
    /// duplicate id is rejected without touching the existing row. Under
    /// [`IdPolicy::Generated`] any caller id is ignored and the store
    /// assigns the next sequential number.
    pub async fn insert(&self, rule: &Rule) -> Result<String> {
        let mut tx = self.pool.begin().await?;

        let id = match self.policy {
            IdPolicy::External => rule.id.clone().ok_or_else(|| {
                StoreError::InvalidRule("id required under external id policy".to_string())
            })?,
            IdPolicy::Generated => {
                if let Some(supplied) = &rule.id {
                    debug!("Ignoring caller id {}: store assigns identifiers", supplied);
                }
                next_generated_id(&mut tx).await?
            },
        };

        if rule_exists(&mut tx, &id).await? {
            return Err(StoreError::DuplicateKey(id));
        }

        insert_parent(&mut tx, &id, rule).await?;
        insert_group(&mut tx, &id, &rule.grp_data).await?;
        tx.commit().await?;

        info!("Rule {} inserted with {} group entries", id, rule.grp_data.len());
        Ok(id)
    }

    /// Replace an existing rule wholesale
    ///
    /// The previous group entries are dropped and the new list written in
    /// its order, so an empty `grp_data` leaves the rule with no group.
    /// The id on the rule body is ignored; `id` names the target row.
    pub async fn update(&self, id: &str, rule: &Rule) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        replace_in_tx(&mut tx, id, rule).await?;
        tx.commit().await?;

        info!("Rule {} updated with {} group entries", id, rule.grp_data.len());
        Ok(())
    }

    /// Fetch one rule with its group entries in stored order
    pub async fn get(&self, id: &str) -> Result<Option<Rule>> {
        let row = sqlx::query(
            r#"
            SELECT id, enable, name, mode, trg_mtd, ops, trg_cnds, trg_val, func_name,
                   out_net, out_reg_addr, out_data_unit, out_data_bit,
                   net, data_addr, data_unit, data_bit
            FROM rules
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut rule = hydrate_rule(&row)?;
        rule.grp_data = self.group_of(id).await?;
        Ok(Some(rule))
    }

    /// Fetch every rule, ordered by id
    pub async fn list_all(&self) -> Result<Vec<Rule>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM rules ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut rules = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(rule) = self.get(&id).await? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }

    /// Delete a rule and its group entries
    ///
    /// Returns `false` when the id is unknown; deleting nothing is not an
    /// error.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM rule_group_data WHERE rule_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("delete group of rule {id}: {e}")))?;

        let result = sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("delete rule {id}: {e}")))?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            debug!("Delete of unknown rule {} is a no-op", id);
            Ok(false)
        } else {
            info!("Rule {} deleted", id);
            Ok(true)
        }
    }

    /// Find rules whose `field` column equals `value`, ordered by id
    ///
    /// Only parent scalar columns are searchable; anything else is an
    /// [`StoreError::InvalidQuery`].
    pub async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<Rule>> {
        let column = QUERYABLE_FIELDS
            .iter()
            .find(|c| **c == field)
            .ok_or_else(|| StoreError::InvalidQuery(field.to_string()))?;

        // column is one of the fixed names above, never caller input
        let sql = format!("SELECT id FROM rules WHERE {column} = ? ORDER BY id");
        let ids: Vec<String> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        let mut rules = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(rule) = self.get(&id).await? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }

    /// Insert the rule under `id`, or replace it if that id already exists
    ///
    /// The explicit id wins under both policies; this is what lets an
    /// exported file restore into a generated-id store without renumbering.
    pub async fn upsert(&self, id: &str, rule: &Rule) -> Result<UpsertOutcome> {
        let mut tx = self.pool.begin().await?;

        let outcome = if rule_exists(&mut tx, id).await? {
            replace_in_tx(&mut tx, id, rule).await?;
            UpsertOutcome::Updated
        } else {
            insert_parent(&mut tx, id, rule).await?;
            insert_group(&mut tx, id, &rule.grp_data).await?;
            UpsertOutcome::Inserted
        };

        tx.commit().await?;

        debug!("Rule {} upserted ({:?})", id, outcome);
        Ok(outcome)
    }

    /// Number of stored rules
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rules")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Delete every rule and group entry, returning the rule count removed
    pub async fn clear(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM rule_group_data").execute(&mut *tx).await?;
        let result = sqlx::query("DELETE FROM rules").execute(&mut *tx).await?;

        tx.commit().await?;

        let removed = result.rows_affected();
        info!("Cleared {} rules", removed);
        Ok(removed)
    }

    /// Group entries for one rule in write order
    async fn group_of(&self, rule_id: &str) -> Result<Vec<GroupEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT item_index, lgcl_cnds, net, data_addr, data_unit, data_bit
            FROM rule_group_data
            WHERE rule_id = ?
            ORDER BY position
            "#,
        )
        .bind(rule_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(hydrate_entry(&row)?);
        }
        Ok(entries)
    }
}

/// Next sequential id: one past the highest numeric id in the table
async fn next_generated_id(tx: &mut Transaction<'_, Sqlite>) -> Result<String> {
    let max: Option<i64> = sqlx::query_scalar("SELECT MAX(CAST(id AS INTEGER)) FROM rules")
        .fetch_one(&mut **tx)
        .await?;
    Ok((max.unwrap_or(0) + 1).to_string())
}

async fn rule_exists(tx: &mut Transaction<'_, Sqlite>, id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rules WHERE id = ?")
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(count > 0)
}

async fn insert_parent(tx: &mut Transaction<'_, Sqlite>, id: &str, rule: &Rule) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rules (
            id, enable, name, mode, trg_mtd, ops, trg_cnds, trg_val, func_name,
            out_net, out_reg_addr, out_data_unit, out_data_bit,
            net, data_addr, data_unit, data_bit
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(rule.enable)
    .bind(&rule.name)
    .bind(&rule.mode)
    .bind(&rule.trg_mtd)
    .bind(&rule.ops)
    .bind(&rule.trg_cnds)
    .bind(&rule.trg_val)
    .bind(&rule.func_name)
    .bind(&rule.out_net)
    .bind(&rule.out_reg_addr)
    .bind(&rule.out_data_unit)
    .bind(&rule.out_data_bit)
    .bind(&rule.net)
    .bind(&rule.data_addr)
    .bind(&rule.data_unit)
    .bind(&rule.data_bit)
    .execute(&mut **tx)
    .await
    .map_err(|e| StoreError::Storage(format!("insert rule {id}: {e}")))?;

    Ok(())
}

/// Write group entries with `position` taken from array order
async fn insert_group(
    tx: &mut Transaction<'_, Sqlite>,
    rule_id: &str,
    entries: &[GroupEntry],
) -> Result<()> {
    for (position, entry) in entries.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO rule_group_data (
                rule_id, item_index, lgcl_cnds, net, data_addr, data_unit, data_bit, position
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule_id)
        .bind(&entry.index)
        .bind(&entry.lgcl_cnds)
        .bind(&entry.net)
        .bind(&entry.data_addr)
        .bind(&entry.data_unit)
        .bind(&entry.data_bit)
        .bind(position as i64)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            StoreError::Storage(format!("insert group entry {position} of rule {rule_id}: {e}"))
        })?;
    }

    Ok(())
}

/// Replace parent scalars and rewrite the whole group
async fn replace_in_tx(tx: &mut Transaction<'_, Sqlite>, id: &str, rule: &Rule) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE rules SET
            enable = ?, name = ?, mode = ?, trg_mtd = ?, ops = ?, trg_cnds = ?,
            trg_val = ?, func_name = ?, out_net = ?, out_reg_addr = ?,
            out_data_unit = ?, out_data_bit = ?, net = ?, data_addr = ?,
            data_unit = ?, data_bit = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(rule.enable)
    .bind(&rule.name)
    .bind(&rule.mode)
    .bind(&rule.trg_mtd)
    .bind(&rule.ops)
    .bind(&rule.trg_cnds)
    .bind(&rule.trg_val)
    .bind(&rule.func_name)
    .bind(&rule.out_net)
    .bind(&rule.out_reg_addr)
    .bind(&rule.out_data_unit)
    .bind(&rule.out_data_bit)
    .bind(&rule.net)
    .bind(&rule.data_addr)
    .bind(&rule.data_unit)
    .bind(&rule.data_bit)
    .bind(id)
    .execute(&mut **tx)
    .await
    .map_err(|e| StoreError::Storage(format!("update rule {id}: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id.to_string()));
    }

    sqlx::query("DELETE FROM rule_group_data WHERE rule_id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::Storage(format!("replace group of rule {id}: {e}")))?;

    insert_group(tx, id, &rule.grp_data).await?;
    Ok(())
}

/// Hydrate a parent row; `grp_data` is filled by the caller
fn hydrate_rule(row: &SqliteRow) -> Result<Rule> {
    Ok(Rule {
        id: Some(row.try_get("id")?),
        enable: row.try_get("enable")?,
        name: row.try_get("name")?,
        mode: row.try_get("mode")?,
        trg_mtd: row.try_get("trg_mtd")?,
        ops: row.try_get("ops")?,
        trg_cnds: row.try_get("trg_cnds")?,
        trg_val: row.try_get("trg_val")?,
        func_name: row.try_get("func_name")?,
        out_net: row.try_get("out_net")?,
        out_reg_addr: row.try_get("out_reg_addr")?,
        out_data_unit: row.try_get("out_data_unit")?,
        out_data_bit: row.try_get("out_data_bit")?,
        net: row.try_get("net")?,
        data_addr: row.try_get("data_addr")?,
        data_unit: row.try_get("data_unit")?,
        data_bit: row.try_get("data_bit")?,
        grp_data: Vec::new(),
    })
}

fn hydrate_entry(row: &SqliteRow) -> Result<GroupEntry> {
    Ok(GroupEntry {
        index: row.try_get("item_index")?,
        lgcl_cnds: row.try_get("lgcl_cnds")?,
        net: row.try_get("net")?,
        data_addr: row.try_get("data_addr")?,
        data_unit: row.try_get("data_unit")?,
        data_bit: row.try_get("data_bit")?,
    })
}
