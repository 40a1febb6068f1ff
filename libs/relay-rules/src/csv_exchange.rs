//! Flat-file rule exchange
//!
//! One CSV row per rule. Parent scalars are plain columns; the ordered
//! condition group travels embedded in the trailing `grp_data` column as
//! a JSON array. `enable` uses the `True` / `False` literals with an
//! empty cell for absent, which is what the legacy flat files carry.

use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::store::{RuleStore, UpsertOutcome};
use crate::types::{GroupEntry, Rule};

/// Flat file column order; `grp_data` is always last
pub const CSV_HEADER: [&str; 18] = [
    "id",
    "enable",
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
    "grp_data",
];

/// Counts from one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Raw flat-file row; every cell arrives as text
#[derive(Debug, Deserialize)]
struct FlatRule {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    enable: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    trg_mtd: Option<String>,
    #[serde(default)]
    ops: Option<String>,
    #[serde(default)]
    trg_cnds: Option<String>,
    #[serde(default)]
    trg_val: Option<String>,
    #[serde(default)]
    func_name: Option<String>,
    #[serde(default)]
    out_net: Option<String>,
    #[serde(default)]
    out_reg_addr: Option<String>,
    #[serde(default)]
    out_data_unit: Option<String>,
    #[serde(default)]
    out_data_bit: Option<String>,
    #[serde(default)]
    net: Option<String>,
    #[serde(default)]
    data_addr: Option<String>,
    #[serde(default)]
    data_unit: Option<String>,
    #[serde(default)]
    data_bit: Option<String>,
    #[serde(default)]
    grp_data: Option<String>,
}

/// Export every rule to a flat file, returning the rule count
///
/// Rows are serialized to memory first and the file written once at the
/// end, so an encoding failure reports before any bytes land on disk.
/// An empty store still produces the header row.
pub async fn export_csv(store: &RuleStore, path: &Path) -> Result<usize> {
    let rules = store.list_all().await?;

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for rule in &rules {
        wtr.write_record(rule_to_record(rule)?)?;
    }
    wtr.flush()?;

    let buf = wtr.into_inner().map_err(|e| StoreError::Csv(e.to_string()))?;
    tokio::fs::write(path, buf).await?;

    info!("Exported {} rules to {}", rules.len(), path.display());
    Ok(rules.len())
}

/// Import a flat file, upserting row by row in file order
///
/// The first bad row aborts with [`StoreError::Import`] carrying its
/// 1-based data-row index; rows already applied stay applied. Importing
/// the same file twice is idempotent.
pub async fn import_csv(store: &RuleStore, path: &Path) -> Result<ImportSummary> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let mut summary = ImportSummary::default();
    for (pos, result) in rdr.deserialize::<FlatRule>().enumerate() {
        let row = pos + 1;
        let flat = result.map_err(|e| StoreError::Import {
            row,
            reason: e.to_string(),
        })?;
        let (id, rule) = flat_to_rule(flat).map_err(|reason| StoreError::Import { row, reason })?;

        let outcome = store.upsert(&id, &rule).await.map_err(|e| StoreError::Import {
            row,
            reason: e.to_string(),
        })?;
        match outcome {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
        }
    }

    info!(
        "Imported {} rules from {} ({} inserted, {} updated)",
        summary.total(),
        path.display(),
        summary.inserted,
        summary.updated
    );
    Ok(summary)
}

/// One rule as a flat record in header order
fn rule_to_record(rule: &Rule) -> Result<Vec<String>> {
    let grp_json = serde_json::to_string(&rule.grp_data)?;

    Ok(vec![
        rule.id.clone().unwrap_or_default(),
        encode_enable(rule.enable).to_string(),
        rule.name.clone().unwrap_or_default(),
        rule.mode.clone().unwrap_or_default(),
        rule.trg_mtd.clone().unwrap_or_default(),
        rule.ops.clone().unwrap_or_default(),
        rule.trg_cnds.clone().unwrap_or_default(),
        rule.trg_val.clone().unwrap_or_default(),
        rule.func_name.clone().unwrap_or_default(),
        rule.out_net.clone().unwrap_or_default(),
        rule.out_reg_addr.clone().unwrap_or_default(),
        rule.out_data_unit.clone().unwrap_or_default(),
        rule.out_data_bit.clone().unwrap_or_default(),
        rule.net.clone().unwrap_or_default(),
        rule.data_addr.clone().unwrap_or_default(),
        rule.data_unit.clone().unwrap_or_default(),
        rule.data_bit.clone().unwrap_or_default(),
        grp_json,
    ])
}

/// Turn a raw row into the target id plus a storable rule
fn flat_to_rule(flat: FlatRule) -> std::result::Result<(String, Rule), String> {
    let id = match flat.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => return Err("missing rule id".to_string()),
    };

    let grp_data: Vec<GroupEntry> = match flat.grp_data.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(json) => serde_json::from_str(json).map_err(|e| format!("malformed grp_data: {e}"))?,
    };

    let rule = Rule {
        id: Some(id.clone()),
        enable: decode_enable(flat.enable.as_deref().unwrap_or("")),
        name: flat.name,
        mode: flat.mode,
        trg_mtd: flat.trg_mtd,
        ops: flat.ops,
        trg_cnds: flat.trg_cnds,
        trg_val: flat.trg_val,
        func_name: flat.func_name,
        out_net: flat.out_net,
        out_reg_addr: flat.out_reg_addr,
        out_data_unit: flat.out_data_unit,
        out_data_bit: flat.out_data_bit,
        net: flat.net,
        data_addr: flat.data_addr,
        data_unit: flat.data_unit,
        data_bit: flat.data_bit,
        grp_data,
    };

    Ok((id, rule))
}

fn encode_enable(enable: Option<bool>) -> &'static str {
    match enable {
        Some(true) => "True",
        Some(false) => "False",
        None => "",
    }
}

/// Case-insensitive `true` enables; empty is absent; anything else disables
fn decode_enable(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.eq_ignore_ascii_case("true"))
    }
}
