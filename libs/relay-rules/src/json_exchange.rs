//! Structured rule exchange
//!
//! Accepts the nested object form, either as in-memory `serde_json`
//! values or from a file holding one rule object or an array of them.
//! Long-name field aliases are accepted on input; output always carries
//! the short canonical names.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::store::RuleStore;
use crate::types::Rule;

/// Decode one nested rule object
///
/// Unknown keys are ignored; a type mismatch on a known key fails the
/// whole rule.
pub fn rule_from_value(value: &Value) -> Result<Rule> {
    Ok(serde_json::from_value(value.clone())?)
}

/// Decode and insert one rule, returning the stored id
pub async fn ingest(store: &RuleStore, value: &Value) -> Result<String> {
    let rule = rule_from_value(value)?;
    store.insert(&rule).await
}

/// Insert every rule in a JSON file, returning the stored ids in order
///
/// The file holds either a single rule object or an array of them. All
/// elements are decoded before any insert, so a malformed document
/// changes nothing; an insert failure mid-array leaves earlier inserts
/// applied.
pub async fn ingest_file(store: &RuleStore, path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    let document: Value = serde_json::from_str(&content)?;

    let rules: Vec<Rule> = match document {
        arr @ Value::Array(_) => serde_json::from_value(arr)?,
        obj @ Value::Object(_) => vec![serde_json::from_value(obj)?],
        _ => {
            return Err(StoreError::Serialization(
                "rule document must be an object or an array".to_string(),
            ))
        },
    };

    let mut ids = Vec::with_capacity(rules.len());
    for rule in &rules {
        ids.push(store.insert(rule).await?);
    }

    info!("Ingested {} rules from {}", ids.len(), path.display());
    Ok(ids)
}
