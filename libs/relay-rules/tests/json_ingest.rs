//! Integration tests for structured JSON ingestion
//!
//! Covers the nested object form with legacy long-name aliases, file
//! ingestion of single objects and arrays, and the decode-before-insert
//! guarantee for malformed documents.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use relay_infra::SqliteClient;
use relay_rules::{ingest, ingest_file, IdPolicy, RuleStore, StoreError};
use serde_json::json;

async fn setup_store(policy: IdPolicy) -> RuleStore {
    let client = SqliteClient::memory()
        .await
        .expect("Failed to create in-memory database");
    let store = RuleStore::with_policy(client.pool().clone(), policy);
    store.ensure_schema().await.expect("Failed to create tables");
    store
}

#[tokio::test]
async fn test_ingest_legacy_long_name_object() {
    let store = setup_store(IdPolicy::External).await;

    let value = json!({
        "number": "301",
        "enable": true,
        "name": "door interlock",
        "trigger_method": "level",
        "operators": "AND",
        "trigger_conditions": "==",
        "trigger_value": "1",
        "func_name": "lock",
        "out_network": "192.168.2.50",
        "network1": "192.168.1.50",
        "reg_addr1": "0x3000",
        "data_unit1": "bit",
        "data_bit1": "1",
        "group_data": [
            {
                "index": "0",
                "logical_conditions": "OR",
                "network": "192.168.1.51",
                "reg_addr": "0x3001",
                "data_unit": "bit",
                "data_bit": "1"
            }
        ]
    });

    let id = ingest(&store, &value).await.expect("ingest");
    assert_eq!(id, "301");

    let stored = store.get("301").await.expect("get").expect("rule present");
    assert_eq!(stored.trg_mtd.as_deref(), Some("level"));
    assert_eq!(stored.ops.as_deref(), Some("AND"));
    assert_eq!(stored.out_net.as_deref(), Some("192.168.2.50"));
    assert_eq!(stored.net.as_deref(), Some("192.168.1.50"));
    assert_eq!(stored.data_addr.as_deref(), Some("0x3000"));
    assert_eq!(stored.grp_data.len(), 1);
    assert_eq!(stored.grp_data[0].lgcl_cnds.as_deref(), Some("OR"));
    assert_eq!(stored.grp_data[0].data_addr.as_deref(), Some("0x3001"));
}

#[tokio::test]
async fn test_ingest_assigns_id_under_generated_policy() {
    let store = setup_store(IdPolicy::Generated).await;

    let id = ingest(&store, &json!({ "name": "vent" })).await.expect("ingest");
    assert_eq!(id, "1");
}

#[tokio::test]
async fn test_ingest_file_with_array() {
    let store = setup_store(IdPolicy::External).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rules.json");
    let document = json!([
        { "id": "401", "name": "first" },
        { "id": "402", "name": "second", "grp_data": [{ "index": "0" }] }
    ]);
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).expect("write json");

    let ids = ingest_file(&store, &path).await.expect("ingest file");
    assert_eq!(ids, vec!["401".to_string(), "402".to_string()]);
    assert_eq!(store.count().await.expect("count"), 2);

    let second = store.get("402").await.expect("get").expect("rule present");
    assert_eq!(second.grp_data.len(), 1);
}

#[tokio::test]
async fn test_ingest_file_with_single_object() {
    let store = setup_store(IdPolicy::External).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rule.json");
    std::fs::write(&path, r#"{ "id": "403", "name": "solo" }"#).expect("write json");

    let ids = ingest_file(&store, &path).await.expect("ingest file");
    assert_eq!(ids, vec!["403".to_string()]);
}

#[tokio::test]
async fn test_malformed_document_changes_nothing() {
    let store = setup_store(IdPolicy::External).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rules.json");
    // Second element has a group in the wrong shape; decode fails before
    // any insert happens
    let document = json!([
        { "id": "404", "name": "good" },
        { "id": "405", "grp_data": "not an array" }
    ]);
    std::fs::write(&path, serde_json::to_string(&document).unwrap()).expect("write json");

    let err = ingest_file(&store, &path).await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
    assert_eq!(store.count().await.expect("count"), 0);
}

#[tokio::test]
async fn test_duplicate_mid_array_keeps_earlier_inserts() {
    let store = setup_store(IdPolicy::External).await;
    ingest(&store, &json!({ "id": "502", "name": "existing" }))
        .await
        .expect("ingest");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rules.json");
    let document = json!([
        { "id": "501", "name": "first" },
        { "id": "502", "name": "collides" },
        { "id": "503", "name": "never lands" }
    ]);
    std::fs::write(&path, serde_json::to_string(&document).unwrap()).expect("write json");

    let err = ingest_file(&store, &path).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(ref id) if id == "502"));

    assert!(store.get("501").await.expect("get").is_some());
    assert!(store.get("503").await.expect("get").is_none());
    let existing = store.get("502").await.expect("get").expect("rule present");
    assert_eq!(existing.name.as_deref(), Some("existing"));
}

#[tokio::test]
async fn test_scalar_document_is_rejected() {
    let store = setup_store(IdPolicy::External).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("rules.json");
    std::fs::write(&path, r#""just a string""#).expect("write json");

    let err = ingest_file(&store, &path).await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}
