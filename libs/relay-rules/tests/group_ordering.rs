//! Integration tests for condition group ordering
//!
//! Group entries must read back in insertion order regardless of their
//! caller-supplied index labels, across inserts, updates, and rewrites.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use relay_infra::SqliteClient;
use relay_rules::{GroupEntry, Rule, RuleStore};

async fn setup_store() -> RuleStore {
    let client = SqliteClient::memory()
        .await
        .expect("Failed to create in-memory database");
    let store = RuleStore::new(client.pool().clone());
    store.ensure_schema().await.expect("Failed to create tables");
    store
}

fn labeled_entry(label: &str, data_addr: &str) -> GroupEntry {
    GroupEntry {
        index: Some(label.to_string()),
        lgcl_cnds: Some("OR".to_string()),
        net: Some("192.168.1.30".to_string()),
        data_addr: Some(data_addr.to_string()),
        data_unit: None,
        data_bit: None,
    }
}

fn rule_with_group(id: &str, entries: Vec<GroupEntry>) -> Rule {
    Rule {
        id: Some(id.to_string()),
        enable: Some(true),
        name: Some("group ordering".to_string()),
        grp_data: entries,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_ten_entries_read_back_in_insertion_order() {
    let store = setup_store().await;

    let entries: Vec<GroupEntry> = (1..=10)
        .map(|i| labeled_entry(&i.to_string(), &format!("0x10{i:02}")))
        .collect();
    store
        .insert(&rule_with_group("1002", entries.clone()))
        .await
        .expect("insert");

    let stored = store.get("1002").await.expect("get").expect("rule present");
    assert_eq!(stored.grp_data, entries);
}

#[tokio::test]
async fn test_insertion_order_wins_over_index_labels() {
    let store = setup_store().await;

    // Labels are arbitrary caller data, deliberately not monotonic
    let entries = vec![
        labeled_entry("9", "0x1000"),
        labeled_entry("2", "0x1001"),
        labeled_entry("7", "0x1002"),
    ];
    store
        .insert(&rule_with_group("1003", entries))
        .await
        .expect("insert");

    let stored = store.get("1003").await.expect("get").expect("rule present");
    let labels: Vec<&str> = stored
        .grp_data
        .iter()
        .filter_map(|e| e.index.as_deref())
        .collect();
    assert_eq!(labels, vec!["9", "2", "7"]);
}

#[tokio::test]
async fn test_update_rewrites_order() {
    let store = setup_store().await;

    let original = vec![
        labeled_entry("a", "0x1000"),
        labeled_entry("b", "0x1001"),
        labeled_entry("c", "0x1002"),
    ];
    store
        .insert(&rule_with_group("1004", original.clone()))
        .await
        .expect("insert");

    let mut reversed = original;
    reversed.reverse();
    store
        .update("1004", &rule_with_group("1004", reversed.clone()))
        .await
        .expect("update");

    let stored = store.get("1004").await.expect("get").expect("rule present");
    assert_eq!(stored.grp_data, reversed);
}

#[tokio::test]
async fn test_update_to_empty_group() {
    let store = setup_store().await;

    store
        .insert(&rule_with_group(
            "1005",
            vec![labeled_entry("0", "0x1000"), labeled_entry("1", "0x1001")],
        ))
        .await
        .expect("insert");

    store
        .update("1005", &rule_with_group("1005", vec![]))
        .await
        .expect("update");

    let stored = store.get("1005").await.expect("get").expect("rule present");
    assert!(stored.grp_data.is_empty());

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rule_group_data WHERE rule_id = ?")
        .bind("1005")
        .fetch_one(store.pool())
        .await
        .expect("count");
    assert_eq!(orphans, 0);
}

#[tokio::test]
async fn test_groups_are_scoped_per_rule() {
    let store = setup_store().await;

    store
        .insert(&rule_with_group("2001", vec![labeled_entry("0", "0xA000")]))
        .await
        .expect("insert");
    store
        .insert(&rule_with_group(
            "2002",
            vec![labeled_entry("0", "0xB000"), labeled_entry("1", "0xB001")],
        ))
        .await
        .expect("insert");

    store.delete("2001").await.expect("delete");

    let survivor = store.get("2002").await.expect("get").expect("rule present");
    assert_eq!(survivor.grp_data.len(), 2);
    assert_eq!(survivor.grp_data[0].data_addr.as_deref(), Some("0xB000"));
}
