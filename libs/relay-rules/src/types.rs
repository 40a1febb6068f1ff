//! Rule type definitions
//!
//! Core types for rule persistence and exchange:
//! - Rule: parent record describing a trigger condition and an output action
//! - GroupEntry: one ordered sub-condition owned by a rule
//! - IdPolicy: who assigns rule identifiers
//!
//! Canonical serde field names are the short flat-file names; the long
//! names used by the legacy nested format are accepted as input aliases.
//! All field values are opaque to this layer: addresses, register
//! numbers, and data widths are stored and returned verbatim.

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifier policy
// ============================================================================

/// Who assigns rule identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicy {
    /// The caller supplies a unique identifier with every insert.
    #[default]
    External,

    /// The store assigns the next sequential identifier, rendered as its
    /// decimal string. Caller-supplied identifiers are ignored on insert.
    Generated,
}

// ============================================================================
// Rule (parent record)
// ============================================================================

/// Rule - a trigger condition bound to an output action
///
/// Every scalar is optional; absence is stored as NULL and round-trips as
/// absence, never as a default. Only `id` has store-side meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier; assignment is governed by [`IdPolicy`]
    #[serde(default, alias = "number")]
    pub id: Option<String>,

    /// Whether the rule is active
    #[serde(default)]
    pub enable: Option<bool>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Operating mode
    #[serde(default)]
    pub mode: Option<String>,

    /// Trigger method
    #[serde(default, alias = "trigger_method")]
    pub trg_mtd: Option<String>,

    /// Logical operator joining the condition group
    #[serde(default, alias = "operators")]
    pub ops: Option<String>,

    /// Trigger condition
    #[serde(default, alias = "trigger_conditions")]
    pub trg_cnds: Option<String>,

    /// Trigger comparison value
    #[serde(default, alias = "trigger_value")]
    pub trg_val: Option<String>,

    /// Target function name
    #[serde(default)]
    pub func_name: Option<String>,

    /// Output target network address
    #[serde(default, alias = "out_network")]
    pub out_net: Option<String>,

    /// Output target register address
    #[serde(default)]
    pub out_reg_addr: Option<String>,

    /// Output target data unit
    #[serde(default)]
    pub out_data_unit: Option<String>,

    /// Output target data width
    #[serde(default)]
    pub out_data_bit: Option<String>,

    /// Trigger source network address
    #[serde(default, alias = "network1")]
    pub net: Option<String>,

    /// Trigger source data address
    #[serde(default, alias = "reg_addr1")]
    pub data_addr: Option<String>,

    /// Trigger source data unit
    #[serde(default, alias = "data_unit1")]
    pub data_unit: Option<String>,

    /// Trigger source data width
    #[serde(default, alias = "data_bit1")]
    pub data_bit: Option<String>,

    /// Ordered sub-conditions; write order is the order of this vec
    #[serde(default, alias = "group_data")]
    pub grp_data: Vec<GroupEntry>,
}

// ============================================================================
// GroupEntry (ordered child record)
// ============================================================================

/// One sub-condition in a rule's condition group
///
/// Ordering is carried by array position at write time and by the
/// `position` column at rest. The `index` label is caller data and never
/// participates in ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Caller-supplied sequence label, stored verbatim
    #[serde(default)]
    pub index: Option<String>,

    /// Logical conjunction with the surrounding group
    #[serde(default, alias = "logical_conditions")]
    pub lgcl_cnds: Option<String>,

    /// Source network address
    #[serde(default, alias = "network")]
    pub net: Option<String>,

    /// Source data address
    #[serde(default, alias = "reg_addr")]
    pub data_addr: Option<String>,

    /// Source data unit
    #[serde(default)]
    pub data_unit: Option<String>,

    /// Source data width
    #[serde(default)]
    pub data_bit: Option<String>,
}
