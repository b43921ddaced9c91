pub mod budget;
pub mod recurring;
pub mod summary;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{EntryKind, Money};

/// A single dated income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    /// Always a positive magnitude; `kind` carries the sign.
    pub amount: Money,
    pub kind: EntryKind,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Set when the transaction was generated from a recurring template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == EntryKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EntryKind::Expense
    }
}
