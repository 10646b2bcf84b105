//! Ledger entry (asiento) and movement models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One ledger entry per posted document, dated at the document's
/// issue date. Owns its movements; created atomically with them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: i64,
    pub document_id: i64,
    pub entry_date: NaiveDate,
}

/// A single debit-or-credit line of an asiento.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movement {
    pub movement_id: i64,
    pub entry_id: i64,
    pub account_id: i64,
    pub debit: f64,
    pub credit: f64,
    pub glosa: String,
}

/// Outcome of posting one document. A duplicate is an expected result,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PostingResult {
    Posted { document_id: i64, entry_id: i64 },
    Duplicate { reason: String },
}
