//! Read-side aggregates for reporting surfaces.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-account debit/credit totals (balance summary source).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AccountTotal {
    pub account_id: i64,
    pub code: String,
    pub name: String,
    pub debit_total: f64,
    pub credit_total: f64,
}

/// Row counts shown as dashboard indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub documents: i64,
    pub entries: i64,
    pub suppliers: i64,
}
