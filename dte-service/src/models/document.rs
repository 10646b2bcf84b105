//! Document models: the normalized DTE record and its persisted row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Canonical document record produced by the DTE normalizer.
///
/// This is the exchange format between XML ingestion and the posting
/// engine; it is not yet persisted and carries the issuer display name,
/// which lives on the supplier row once posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub folio: String,
    pub tipo_dte: String,
    pub fecha_emision: NaiveDate,
    pub rut_emisor: String,
    pub razon_social: String,
    pub monto_neto: f64,
    pub monto_iva: f64,
    pub monto_total: f64,
    pub source_file: String,
}

/// Persisted purchase document. `(folio, rut_emisor, tipo_dte)` is the
/// deduplication key; rows are created exactly once and never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub document_id: i64,
    pub folio: String,
    pub tipo_dte: String,
    pub fecha_emision: NaiveDate,
    pub rut_emisor: String,
    pub monto_neto: f64,
    pub monto_iva: f64,
    pub monto_total: f64,
    pub source_file: String,
}
