//! Supplier model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A supplier keyed by its tax identifier (RUT).
///
/// Created on first sighting of an unknown issuer with the fallback
/// expense account as default. The posting engine never mutates a
/// supplier after creation; reclassification belongs to an external
/// surface and only touches `default_account_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub rut: String,
    pub razon_social: String,
    pub default_account_id: Option<i64>,
}
