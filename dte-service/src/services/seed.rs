//! Chart-of-accounts seeding from CSV.
//!
//! Master data lives outside the code; the CSV carries one account per
//! row (`codigo,nombre,tipo`). Seeding is upsert-if-absent so rerunning
//! it against an initialized store is a no-op.

use crate::models::{AccountKind, CreateAccount};
use crate::services::Database;
use contab_core::error::AppError;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct ChartRow {
    codigo: String,
    nombre: String,
    tipo: String,
}

/// Load the seed chart of accounts from a CSV file. Returns the number
/// of rows processed. Any malformed row is a configuration error: a
/// half-seeded chart would fail the mandatory-account check anyway.
#[instrument(skip(db))]
pub async fn seed_chart_from_csv(db: &Database, path: &Path) -> Result<usize, AppError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Cannot open chart CSV {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut processed = 0;
    for row in reader.deserialize::<ChartRow>() {
        let row = row.map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Malformed chart CSV row: {}", e))
        })?;

        let kind = AccountKind::parse(row.tipo.trim()).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "Unknown account kind '{}' for code '{}'",
                row.tipo,
                row.codigo
            ))
        })?;

        db.upsert_account(&CreateAccount {
            code: row.codigo.trim().to_string(),
            name: row.nombre.trim().to_string(),
            kind,
        })
        .await?;
        processed += 1;
    }

    info!(rows = processed, "Chart of accounts seeded");
    Ok(processed)
}
