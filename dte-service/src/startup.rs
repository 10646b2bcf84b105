use crate::config::ContabConfig;
use crate::services::{seed_chart_from_csv, Database};
use contab_core::error::AppError;
use std::path::Path;

/// The assembled service: a migrated store whose chart of accounts has
/// passed the mandatory-account check.
#[derive(Debug)]
pub struct Application {
    database: Database,
}

impl Application {
    /// Connect, migrate, optionally seed the chart from CSV, then verify
    /// the three mandatory accounts exist. Verifying here, rather than on
    /// the first posting attempt, surfaces a broken installation before
    /// any batch is accepted.
    pub async fn build(config: &ContabConfig) -> Result<Self, AppError> {
        let database = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;

        database.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;

        if let Some(chart_csv) = &config.chart_csv {
            seed_chart_from_csv(&database, Path::new(chart_csv)).await?;
        }

        database.mandatory_accounts().await.map_err(|e| {
            tracing::error!("Chart of accounts is not usable: {}", e);
            e
        })?;

        Ok(Self { database })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}
