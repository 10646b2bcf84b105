//! Startup tests: fail-fast chart verification and CSV seeding.

mod common;

use contab_core::config::Config as CommonConfig;
use contab_core::error::AppError;
use dte_service::config::{ContabConfig, DatabaseConfig};
use dte_service::startup::Application;

fn test_config(chart_csv: Option<String>) -> ContabConfig {
    ContabConfig {
        common: CommonConfig {
            log_level: "debug".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        chart_csv,
    }
}

#[tokio::test]
async fn build_fails_fast_on_unseeded_chart() {
    common::init_tracing();

    let err = Application::build(&test_config(None))
        .await
        .expect_err("should fail");
    assert!(matches!(err, AppError::ConfigError(_)), "got: {err}");
}

#[tokio::test]
async fn csv_seeding_satisfies_the_mandatory_accounts() {
    common::init_tracing();

    let chart = format!("{}/plan_cuentas.csv", env!("CARGO_MANIFEST_DIR"));
    let app = Application::build(&test_config(Some(chart.clone())))
        .await
        .expect("should build");

    let db = app.database();
    let accounts = db.mandatory_accounts().await.expect("chart is seeded");
    assert_eq!(accounts.expense_fallback.code, "5101");
    assert_eq!(accounts.tax_credit.code, "1107");
    assert_eq!(accounts.payables.code, "2101");

    // Seeding is upsert-if-absent: a second pass changes nothing.
    let before = db.list_accounts().await.expect("should list").len();
    dte_service::services::seed_chart_from_csv(db, std::path::Path::new(&chart))
        .await
        .expect("reseeding is harmless");
    let after = db.list_accounts().await.expect("should list").len();
    assert_eq!(before, after);
}
