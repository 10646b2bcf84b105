//! Batch orchestration tests: per-item isolation and the one failure
//! kind that must abort everything.

mod common;

use common::{sample_dte_xml, seed_mandatory_accounts, spawn_db};
use contab_core::error::AppError;
use dte_service::batch::{ingest_batch, BatchOutcome};

#[tokio::test]
async fn mixed_batch_completes_with_per_item_outcomes() {
    let db = spawn_db().await;
    seed_mandatory_accounts(&db).await;

    let good = sample_dte_xml(
        "123",
        "33",
        "2024-05-01",
        "76543210-1",
        "Acme",
        "1000",
        "190",
        "1190",
    );
    let duplicate = good.clone();
    let malformed = b"<DTE><SinEncabezado/></DTE>".to_vec();

    let report = ingest_batch(
        &db,
        vec![
            ("a_compra.xml".to_string(), good),
            ("b_repetida.xml".to_string(), duplicate),
            ("c_rota.xml".to_string(), malformed),
        ],
    )
    .await
    .expect("batch should complete");

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.errors, 1);

    assert_eq!(report.items[0].source_file, "a_compra.xml");
    assert!(matches!(report.items[0].outcome, BatchOutcome::Inserted { .. }));
    assert!(matches!(report.items[1].outcome, BatchOutcome::Duplicate { .. }));
    match &report.items[2].outcome {
        BatchOutcome::Error { detail } => {
            assert!(detail.contains("c_rota.xml"), "detail was: {detail}")
        }
        other => panic!("expected Error, got {other:?}"),
    }

    // The failure did not prevent the good document from persisting.
    let counts = db.counts().await.expect("should count");
    assert_eq!(counts.documents, 1);
}

#[tokio::test]
async fn config_error_aborts_the_batch() {
    let db = spawn_db().await; // chart never seeded

    let good = sample_dte_xml(
        "1",
        "33",
        "2024-05-01",
        "76543210-1",
        "Acme",
        "1000",
        "190",
        "1190",
    );

    let err = ingest_batch(&db, vec![("compra.xml".to_string(), good)])
        .await
        .expect_err("should abort");
    assert!(matches!(err, AppError::ConfigError(_)), "got: {err}");
}

#[tokio::test]
async fn empty_batch_reports_zero_counts() {
    let db = spawn_db().await;
    seed_mandatory_accounts(&db).await;

    let report = ingest_batch(&db, Vec::new())
        .await
        .expect("batch should complete");
    assert!(report.items.is_empty());
    assert_eq!(report.inserted, 0);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn report_serializes_for_display_surfaces() {
    let db = spawn_db().await;
    seed_mandatory_accounts(&db).await;

    let good = sample_dte_xml(
        "7",
        "33",
        "2024-05-02",
        "76543210-1",
        "Acme",
        "100",
        "19",
        "119",
    );
    let report = ingest_batch(&db, vec![("compra.xml".to_string(), good)])
        .await
        .expect("batch should complete");

    let json = serde_json::to_value(&report).expect("should serialize");
    assert_eq!(json["inserted"], 1);
    assert_eq!(json["items"][0]["source_file"], "compra.xml");
    assert_eq!(json["items"][0]["outcome"], "inserted");
}
