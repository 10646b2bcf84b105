//! Common test utilities for dte-service integration tests.

use chrono::NaiveDate;
use dte_service::models::{
    Account, AccountKind, CreateAccount, DocumentRecord, FALLBACK_EXPENSE_ACCOUNT,
    PAYABLES_ACCOUNT, TAX_CREDIT_ACCOUNT,
};
use dte_service::services::Database;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,dte_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Spawn a fresh in-memory store with migrations applied.
///
/// Single-connection pool: every `:memory:` connection is a separate
/// database, so the pool must never hand out a second one.
pub async fn spawn_db() -> Database {
    init_tracing();

    let db = Database::new("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

/// Seed the three mandatory accounts and return the fallback expense one.
pub async fn seed_mandatory_accounts(db: &Database) -> Account {
    let fallback = db
        .upsert_account(&CreateAccount {
            code: "5101".to_string(),
            name: FALLBACK_EXPENSE_ACCOUNT.to_string(),
            kind: AccountKind::Expense,
        })
        .await
        .expect("Failed to seed fallback expense account");

    db.upsert_account(&CreateAccount {
        code: "1107".to_string(),
        name: TAX_CREDIT_ACCOUNT.to_string(),
        kind: AccountKind::Asset,
    })
    .await
    .expect("Failed to seed tax credit account");

    db.upsert_account(&CreateAccount {
        code: "2101".to_string(),
        name: PAYABLES_ACCOUNT.to_string(),
        kind: AccountKind::Liability,
    })
    .await
    .expect("Failed to seed payables account");

    fallback
}

/// Build a minimal but realistic DTE XML payload.
pub fn sample_dte_xml(
    folio: &str,
    tipo: &str,
    fecha: &str,
    rut: &str,
    razon_social: &str,
    neto: &str,
    iva: &str,
    total: &str,
) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<DTE version="1.0">
  <Documento ID="F{folio}T{tipo}">
    <Encabezado>
      <IdDoc>
        <TipoDTE>{tipo}</TipoDTE>
        <Folio>{folio}</Folio>
        <FchEmis>{fecha}</FchEmis>
      </IdDoc>
      <Emisor>
        <RUTEmisor>{rut}</RUTEmisor>
        <RznSoc>{razon_social}</RznSoc>
      </Emisor>
      <Totales>
        <MntNeto>{neto}</MntNeto>
        <IVA>{iva}</IVA>
        <MntTotal>{total}</MntTotal>
      </Totales>
    </Encabezado>
  </Documento>
</DTE>"#
    )
    .into_bytes()
}

/// A normalized record ready for posting, bypassing the XML layer.
pub fn sample_record(folio: &str, rut: &str, razon_social: &str) -> DocumentRecord {
    DocumentRecord {
        folio: folio.to_string(),
        tipo_dte: "33".to_string(),
        fecha_emision: NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
        rut_emisor: rut.to_string(),
        razon_social: razon_social.to_string(),
        monto_neto: 1000.0,
        monto_iva: 190.0,
        monto_total: 1190.0,
        source_file: format!("{folio}.xml"),
    }
}
