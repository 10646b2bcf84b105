//! Database service for dte-service.

use crate::models::{
    Account, AccountTotal, CreateAccount, DocumentRecord, LedgerEntry, MandatoryAccounts,
    Movement, PostingResult, StoreCounts, Supplier, FALLBACK_EXPENSE_ACCOUNT, PAYABLES_ACCOUNT,
    TAX_CREDIT_ACCOUNT,
};
use chrono::NaiveDate;
use contab_core::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Tolerance when reconciling neto + IVA against the reported total.
/// DTE amounts are whole pesos, so anything past rounding noise is a
/// genuine discrepancy.
const RECONCILE_EPSILON: f64 = 0.005;

/// Database connection pool wrapper.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "dte-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to SQLite"
        );

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("SQLite connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Chart-of-accounts operations
    // -------------------------------------------------------------------------

    /// Insert an account if its code is not present yet. Seed data is
    /// immutable, so an existing code is left untouched.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn upsert_account(&self, input: &CreateAccount) -> Result<Account, AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (code, name, kind)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&input.code)
        .bind(&input.name)
        .bind(input.kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to upsert account: {}", e)))?;

        let account = sqlx::query_as::<_, Account>(
            "SELECT account_id, code, name, kind FROM accounts WHERE code = ?1",
        )
        .bind(&input.code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch account: {}", e)))?;

        Ok(account)
    }

    /// List the chart of accounts ordered by code.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        sqlx::query_as::<_, Account>(
            "SELECT account_id, code, name, kind FROM accounts ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list accounts: {}", e)))
    }

    /// Resolve the three business-rule accounts every posting needs.
    /// Absence of any of them means the chart was not seeded correctly:
    /// no document can be posted until an operator fixes the seed data.
    #[instrument(skip(self))]
    pub async fn mandatory_accounts(&self) -> Result<MandatoryAccounts, AppError> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to acquire connection: {}", e))
        })?;
        mandatory_accounts(&mut *conn).await
    }

    // -------------------------------------------------------------------------
    // Supplier operations
    // -------------------------------------------------------------------------

    /// Get a supplier by RUT.
    pub async fn get_supplier(&self, rut: &str) -> Result<Option<Supplier>, AppError> {
        sqlx::query_as::<_, Supplier>(
            "SELECT rut, razon_social, default_account_id FROM suppliers WHERE rut = ?1",
        )
        .bind(rut)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get supplier: {}", e)))
    }

    /// List suppliers ordered by RUT (classification screen source).
    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        sqlx::query_as::<_, Supplier>(
            "SELECT rut, razon_social, default_account_id FROM suppliers ORDER BY rut",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list suppliers: {}", e)))
    }

    /// Reclassify a supplier's default expense account. The only
    /// supplier mutation any surface is allowed to perform.
    #[instrument(skip(self), fields(rut = %rut, account_id = account_id))]
    pub async fn set_supplier_default_account(
        &self,
        rut: &str,
        account_id: i64,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE suppliers SET default_account_id = ?1 WHERE rut = ?2")
            .bind(account_id)
            .bind(rut)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update supplier: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "No supplier with RUT '{}'",
                rut
            )));
        }

        info!("Supplier reclassified");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Posting operations
    // -------------------------------------------------------------------------

    /// Post a normalized purchase document as a balanced asiento.
    ///
    /// Runs as one transaction covering supplier upsert, document,
    /// entry and movements; either everything commits or nothing does.
    /// A uniqueness violation on (folio, rut_emisor, tipo_dte) is the
    /// expected duplicate outcome and rolls the whole transaction back,
    /// supplier creation included; the upsert is idempotent, so the next
    /// non-duplicate document from that issuer recreates the row.
    #[instrument(
        skip(self, record),
        fields(folio = %record.folio, rut = %record.rut_emisor, tipo = %record.tipo_dte)
    )]
    pub async fn post_document(
        &self,
        record: &DocumentRecord,
    ) -> Result<PostingResult, AppError> {
        if (record.monto_neto + record.monto_iva - record.monto_total).abs() > RECONCILE_EPSILON {
            warn!(
                monto_neto = record.monto_neto,
                monto_iva = record.monto_iva,
                monto_total = record.monto_total,
                "Totals do not reconcile (neto + IVA != total); posting as reported"
            );
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let accounts = mandatory_accounts(&mut *tx).await?;

        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT rut, razon_social, default_account_id FROM suppliers WHERE rut = ?1",
        )
        .bind(&record.rut_emisor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get supplier: {}", e)))?;

        let supplier = match supplier {
            Some(supplier) => supplier,
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO suppliers (rut, razon_social, default_account_id)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT (rut) DO NOTHING
                    "#,
                )
                .bind(&record.rut_emisor)
                .bind(&record.razon_social)
                .bind(accounts.expense_fallback.account_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to create supplier: {}", e))
                })?;

                Supplier {
                    rut: record.rut_emisor.clone(),
                    razon_social: record.razon_social.clone(),
                    default_account_id: Some(accounts.expense_fallback.account_id),
                }
            }
        };

        let expense_account_id = supplier
            .default_account_id
            .unwrap_or(accounts.expense_fallback.account_id);

        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO documents
                (folio, tipo_dte, fecha_emision, rut_emisor,
                 monto_neto, monto_iva, monto_total, source_file)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING document_id
            "#,
        )
        .bind(&record.folio)
        .bind(&record.tipo_dte)
        .bind(record.fecha_emision)
        .bind(&record.rut_emisor)
        .bind(record.monto_neto)
        .bind(record.monto_iva)
        .bind(record.monto_total)
        .bind(&record.source_file)
        .fetch_one(&mut *tx)
        .await;

        let document_id = match inserted {
            Ok(id) => id,
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await.ok();
                let reason = format!(
                    "document already exists (folio {}, RUT {}, tipo {})",
                    record.folio, record.rut_emisor, record.tipo_dte
                );
                info!(source = %record.source_file, "Duplicate document skipped");
                return Ok(PostingResult::Duplicate { reason });
            }
            Err(e) => {
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to insert document: {}",
                    e
                )));
            }
        };

        let entry_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO entries (document_id, entry_date)
            VALUES (?1, ?2)
            RETURNING entry_id
            "#,
        )
        .bind(document_id)
        .bind(record.fecha_emision)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert entry: {}", e)))?;

        let glosa_base = format!(
            "Compra DTE {} Folio {} - {}",
            record.tipo_dte, record.folio, supplier.razon_social
        );
        let lines = [
            (expense_account_id, record.monto_neto, 0.0, "Gasto Neto"),
            (accounts.tax_credit.account_id, record.monto_iva, 0.0, TAX_CREDIT_ACCOUNT),
            (accounts.payables.account_id, 0.0, record.monto_total, PAYABLES_ACCOUNT),
        ];

        for (account_id, debit, credit, label) in lines {
            sqlx::query(
                r#"
                INSERT INTO movements (entry_id, account_id, debit, credit, glosa)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(entry_id)
            .bind(account_id)
            .bind(debit)
            .bind(credit)
            .bind(format!("{glosa_base} | {label}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert movement: {}", e))
            })?;
        }

        if let Err(e) = tx.commit().await {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    let reason = format!(
                        "document already exists (folio {}, RUT {}, tipo {})",
                        record.folio, record.rut_emisor, record.tipo_dte
                    );
                    return Ok(PostingResult::Duplicate { reason });
                }
            }
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        info!(
            document_id = document_id,
            entry_id = entry_id,
            monto_total = record.monto_total,
            "Document posted"
        );

        Ok(PostingResult::Posted {
            document_id,
            entry_id,
        })
    }

    // -------------------------------------------------------------------------
    // Read-side operations (reporting surfaces only read)
    // -------------------------------------------------------------------------

    /// Find a document by its natural key.
    pub async fn find_document(
        &self,
        folio: &str,
        rut_emisor: &str,
        tipo_dte: &str,
    ) -> Result<Option<crate::models::Document>, AppError> {
        sqlx::query_as::<_, crate::models::Document>(
            r#"
            SELECT document_id, folio, tipo_dte, fecha_emision, rut_emisor,
                   monto_neto, monto_iva, monto_total, source_file
            FROM documents
            WHERE folio = ?1 AND rut_emisor = ?2 AND tipo_dte = ?3
            "#,
        )
        .bind(folio)
        .bind(rut_emisor)
        .bind(tipo_dte)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find document: {}", e)))
    }

    /// Get all movements for an asiento, in insertion order.
    pub async fn movements_for_entry(&self, entry_id: i64) -> Result<Vec<Movement>, AppError> {
        sqlx::query_as::<_, Movement>(
            r#"
            SELECT movement_id, entry_id, account_id, debit, credit, glosa
            FROM movements
            WHERE entry_id = ?1
            ORDER BY movement_id
            "#,
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get movements: {}", e)))
    }

    /// Asientos with their movements for a date range (libro diario).
    #[instrument(skip(self))]
    pub async fn journal(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(LedgerEntry, Vec<Movement>)>, AppError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT entry_id, document_id, entry_date
            FROM entries
            WHERE entry_date >= ?1 AND entry_date <= ?2
            ORDER BY entry_date, entry_id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list entries: {}", e)))?;

        let mut result = Vec::with_capacity(entries.len());
        for entry in entries {
            let movements = self.movements_for_entry(entry.entry_id).await?;
            result.push((entry, movements));
        }

        Ok(result)
    }

    /// Per-account debit/credit totals (balance summary source).
    pub async fn account_totals(&self) -> Result<Vec<AccountTotal>, AppError> {
        sqlx::query_as::<_, AccountTotal>(
            r#"
            SELECT a.account_id, a.code, a.name,
                   COALESCE(SUM(m.debit), 0.0) AS debit_total,
                   COALESCE(SUM(m.credit), 0.0) AS credit_total
            FROM accounts a
            LEFT JOIN movements m ON m.account_id = a.account_id
            GROUP BY a.account_id, a.code, a.name
            ORDER BY a.code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get totals: {}", e)))
    }

    /// Row counts for dashboard indicators.
    pub async fn counts(&self) -> Result<StoreCounts, AppError> {
        let (documents, entries, suppliers) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM documents),
                (SELECT COUNT(*) FROM entries),
                (SELECT COUNT(*) FROM suppliers)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get counts: {}", e)))?;

        Ok(StoreCounts {
            documents,
            entries,
            suppliers,
        })
    }
}

async fn account_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(
        "SELECT account_id, code, name, kind FROM accounts WHERE name = ?1",
    )
    .bind(name)
    .fetch_optional(conn)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get account: {}", e)))
}

async fn mandatory_accounts(conn: &mut SqliteConnection) -> Result<MandatoryAccounts, AppError> {
    let expense_fallback = require_account(&mut *conn, FALLBACK_EXPENSE_ACCOUNT).await?;
    let tax_credit = require_account(&mut *conn, TAX_CREDIT_ACCOUNT).await?;
    let payables = require_account(&mut *conn, PAYABLES_ACCOUNT).await?;

    Ok(MandatoryAccounts {
        expense_fallback,
        tax_credit,
        payables,
    })
}

async fn require_account(conn: &mut SqliteConnection, name: &str) -> Result<Account, AppError> {
    account_by_name(conn, name).await?.ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!(
            "Mandatory account '{}' is missing from the chart of accounts",
            name
        ))
    })
}
