//! Batch orchestration: feed many DTE payloads through the normalizer
//! and the posting engine, isolating per-document failures.

use crate::dte::parse_dte;
use crate::models::PostingResult;
use crate::services::Database;
use contab_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum BatchOutcome {
    Inserted { document_id: i64, entry_id: i64 },
    Duplicate { reason: String },
    Error { detail: String },
}

/// Per-item log line for display surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub source_file: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: usize,
}

impl BatchReport {
    fn push(&mut self, source_file: String, outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Inserted { .. } => self.inserted += 1,
            BatchOutcome::Duplicate { .. } => self.duplicates += 1,
            BatchOutcome::Error { .. } => self.errors += 1,
        }
        self.items.push(BatchItem {
            source_file,
            outcome,
        });
    }
}

/// Process a sequence of `(source_name, xml_bytes)` items in order.
///
/// Parse and persistence failures are recorded per item and never abort
/// the run. A `ConfigError` does abort: a missing mandatory account
/// invalidates every posting attempt that would follow, and swallowing
/// it per-item would bury an operator problem in the batch log.
#[instrument(skip(db, items))]
pub async fn ingest_batch<I>(db: &Database, items: I) -> Result<BatchReport, AppError>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut report = BatchReport::default();

    for (source_name, bytes) in items {
        let outcome = match process_one(db, &source_name, &bytes).await {
            Ok(PostingResult::Posted {
                document_id,
                entry_id,
            }) => BatchOutcome::Inserted {
                document_id,
                entry_id,
            },
            Ok(PostingResult::Duplicate { reason }) => BatchOutcome::Duplicate { reason },
            Err(err @ AppError::ConfigError(_)) => return Err(err),
            Err(err) => {
                warn!(source = %source_name, error = %err, "Document skipped");
                BatchOutcome::Error {
                    detail: err.to_string(),
                }
            }
        };
        report.push(source_name, outcome);
    }

    info!(
        total = report.items.len(),
        inserted = report.inserted,
        duplicates = report.duplicates,
        errors = report.errors,
        "Batch completed"
    );

    Ok(report)
}

async fn process_one(
    db: &Database,
    source_name: &str,
    bytes: &[u8],
) -> Result<PostingResult, AppError> {
    let record = parse_dte(bytes, source_name)?;
    db.post_document(&record).await
}
