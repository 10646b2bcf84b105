use contab_core::observability::init_tracing;
use dte_service::batch::ingest_batch;
use dte_service::config::ContabConfig;
use dte_service::startup::Application;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = ContabConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing("dte-service", &config.common.log_level);

    let inbox = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("inbox"));

    let app = Application::build(&config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    let items = collect_xml_files(&inbox)?;
    if items.is_empty() {
        tracing::warn!(inbox = %inbox.display(), "No XML files found");
    }

    let report = ingest_batch(app.database(), items).await.map_err(|e| {
        tracing::error!("Batch aborted: {}", e);
        std::io::Error::other(format!("Batch error: {}", e))
    })?;

    // The report is the machine-readable surface for whoever drives the
    // batch (dashboard, cron wrapper); the log lines above are for humans.
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| std::io::Error::other(format!("Report serialization error: {}", e)))?;
    println!("{json}");

    Ok(())
}

/// Collect `(file_name, bytes)` for every XML file in the inbox
/// directory, in name order so reruns produce stable batch logs.
fn collect_xml_files(dir: &PathBuf) -> std::io::Result<Vec<(String, Vec<u8>)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    paths.sort();

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(&path)?;
        items.push((name, bytes));
    }
    Ok(items)
}
