pub mod classification;
pub mod db;
pub mod host;
pub mod models;
pub mod scraper;
pub mod settings;
pub mod storage;
pub mod tracker;
mod utils;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use classification::{ContentClassifier, GeminiClassifier};
use db::Database;
use log::{error, info, warn};
use scraper::HostReportedContent;
use settings::SettingsStore;
use storage::Storage;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracker::TrackerController;

const DATA_DIR_ENV: &str = "TASKFOCUS_DATA_DIR";
const DEFAULT_DATA_DIR: &str = ".taskfocus";

pub fn run() {
    // Initialize logging (reads RUST_LOG env var). Logs go to stderr; stdout
    // carries the host protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("TaskFocus starting up...");

    let result = tokio::runtime::Runtime::new()
        .context("failed to start async runtime")
        .and_then(|runtime| runtime.block_on(serve_stdio()));

    if let Err(err) = result {
        error!("TaskFocus exited with error: {err:?}");
        std::process::exit(1);
    }
}

fn data_dir() -> PathBuf {
    env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

async fn serve_stdio() -> Result<()> {
    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?.current();
    let database = Database::new(data_dir.join("taskfocus.sqlite3"))?;
    let storage: Arc<dyn Storage> = Arc::new(database);

    if settings.service.resolved_api_key().is_none() {
        warn!("GEMINI_API_KEY is not set; full classifications will use the heuristic fallback");
    }
    let classifier = ContentClassifier::new(
        Arc::new(GeminiClassifier::new(&settings.service)),
        storage.clone(),
        settings.classification.clone(),
    );
    let controller = TrackerController::new(
        storage,
        classifier,
        Arc::new(HostReportedContent),
        settings.tracker.clone(),
    );

    // Resume a session that was active when the process last exited.
    if let Err(err) = controller.restore().await {
        warn!("Starting without previous session state: {err:?}");
    }

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<(), std::io::Error>(())
    });
    let forwarder = host::forward_events(&controller, out_tx.clone());

    info!("Listening for commands on stdin");
    let served = host::serve(&controller, BufReader::new(tokio::io::stdin()), out_tx).await;

    controller.shutdown().await;
    forwarder.abort();
    let _ = forwarder.await;
    writer
        .await
        .context("output writer task failed")?
        .context("failed to write to stdout")?;

    info!("Input closed, shutting down");
    served
}
