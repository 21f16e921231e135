mod cli;
mod tui;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Backend, Paths};
use crate::store::{GoogleSheets, LocalWorkbook, ServiceAccountAuth};
use crate::workbook::Workbook;

pub(crate) use cli::{as_builtin, as_cli};
pub(crate) use tui::as_tui;

const DEFAULT_LOG_FILTER: &str = "stewardtui=info";

/// Send `tracing` output to the log file in the data directory; the TUI owns
/// the terminal. `RUST_LOG` overrides the default filter.
pub(crate) fn init_logging(paths: &Paths) -> Result<()> {
    std::fs::create_dir_all(&paths.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            paths.data_dir.display()
        )
    })?;
    let log_path = paths.log_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}

/// Connect to the configured backend. Nothing is read or written yet.
pub(crate) fn open_workbook(config: &AppConfig) -> Result<Workbook> {
    tracing::debug!(backend = %config.backend, "opening workbook");
    match config.backend {
        Backend::Local => {
            if let Some(dir) = config.local_path.parent() {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create data directory: {}", dir.display())
                })?;
            }
            let store = LocalWorkbook::open(&config.local_path).with_context(|| {
                format!("Failed to open {}", config.local_path.display())
            })?;
            Ok(Workbook::new(Box::new(store)))
        }
        Backend::Google => {
            let sheet_id = config.sheet_id.as_deref().context(
                "No spreadsheet configured. Set sheet_id in config.toml, \
                 STEWARD_SHEET_ID, or pass --sheet <id> (or use --local)",
            )?;
            let auth = ServiceAccountAuth::from_file(
                &config.credentials_path,
                Some(config.token_cache_path.clone()),
            )?;
            tracing::info!(
                sheet_id,
                account = auth.client_email(),
                "connecting to Google Sheets"
            );
            let store = GoogleSheets::new(sheet_id, auth)?;
            Ok(Workbook::new(Box::new(store)))
        }
    }
}

/// Open the workbook and bring its worksheets into shape.
pub(crate) fn ready(config: &AppConfig) -> Result<Workbook> {
    let mut wb = open_workbook(config)?;
    let report = wb
        .init()
        .with_context(|| format!("Failed to prepare {}", wb.describe()))?;
    if !report.is_noop() {
        tracing::info!(
            created = ?report.created,
            seeded = ?report.seeded,
            "initialised workbook"
        );
    }
    Ok(wb)
}
