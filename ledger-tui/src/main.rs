use std::fs::{self, File};
use std::path::PathBuf;

use ledger_tui::settings::{
    InvoiceSettings, SettingsProvider, SqliteBackend, next_invoice_number,
};
use ledger_tui::{AppError, InvoiceEditor, app, paths};
use log::{info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    init_logging()?;

    let provider = open_settings().await;
    info!("settings backend: {}", provider.backend_name());
    let settings = match InvoiceSettings::load(&provider).await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("using default invoice settings: {e}");
            InvoiceSettings::default()
        }
    };
    let number = next_invoice_number(&provider).await?;

    let mut editor = InvoiceEditor::new(settings, number);
    app::run(&mut editor).await?;

    info!(
        "invoice #{number}: {} line(s), total {}",
        editor.store().lines().len(),
        editor.money(editor.totals().total)
    );
    Ok(())
}

/// Rotate old logs and log to `latest.log` in the cache directory.
fn init_logging() -> Result<(), AppError> {
    let path = match paths::log_file() {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
                paths::rotate_logs(dir);
            }
            path
        }
        None => PathBuf::from("ledger-tui.log"),
    };
    let file = File::create(&path)?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), file)?;
    info!("logging to {}", path.display());
    Ok(())
}

/// SQLite settings in the data directory, or memory if that fails.
async fn open_settings() -> SettingsProvider {
    let Some(path) = paths::settings_db() else {
        warn!("no data directory, settings will not persist");
        return SettingsProvider::in_memory();
    };
    if let Some(dir) = path.parent()
        && let Err(e) = fs::create_dir_all(dir)
    {
        warn!("cannot create {}: {e}", dir.display());
        return SettingsProvider::in_memory();
    }
    match SqliteBackend::open(&path).await {
        Ok(backend) => SettingsProvider::new(backend),
        Err(e) => {
            warn!("cannot open settings database: {e}");
            SettingsProvider::in_memory()
        }
    }
}
