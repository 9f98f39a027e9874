use std::io;

use thiserror::Error;

use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("failed to initialise logging: {0}")]
    Logger(#[from] log::SetLoggerError),
}
