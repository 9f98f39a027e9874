//! Typed key-value settings.

mod backend;
mod memory;
mod sqlite;

pub use backend::SettingsBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(bincode::Error),
    #[error("deserialization error: {0}")]
    Deserialization(bincode::Error),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Typed settings provider.
///
/// Wraps a `SettingsBackend` with bincode serialization.
#[derive(Clone)]
pub struct SettingsProvider {
    backend: Arc<dyn SettingsBackend>,
}

impl SettingsProvider {
    pub fn new(backend: impl SettingsBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// A provider that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        match self.backend.get_bytes(key).await? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(SettingsError::Deserialization)?,
            )),
            None => Ok(None),
        }
    }

    pub async fn get_or<T: DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, SettingsError> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    pub async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        let bytes = bincode::serialize(value).map_err(SettingsError::Serialization)?;
        self.backend.set_bytes(key, bytes).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        self.backend.delete(key).await
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SettingsError> {
        self.backend.keys_with_prefix(prefix).await
    }
}

// -----------------------------------------------------------------------------
// Invoice settings
// -----------------------------------------------------------------------------

const COMPANY_NAME: &str = "invoice.company_name";
const CURRENCY_SYMBOL: &str = "invoice.currency_symbol";
/// Stored as text so the exact decimal survives the round trip.
const TAX_RATE: &str = "invoice.tax_rate";
const LAST_NUMBER: &str = "invoice.last_number";

/// Settings the invoice editor reads at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceSettings {
    pub company_name: String,
    pub currency_symbol: String,
    /// Tax rate in percent.
    pub tax_rate: Decimal,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            company_name: "My Garage".to_string(),
            currency_symbol: "€".to_string(),
            tax_rate: Decimal::new(21, 0),
        }
    }
}

impl InvoiceSettings {
    /// Load settings, falling back to defaults for missing keys.
    pub async fn load(provider: &SettingsProvider) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        let company_name = provider.get_or(COMPANY_NAME, defaults.company_name).await?;
        let currency_symbol = provider
            .get_or(CURRENCY_SYMBOL, defaults.currency_symbol)
            .await?;
        let tax_rate = match provider.get::<String>(TAX_RATE).await? {
            Some(text) => text
                .parse::<Decimal>()
                .map_err(|e| SettingsError::InvalidValue {
                    key: TAX_RATE.to_string(),
                    reason: e.to_string(),
                })?,
            None => defaults.tax_rate,
        };

        Ok(Self {
            company_name,
            currency_symbol,
            tax_rate,
        })
    }

    pub async fn save(&self, provider: &SettingsProvider) -> Result<(), SettingsError> {
        provider.set(COMPANY_NAME, &self.company_name).await?;
        provider.set(CURRENCY_SYMBOL, &self.currency_symbol).await?;
        provider.set(TAX_RATE, &self.tax_rate.to_string()).await
    }
}

/// Reserve the next invoice number.
pub async fn next_invoice_number(provider: &SettingsProvider) -> Result<u32, SettingsError> {
    let next = provider.get_or::<u32>(LAST_NUMBER, 0).await?.saturating_add(1);
    provider.set(LAST_NUMBER, &next).await?;
    Ok(next)
}
