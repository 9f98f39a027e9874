//! SQLite settings storage.
//!
//! All rows are loaded into a cache when the database is opened; reads are
//! served from the cache and writes go to both.

use std::path::Path;

use async_sqlite::{Client, ClientBuilder};
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use super::{SettingsBackend, SettingsError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS invoice_settings (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    updated_at TEXT NOT NULL
)";

pub struct SqliteBackend {
    client: Client,
    cache: DashMap<String, Vec<u8>>,
}

impl SqliteBackend {
    /// Open (or create) the settings database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let client = ClientBuilder::new().path(path.as_ref()).open().await?;

        let rows = client
            .conn(|conn| {
                conn.execute(SCHEMA, [])?;
                let mut stmt = conn.prepare("SELECT key, value FROM invoice_settings")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;

        debug!(
            "settings database {} opened with {} key(s)",
            path.as_ref().display(),
            rows.len()
        );
        Ok(Self {
            client,
            cache: rows.into_iter().collect(),
        })
    }
}

#[async_trait]
impl SettingsBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, SettingsError> {
        Ok(self.cache.get(key).map(|v| v.clone()))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), SettingsError> {
        let key_owned = key.to_string();
        let stored = value.clone();
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO invoice_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE
                     SET value = excluded.value, updated_at = excluded.updated_at",
                    rusqlite::params![key_owned, stored, updated_at],
                )
            })
            .await?;

        self.cache.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        let key_owned = key.to_string();
        self.client
            .conn(move |conn| {
                conn.execute("DELETE FROM invoice_settings WHERE key = ?1", [key_owned])
            })
            .await?;

        self.cache.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SettingsError> {
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
