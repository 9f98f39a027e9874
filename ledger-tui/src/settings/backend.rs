use async_trait::async_trait;

use super::SettingsError;

/// Byte-level storage behind [`SettingsProvider`](super::SettingsProvider).
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, SettingsError>;

    async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), SettingsError>;

    async fn delete(&self, key: &str) -> Result<(), SettingsError>;

    /// Stored keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, SettingsError>;
}
