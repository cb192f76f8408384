use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait that every payload source must implement.
#[async_trait]
pub trait PayloadSource: Send + Sync {
    /// Fetch one raw match payload.
    async fn fetch(&self) -> Result<Value>;

    /// Human-readable name for logging and the output envelope.
    fn name(&self) -> &str;
}
