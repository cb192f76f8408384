use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use super::provider::PayloadSource;

/// Payload read from a JSON file on disk.
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        FileSource { path, name }
    }
}

#[async_trait]
impl PayloadSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Value> {
        debug!("Reading payload from {}", self.name);
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.name))?;
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_json_file() {
        let path = std::env::temp_dir().join(format!("decision-lens-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"{"frames": []}"#).await.unwrap();
        let source = FileSource::new(&path);
        let payload = source.fetch().await.unwrap();
        assert!(payload["frames"].is_array());
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = FileSource::new("/nonexistent/decision-lens/payload.json");
        assert!(source.fetch().await.is_err());
    }
}
