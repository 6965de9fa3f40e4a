//! Knowledge-base collectors.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use prospect_core::Result;

use crate::types::{CollectionTarget, KnowledgeDocument};

/// A source of documents about a target account.
///
/// An empty result is a normal outcome; the manager treats it, and any
/// error, as a partial result.
#[async_trait]
pub trait DataSourceCollector: Send + Sync {
    fn name(&self) -> &str;

    async fn collect(&self, target: &CollectionTarget) -> Result<Vec<KnowledgeDocument>>;
}

/// Reads previously exported documents from a JSON file.
///
/// Accepts either a bare array of documents or `{"documents": [...]}`.
/// Only documents mentioning the target company are returned.
pub struct JsonFileCollector {
    name: String,
    path: PathBuf,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    List(Vec<KnowledgeDocument>),
    Wrapped { documents: Vec<KnowledgeDocument> },
}

impl JsonFileCollector {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "json".into());
        Self { name, path }
    }
}

#[async_trait]
impl DataSourceCollector for JsonFileCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self, target: &CollectionTarget) -> Result<Vec<KnowledgeDocument>> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        let docs = match serde_json::from_str::<DocumentFile>(&data)? {
            DocumentFile::List(docs) | DocumentFile::Wrapped { documents: docs } => docs,
        };

        let needle = target.company_name.to_lowercase();
        let total = docs.len();
        let matching: Vec<KnowledgeDocument> = docs
            .into_iter()
            .filter(|d| needle.is_empty() || d.full_text().to_lowercase().contains(&needle))
            .collect();
        debug!(
            "{}: {} of {} documents mention {}",
            self.name,
            matching.len(),
            total,
            target.company_name
        );
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_and_filters_by_company() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("news.json");
        std::fs::write(
            &path,
            r#"{"documents": [
                {"source": "wire", "title": "Acme opens Denver office", "content": ""},
                {"source": "wire", "title": "Globex cuts staff", "content": ""}
            ]}"#,
        )
        .unwrap();

        let collector = JsonFileCollector::new(&path);
        assert_eq!(collector.name(), "news");
        let docs = collector.collect(&CollectionTarget::new("ACME")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Acme opens Denver office");
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let collector = JsonFileCollector::new(dir.path().join("absent.json"));
        assert!(collector.collect(&CollectionTarget::new("Acme")).await.is_err());
    }
}
