//! Collector manager: registration and concurrent collection.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use prospect_core::EvidenceItem;

use crate::collector::DataSourceCollector;
use crate::types::{CollectionTarget, KnowledgeDocument};

/// Default cap on documents kept from one collection run.
pub const DEFAULT_MAX_DOCUMENTS: usize = 200;

/// Result of running every collector for one target.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub documents: Vec<KnowledgeDocument>,
    /// Collectors that failed, with their error text.
    pub failures: Vec<(String, String)>,
    /// Collectors that returned nothing.
    pub empty: Vec<String>,
    pub duplicates_dropped: usize,
    pub collected_at: DateTime<Utc>,
}

impl CollectionReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty() || !self.empty.is_empty()
    }

    pub fn evidence(&self) -> Vec<EvidenceItem> {
        self.documents.iter().map(|d| d.to_evidence()).collect()
    }
}

/// Runs registered collectors concurrently and merges their output.
pub struct CollectorManager {
    collectors: RwLock<Vec<Arc<dyn DataSourceCollector>>>,
    max_documents: usize,
}

impl Default for CollectorManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENTS)
    }
}

impl CollectorManager {
    pub fn new(max_documents: usize) -> Self {
        Self {
            collectors: RwLock::new(Vec::new()),
            max_documents,
        }
    }

    pub fn register(&self, collector: Arc<dyn DataSourceCollector>) {
        info!("Registered collector: {}", collector.name());
        self.collectors.write().push(collector);
    }

    pub fn collector_names(&self) -> Vec<String> {
        self.collectors
            .read()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Collect from every registered collector.
    ///
    /// Errors and empty output from individual collectors are recorded in the
    /// report and never fail the run. Documents are deduplicated by URL, or by
    /// content hash when they have none, in collector registration order.
    pub async fn collect_all(&self, target: &CollectionTarget) -> CollectionReport {
        let collectors: Vec<Arc<dyn DataSourceCollector>> = self.collectors.read().clone();

        let results = join_all(collectors.iter().map(|c| c.collect(target))).await;

        let mut report = CollectionReport {
            documents: Vec::new(),
            failures: Vec::new(),
            empty: Vec::new(),
            duplicates_dropped: 0,
            collected_at: Utc::now(),
        };
        let mut seen = HashSet::new();

        for (collector, result) in collectors.iter().zip(results) {
            let docs = match result {
                Ok(docs) if docs.is_empty() => {
                    report.empty.push(collector.name().to_string());
                    continue;
                }
                Ok(docs) => docs,
                Err(e) => {
                    warn!("Collector {} failed: {}", collector.name(), e);
                    report
                        .failures
                        .push((collector.name().to_string(), e.to_string()));
                    continue;
                }
            };

            for doc in docs {
                if !seen.insert(dedup_key(&doc)) {
                    report.duplicates_dropped += 1;
                    continue;
                }
                if report.documents.len() < self.max_documents {
                    report.documents.push(doc);
                }
            }
        }

        info!(
            "Collected {} documents for {} ({} failed, {} empty, {} duplicates)",
            report.documents.len(),
            target.company_name,
            report.failures.len(),
            report.empty.len(),
            report.duplicates_dropped
        );
        report
    }
}

fn dedup_key(doc: &KnowledgeDocument) -> String {
    match doc.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => format!("url:{}", url.trim_end_matches('/').to_lowercase()),
        None => {
            let digest = Sha256::digest(doc.full_text().as_bytes());
            format!("sha256:{}", hex::encode(digest))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prospect_core::{Error, Result};

    struct FixedCollector {
        name: &'static str,
        docs: Vec<KnowledgeDocument>,
        fail: bool,
    }

    #[async_trait]
    impl DataSourceCollector for FixedCollector {
        fn name(&self) -> &str {
            self.name
        }

        async fn collect(&self, _target: &CollectionTarget) -> Result<Vec<KnowledgeDocument>> {
            if self.fail {
                return Err(Error::Http("connection reset".into()));
            }
            Ok(self.docs.clone())
        }
    }

    fn doc(url: Option<&str>, content: &str) -> KnowledgeDocument {
        KnowledgeDocument {
            source: "test".into(),
            url: url.map(str::to_string),
            title: String::new(),
            content: content.into(),
            published_at: None,
            source_type: "news".into(),
            confidence: 0.8,
        }
    }

    fn manager(max: usize, collectors: Vec<FixedCollector>) -> CollectorManager {
        let manager = CollectorManager::new(max);
        for c in collectors {
            manager.register(Arc::new(c));
        }
        manager
    }

    #[tokio::test]
    async fn test_partial_results() {
        let m = manager(
            10,
            vec![
                FixedCollector {
                    name: "news",
                    docs: vec![doc(Some("https://a.example/1"), "funding")],
                    fail: false,
                },
                FixedCollector {
                    name: "jobs",
                    docs: vec![],
                    fail: false,
                },
                FixedCollector {
                    name: "social",
                    docs: vec![],
                    fail: true,
                },
            ],
        );
        assert_eq!(m.collector_names(), vec!["news", "jobs", "social"]);

        let report = m.collect_all(&CollectionTarget::new("Acme")).await;
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.empty, vec!["jobs"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "social");
        assert!(report.is_partial());
        assert_eq!(report.evidence()[0].url, "https://a.example/1");
    }

    #[tokio::test]
    async fn test_dedup_by_url_and_content() {
        let m = manager(
            10,
            vec![
                FixedCollector {
                    name: "a",
                    docs: vec![
                        doc(Some("https://a.example/1"), "one"),
                        doc(None, "same body"),
                    ],
                    fail: false,
                },
                FixedCollector {
                    name: "b",
                    docs: vec![
                        doc(Some("HTTPS://A.EXAMPLE/1/"), "one again"),
                        doc(None, "same body"),
                        doc(None, "different body"),
                    ],
                    fail: false,
                },
            ],
        );
        let report = m.collect_all(&CollectionTarget::new("Acme")).await;
        assert_eq!(report.documents.len(), 3);
        assert_eq!(report.duplicates_dropped, 2);
        assert!(!report.is_partial());
    }

    #[tokio::test]
    async fn test_caps_total() {
        let docs = (0..5).map(|i| doc(None, &format!("body {}", i))).collect();
        let m = manager(
            3,
            vec![FixedCollector {
                name: "bulk",
                docs,
                fail: false,
            }],
        );
        let report = m.collect_all(&CollectionTarget::new("Acme")).await;
        assert_eq!(report.documents.len(), 3);
    }

    #[tokio::test]
    async fn test_no_collectors() {
        let report = CollectorManager::default()
            .collect_all(&CollectionTarget::new("Acme"))
            .await;
        assert!(report.documents.is_empty());
        assert!(!report.is_partial());
    }
}
