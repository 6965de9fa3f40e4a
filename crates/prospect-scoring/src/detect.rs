//! Keyword-based signal detection over collected documents.

use prospect_connectors::KnowledgeDocument;
use prospect_core::SignalResult;
use tracing::debug;

use crate::signals::{strip_hiring_freeze, SignalCatalog};

/// One `SignalResult` per catalog signal, in catalog order. A document
/// supports a signal when its title or content contains any of the signal's
/// keywords (case-insensitive). Hiring signals ignore hiring-freeze phrasing.
pub fn detect_signals(documents: &[KnowledgeDocument], catalog: &SignalCatalog) -> Vec<SignalResult> {
    let texts: Vec<String> = documents
        .iter()
        .map(|d| d.full_text().to_lowercase())
        .collect();
    let hiring_texts: Vec<String> = texts
        .iter()
        .map(|t| strip_hiring_freeze(t).into_owned())
        .collect();

    catalog
        .signals()
        .iter()
        .map(|def| {
            let searched = if catalog.is_hiring(&def.id) {
                &hiring_texts
            } else {
                &texts
            };
            let mut matched_keywords: Vec<&str> = Vec::new();
            let evidence: Vec<_> = documents
                .iter()
                .zip(searched)
                .filter(|(_, text)| {
                    let hit = def.keywords.iter().find(|k| text.contains(k.as_str()));
                    if let Some(k) = hit {
                        if !matched_keywords.contains(&k.as_str()) {
                            matched_keywords.push(k.as_str());
                        }
                    }
                    hit.is_some()
                })
                .map(|(doc, _)| doc.to_evidence())
                .collect();

            let reasoning = if evidence.is_empty() {
                format!("No documents mention {}", def.name.to_lowercase())
            } else {
                format!(
                    "{} document(s) matched on: {}",
                    evidence.len(),
                    matched_keywords.join(", ")
                )
            };
            debug!("Signal {}: {} evidence items", def.id, evidence.len());

            SignalResult {
                signal_id: def.id.clone(),
                found: !evidence.is_empty(),
                evidence,
                reasoning,
            }
        })
        .collect()
}
