//! Sub-command handlers. Each prints a JSON document on success.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use serde_json::json;
use tracing::warn;

use prospect_connectors::{
    CollectionTarget, CollectorManager, EnrichmentSpec, JsonFileCollector, SearchJobSpec,
};
use prospect_core::EntityKind;
use prospect_ingest::{extract_keywords, DEFAULT_KEYWORD_LIMIT};
use prospect_llm::LLMConfig;
use prospect_scoring::{detect_signals, ScoringInput, SignalReport};
use prospect_store::EntityStore;

use crate::state::AppContext;

const COMMANDS: &[&str] = &[
    "search", "enrich", "refresh", "embed", "similar", "delete", "score", "signals", "model",
    "stats",
];

const DEFAULT_SEARCH_COUNT: usize = 10;
const DEFAULT_TOP_K: usize = 10;
/// Keyword matches considered per requested hit when pre-filtering.
const PREFILTER_FACTOR: usize = 20;

pub fn is_known(command: &str) -> bool {
    COMMANDS.contains(&command)
}

pub async fn run(ctx: &AppContext, command: &str, args: &[String]) -> anyhow::Result<()> {
    match command {
        "search" => search(ctx, args).await,
        "enrich" => enrich(ctx, args).await,
        "refresh" => refresh(ctx, args).await,
        "embed" => embed(ctx, args).await,
        "similar" => similar(ctx, args).await,
        "delete" => delete(ctx, args),
        "score" => score(ctx, args).await,
        "signals" => signals(ctx, args).await,
        "model" => model(ctx, args),
        "stats" => print_json(&json!({
            "data_dir": ctx.config.data_paths.root,
            "embedding_model": ctx.config.embedding.model,
            "primary_embeddings": ctx.generator.has_primary(),
            "scoring_model": ctx.engine.has_model(),
            "store": ctx.store.get_stats()?,
        })),
        other => bail!("Unknown command: {}", other),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required<'a>(args: &'a [String], index: usize, usage: &str) -> anyhow::Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| anyhow!("Usage: prospect {}", usage))
}

fn parse_kind(raw: Option<&String>) -> anyhow::Result<Option<EntityKind>> {
    raw.map(|k| EntityKind::parse(k).ok_or_else(|| anyhow!("Unknown entity kind: {}", k)))
        .transpose()
}

async fn search(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let usage = "search <query> [count] [company|employee]";
    let query = required(args, 0, usage)?;
    let count = match args.get(1) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid count: {}", raw))?,
        None => DEFAULT_SEARCH_COUNT,
    };
    let kind = parse_kind(args.get(2))?.unwrap_or(EntityKind::Company);

    let exclude = ctx.store.known_external_ids(kind)?;
    let spec = SearchJobSpec::new(query, count, kind)
        .with_exclude(exclude)
        .with_min_results(count);

    let results = ctx.orchestrator()?.create_and_await_with_retry(&spec).await?;
    if let Some(warning) = &results.warning {
        warn!("{}", warning);
    }
    let report = ctx.pipeline.materialize(&results, kind).await?;
    let items = results.len();

    print_json(&json!({
        "job_id": results.job_id,
        "items": items,
        "warning": results.warning,
        "embeddings": report,
    }))
}

async fn enrich(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let usage = "enrich <job-id> <description>";
    let job_id = required(args, 0, usage)?;
    let description = required(args, 1, usage)?;

    let results = ctx
        .orchestrator()?
        .enrich_and_await(job_id, &EnrichmentSpec::new(description))
        .await?;
    let report = ctx.pipeline.materialize(&results, EntityKind::Enrichment).await?;
    let items = results.len();

    print_json(&json!({
        "job_id": results.job_id,
        "items": items,
        "embeddings": report,
    }))
}

async fn refresh(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let force = args.iter().any(|a| a == "--force");
    let kind = parse_kind(args.iter().find(|a| !a.starts_with("--")))?;
    let report = ctx.pipeline.refresh_all(kind, force).await?;
    print_json(&report)
}

async fn embed(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let text = required(args, 0, "embed <text>")?;
    let embedding = ctx.generator.embed(text).await;
    print_json(&json!({
        "source": embedding.source,
        "dimension": embedding.dimension(),
        "norm": embedding.norm(),
        "generated_at": embedding.generated_at,
        "keywords": extract_keywords(text, DEFAULT_KEYWORD_LIMIT),
    }))
}

/// With `--keywords`, only entities sharing a stored keyword with the text
/// are ranked.
async fn similar(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let usage = "similar <text> [top-k] [--keywords]";
    let prefilter = args.iter().any(|a| a == "--keywords");
    let positional: Vec<String> = args.iter().filter(|a| !a.starts_with("--")).cloned().collect();
    let text = required(&positional, 0, usage)?;
    let top_k = match positional.get(1) {
        Some(raw) => raw.parse().with_context(|| format!("Invalid top-k: {}", raw))?,
        None => DEFAULT_TOP_K,
    };
    let embedding = ctx.generator.embed(text).await;

    if !prefilter {
        let hits = ctx.store.find_similar(&embedding.vector, None, top_k)?;
        return print_json(&hits);
    }

    let keywords = extract_keywords(text, DEFAULT_KEYWORD_LIMIT);
    let candidates: HashSet<String> = ctx
        .store
        .search_by_keywords(&keywords, None, top_k.saturating_mul(PREFILTER_FACTOR))?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let mut hits = ctx.store.find_similar(&embedding.vector, None, usize::MAX)?;
    hits.retain(|h| candidates.contains(&h.entity_id));
    hits.truncate(top_k);
    print_json(&json!({
        "keywords": keywords,
        "candidates": candidates.len(),
        "hits": hits,
    }))
}

fn delete(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let id = required(args, 0, "delete <entity-id>")?;
    if !ctx.store.delete_entity(id)? {
        bail!("Entity not found: {}", id);
    }
    print_json(&json!({ "deleted": id }))
}

/// Resolve a scoring input file. Documents that are not valid JSON score
/// zero like any other unusable input.
async fn score(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let path = required(args, 0, "score <input.json>")?;
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let input = match serde_json::from_str(&data) {
        Ok(value) => ScoringInput::from_json(value),
        Err(e) => ScoringInput::Unusable(format!("Invalid JSON in {}: {}", path, e)),
    };
    let result = ctx.engine.calculate_intent_score(input).await;
    print_json(&result)
}

/// Show the scoring model in use, or set the preferred provider and model.
/// A new preference takes effect on the next run.
fn model(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let mut config = LLMConfig::load(&ctx.config.data_paths.llm_config_file);
    if let Some(provider) = args.first() {
        config.set_preference(provider, args.get(1).map(String::as_str))?;
        config.save()?;
    }

    let resolved = match config.require_provider() {
        Ok(r) => json!({ "provider": r.provider, "model": r.model }),
        Err(e) => json!({ "error": e.to_string() }),
    };
    let params = config.completion_params();
    print_json(&json!({
        "preferred_provider": config.preferred_provider,
        "resolved": resolved,
        "temperature": params.temperature,
        "max_tokens": params.max_tokens,
    }))
}

async fn signals(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let usage = "signals <company> <docs.json...>";
    let company = required(args, 0, usage)?;
    if args.len() < 2 {
        bail!("Usage: prospect {}", usage);
    }

    let manager = CollectorManager::default();
    for path in &args[1..] {
        manager.register(Arc::new(JsonFileCollector::new(path)));
    }
    let collection = manager.collect_all(&CollectionTarget::new(company)).await;
    for (name, error) in &collection.failures {
        warn!("Collector {} failed: {}", name, error);
    }

    let report = SignalReport {
        company_name: company.to_string(),
        signals: detect_signals(&collection.documents, ctx.engine.catalog()),
        generated_at: Some(collection.collected_at),
    };
    let result = ctx
        .engine
        .calculate_intent_score(ScoringInput::RawReport(report.clone()))
        .await;

    print_json(&json!({
        "documents": collection.documents.len(),
        "duplicates_dropped": collection.duplicates_dropped,
        "partial": collection.is_partial(),
        "report": report,
        "score": result,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_args() {
        let args = vec!["acme".to_string(), "  ".to_string()];
        assert_eq!(required(&args, 0, "x").unwrap(), "acme");
        assert!(required(&args, 1, "x").is_err());
        assert!(required(&args, 2, "x").is_err());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind(None).unwrap(), None);
        assert_eq!(
            parse_kind(Some(&"people".to_string())).unwrap(),
            Some(EntityKind::Employee)
        );
        assert!(parse_kind(Some(&"planet".to_string())).is_err());
        assert!(is_known("signals"));
        assert!(is_known("model"));
        assert!(!is_known("serve"));
    }
}
