//! Scoring model configuration: persisted provider choice and sampling.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use prospect_core::{Error, Result};

use crate::types::{CompletionParams, LLMProvider, ResolvedProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Provider choice for intent scoring, kept in `llm-config.json`.
///
/// Keys missing from the file are read from the provider's environment
/// variable at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// `auto` or a provider name.
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_temperature")]
    pub scoring_temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub scoring_max_tokens: usize,
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Providers whose key came from the environment. `save` leaves them out.
    #[serde(skip)]
    pub(crate) env_keys: Vec<LLMProvider>,
}

/// Selection order in `auto` mode.
const AUTO_ORDER: [LLMProvider; 3] = [LLMProvider::Anthropic, LLMProvider::Groq, LLMProvider::OpenAI];

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_temperature() -> f64 {
    CompletionParams::default().temperature
}
fn default_max_tokens() -> usize {
    CompletionParams::default().max_tokens
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            groq_model: default_groq_model(),
            scoring_temperature: default_temperature(),
            scoring_max_tokens: default_max_tokens(),
            config_path: PathBuf::new(),
            env_keys: Vec::new(),
        }
    }
}

fn env_var_for(provider: LLMProvider) -> &'static str {
    match provider {
        LLMProvider::OpenAI => "OPENAI_API_KEY",
        LLMProvider::Anthropic => "ANTHROPIC_API_KEY",
        LLMProvider::Groq => "GROQ_API_KEY",
    }
}

impl LLMConfig {
    /// Read the config file if present, then fill absent keys from the
    /// environment. A missing or unreadable file yields defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(config_path) {
            Ok(raw) => serde_json::from_str::<LLMConfig>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring invalid {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => LLMConfig::default(),
        };
        config.config_path = config_path.to_path_buf();

        for provider in AUTO_ORDER {
            let slot = config.key_slot(provider);
            if slot.as_deref().map_or(true, |k| k.trim().is_empty()) {
                *slot = std::env::var(env_var_for(provider))
                    .ok()
                    .filter(|v| !v.trim().is_empty());
                if slot.is_some() {
                    config.env_keys.push(provider);
                }
            }
        }
        config
    }

    /// Write the config back to `config_path`. Keys taken from the
    /// environment are not persisted.
    pub fn save(&self) -> Result<()> {
        let mut persisted = self.clone();
        for provider in &self.env_keys {
            *persisted.key_slot(*provider) = None;
        }
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, serde_json::to_string_pretty(&persisted)?)?;
        info!("Scoring model config written to {}", self.config_path.display());
        Ok(())
    }

    /// Set the preferred provider (`auto` or a provider name) and, for a
    /// named provider, optionally its model.
    pub fn set_preference(&mut self, provider: &str, model: Option<&str>) -> Result<()> {
        let provider = provider.trim().to_ascii_lowercase();
        let slot = match provider.as_str() {
            "auto" => None,
            "openai" => Some(&mut self.openai_model),
            "anthropic" => Some(&mut self.anthropic_model),
            "groq" => Some(&mut self.groq_model),
            other => return Err(Error::Config(format!("Unknown provider: {}", other))),
        };
        match (slot, model.map(str::trim).filter(|m| !m.is_empty())) {
            (Some(slot), Some(model)) => *slot = model.to_string(),
            (None, Some(_)) => {
                return Err(Error::Config("A model can only be set for a named provider".into()))
            }
            _ => {}
        }
        self.preferred_provider = provider;
        Ok(())
    }

    fn key_slot(&mut self, provider: LLMProvider) -> &mut Option<String> {
        match provider {
            LLMProvider::OpenAI => &mut self.openai_api_key,
            LLMProvider::Anthropic => &mut self.anthropic_api_key,
            LLMProvider::Groq => &mut self.groq_api_key,
        }
    }

    fn candidate(&self, provider: LLMProvider) -> Option<ResolvedProvider> {
        let (model, key) = match provider {
            LLMProvider::OpenAI => (&self.openai_model, &self.openai_api_key),
            LLMProvider::Anthropic => (&self.anthropic_model, &self.anthropic_api_key),
            LLMProvider::Groq => (&self.groq_model, &self.groq_api_key),
        };
        key.as_ref().map(|k| ResolvedProvider {
            provider,
            model: model.clone(),
            api_key: k.clone(),
        })
    }

    /// The provider to score with: the preferred one if it has a key, or in
    /// `auto` mode the first keyed provider in [`AUTO_ORDER`].
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        match self.preferred_provider.to_ascii_lowercase().as_str() {
            "auto" => AUTO_ORDER.into_iter().find_map(|p| self.candidate(p)),
            "openai" => self.candidate(LLMProvider::OpenAI),
            "anthropic" => self.candidate(LLMProvider::Anthropic),
            "groq" => self.candidate(LLMProvider::Groq),
            _ => None,
        }
    }

    /// Like [`resolve_provider`](Self::resolve_provider) but reports why
    /// nothing could be selected.
    pub fn require_provider(&self) -> Result<ResolvedProvider> {
        self.resolve_provider().ok_or_else(|| {
            Error::Config(format!(
                "No scoring model provider has an API key (preferred: {})",
                self.preferred_provider
            ))
        })
    }

    /// Sampling parameters for scoring requests.
    pub fn completion_params(&self) -> CompletionParams {
        CompletionParams {
            temperature: self.scoring_temperature.clamp(0.0, 2.0),
            max_tokens: self.scoring_max_tokens.max(1),
        }
    }
}
