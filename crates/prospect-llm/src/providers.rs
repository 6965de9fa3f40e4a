//! External LLM provider completion calls.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API with the system prompt as a top-level field.

use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use prospect_core::{Error, Result};

use crate::types::{ChatMessage, CompletionParams, LLMProvider};

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default endpoint for a provider.
pub fn endpoint(provider: LLMProvider) -> &'static str {
    match provider {
        LLMProvider::OpenAI => OPENAI_CHAT_URL,
        LLMProvider::Groq => GROQ_CHAT_URL,
        LLMProvider::Anthropic => ANTHROPIC_MESSAGES_URL,
    }
}

/// Run one completion against `url` and return the generated text.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    url: &str,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    params: CompletionParams,
) -> Result<String> {
    match provider {
        LLMProvider::OpenAI | LLMProvider::Groq => {
            complete_openai_compat(client, url, messages, model, api_key, params).await
        }
        LLMProvider::Anthropic => {
            complete_anthropic(client, url, messages, model, api_key, params).await
        }
    }
}

pub(crate) fn openai_body(messages: &[ChatMessage], model: &str, params: CompletionParams) -> serde_json::Value {
    let msgs: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": msgs,
        "temperature": params.temperature,
        "max_tokens": params.max_tokens,
    })
}

pub(crate) fn anthropic_body(
    messages: &[ChatMessage],
    model: &str,
    params: CompletionParams,
) -> serde_json::Value {
    let system_msg: Option<&str> = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str());

    let conv_msgs: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != "system")
        .map(|m| json!({"role": m.role, "content": m.content}))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": conv_msgs,
        "temperature": params.temperature,
        "max_tokens": params.max_tokens,
    });
    if let Some(sys) = system_msg {
        body["system"] = json!(sys);
    }
    body
}

async fn send_json(request: reqwest::RequestBuilder, body: &serde_json::Value) -> Result<serde_json::Value> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(Error::RateLimited("LLM API returned 429".into()));
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(Error::Provider(format!("API error {}: {}", status, text)));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Provider(format!("Invalid completion response: {}", e)))
}

async fn complete_openai_compat(
    client: &Client,
    url: &str,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    params: CompletionParams,
) -> Result<String> {
    debug!("Completion from {} with model {}", url, model);
    let body = openai_body(messages, model, params);
    let request = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key));
    let parsed = send_json(request, &body).await?;
    extract_openai_text(&parsed)
}

async fn complete_anthropic(
    client: &Client,
    url: &str,
    messages: &[ChatMessage],
    model: &str,
    api_key: &str,
    params: CompletionParams,
) -> Result<String> {
    debug!("Completion from Anthropic with model {}", model);
    let body = anthropic_body(messages, model, params);
    let request = client
        .post(url)
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01");
    let parsed = send_json(request, &body).await?;
    extract_anthropic_text(&parsed)
}

pub(crate) fn extract_openai_text(parsed: &serde_json::Value) -> Result<String> {
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Provider("Completion response has no message content".into()))
}

pub(crate) fn extract_anthropic_text(parsed: &serde_json::Value) -> Result<String> {
    if parsed["type"].as_str() == Some("error") {
        let msg = parsed["error"]["message"].as_str().unwrap_or("Unknown error");
        return Err(Error::Provider(msg.to_string()));
    }
    let text: String = parsed["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"].as_str() == Some("text"))
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default();
    if text.is_empty() {
        return Err(Error::Provider("Completion response has no text content".into()));
    }
    Ok(text)
}
