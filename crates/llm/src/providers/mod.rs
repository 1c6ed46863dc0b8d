pub mod claude;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use noa_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider, Message};

/// Create the LLM provider selected by config.
///
/// Returns `Ok(None)` when `LLM_PROVIDER=none`; callers then run the
/// deterministic chunking path only.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Option<Arc<dyn LlmProvider>>, LlmError> {
    if llm_config.is_disabled() {
        return Ok(None);
    }
    let provider: Arc<dyn LlmProvider> = match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Arc::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.openai_model.clone(),
                base_url.trim_end_matches('/').to_string(),
            ))
        }
        "anthropic" | "claude" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Arc::new(claude::ClaudeProvider::new(
                api_key.clone(),
                llm_config.anthropic_model.clone(),
            ))
        }
        "ollama" => Arc::new(ollama::OllamaProvider::new(
            ollama_config.url.trim_end_matches('/').to_string(),
            ollama_config.model.clone(),
        )),
        other => {
            return Err(LlmError::NotConfigured(format!(
                "unknown LLM provider: '{}'",
                other
            )))
        }
    };
    Ok(Some(provider))
}

/// Send a JSON request and pull the reply text at `pointer` (a JSON pointer
/// such as `/choices/0/message/content`). Any non-2xx status is an API error
/// carrying the response body.
async fn send_for_text(request: reqwest::RequestBuilder, pointer: &str) -> Result<String, LlmError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            body,
        });
    }

    let reply: serde_json::Value = response.json().await?;
    reply_text(&reply, pointer)
}

fn reply_text(reply: &serde_json::Value, pointer: &str) -> Result<String, LlmError> {
    reply
        .pointer(pointer)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError(format!("no text at {pointer}")))
}

/// OpenAI-style `{role, content}` message array.
fn chat_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: "claude".into(),
            temperature: 0.1,
            max_tokens: 2000,
        }
    }

    fn ollama() -> OllamaConfig {
        OllamaConfig {
            url: "http://localhost:11434/".into(),
            model: "llama3.2".into(),
        }
    }

    #[test]
    fn none_disables_the_provider() {
        assert!(create_provider(&llm("none"), &ollama()).unwrap().is_none());
    }

    #[test]
    fn missing_key_is_not_configured() {
        let err = create_provider(&llm("openai"), &ollama()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(_)));
        let err = create_provider(&llm("anthropic"), &ollama()).err().unwrap();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = create_provider(&llm("palm"), &ollama()).err().unwrap();
        assert!(err.to_string().contains("palm"));
    }

    #[test]
    fn builds_configured_providers() {
        let p = create_provider(&llm("ollama"), &ollama()).unwrap().unwrap();
        assert_eq!(p.name(), "ollama");

        let mut cfg = llm("openai");
        cfg.openai_api_key = Some("sk-test".into());
        let p = create_provider(&cfg, &ollama()).unwrap().unwrap();
        assert_eq!(p.name(), "openai");
    }

    #[test]
    fn reply_text_follows_pointer() {
        let reply = serde_json::json!({"choices": [{"message": {"content": "[]"}}]});
        assert_eq!(reply_text(&reply, "/choices/0/message/content").unwrap(), "[]");
        let err = reply_text(&reply, "/content/0/text").unwrap_err();
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[test]
    fn chat_messages_keep_roles() {
        let out = chat_messages(&[Message::system("rules"), Message::user("hi")]);
        assert_eq!(out[0]["role"], "system");
        assert_eq!(out[1]["content"], "hi");
    }
}
