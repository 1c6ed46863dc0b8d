use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkOptions;
use crate::error::NoaError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub chunking: ChunkingConfig,
    pub indexing: IndexingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `NOA_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("NOA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            llm: LlmConfig::from_env_profiled(p),
            ollama: OllamaConfig::from_env_profiled(p),
            chunking: ChunkingConfig::from_env_profiled(p),
            indexing: IndexingConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  llm:       provider={}, configured={}", self.llm.provider, self.llm.is_configured());
        tracing::info!("  ollama:    url={}, model={}", self.ollama.url, self.ollama.model);
        tracing::info!(
            "  chunking:  size={}, overlap={}, min_words={}, timeout={}s",
            self.chunking.chunk_size,
            self.chunking.overlap,
            self.chunking.min_words_for_optimization,
            self.chunking.llm_timeout_secs,
        );
        tracing::info!(
            "  indexing:  vector_store={}",
            self.indexing.vector_store_id.as_deref().unwrap_or("(none)")
        );
    }

    /// Return a redacted view safe for logs and API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "llm": {
                "provider": self.llm.provider,
                "configured": self.llm.is_configured(),
                "temperature": self.llm.temperature,
                "max_tokens": self.llm.max_tokens,
            },
            "ollama": { "url": self.ollama.url, "model": self.ollama.model },
            "chunking": {
                "chunk_size": self.chunking.chunk_size,
                "overlap": self.chunking.overlap,
                "min_words_for_optimization": self.chunking.min_words_for_optimization,
                "llm_timeout_secs": self.chunking.llm_timeout_secs,
                "max_prompt_chars": self.chunking.max_prompt_chars,
                "min_coverage_ratio": self.chunking.min_coverage_ratio,
                "max_concurrent_blocks": self.chunking.max_concurrent_blocks,
                "chars_per_page": self.chunking.chars_per_page,
            },
            "indexing": { "vector_store_id": self.indexing.vector_store_id },
        })
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama", "none"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "openai"),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.1),
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 2000),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" | "claude" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    /// `LLM_PROVIDER=none` turns semantic optimization off entirely.
    pub fn is_disabled(&self) -> bool {
        matches!(self.provider.as_str(), "none" | "off" | "")
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Preferred words per final chunk.
    pub chunk_size: usize,
    /// Words repeated across coarse block boundaries.
    pub overlap: usize,
    /// Coarse blocks below this word count skip the model call.
    pub min_words_for_optimization: usize,
    pub llm_timeout_secs: u64,
    /// Block text sent to the model is cut at this many characters.
    pub max_prompt_chars: usize,
    /// Minimum share of block words the model output must keep.
    pub min_coverage_ratio: f32,
    pub max_concurrent_blocks: usize,
    pub chars_per_page: usize,
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            chunk_size: profiled_env_parse(p, "CHUNK_SIZE", d.chunk_size),
            overlap: profiled_env_parse(p, "CHUNK_OVERLAP", d.overlap),
            min_words_for_optimization: profiled_env_parse(p, "CHUNK_MIN_WORDS", d.min_words_for_optimization),
            llm_timeout_secs: profiled_env_parse(p, "CHUNK_LLM_TIMEOUT_SECS", d.llm_timeout_secs),
            max_prompt_chars: profiled_env_parse(p, "CHUNK_MAX_PROMPT_CHARS", d.max_prompt_chars),
            min_coverage_ratio: profiled_env_parse(p, "CHUNK_MIN_COVERAGE", d.min_coverage_ratio),
            max_concurrent_blocks: profiled_env_parse(p, "CHUNK_CONCURRENCY", d.max_concurrent_blocks),
            chars_per_page: profiled_env_parse(p, "CHARS_PER_PAGE", d.chars_per_page),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Validated caller options derived from this config.
    pub fn options(&self) -> Result<ChunkOptions, NoaError> {
        ChunkOptions::new(self.chunk_size, self.overlap)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap: 200,
            min_words_for_optimization: 50,
            llm_timeout_secs: 45,
            max_prompt_chars: 12_000,
            min_coverage_ratio: 0.9,
            max_concurrent_blocks: 1,
            chars_per_page: 3000,
        }
    }
}

// ── Indexing hand-off ─────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Target vector store for uploaded chunk batches.
    pub vector_store_id: Option<String>,
}

impl IndexingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            vector_store_id: profiled_env_opt(p, "NOA_VECTOR_STORE_ID"),
        }
    }
}
