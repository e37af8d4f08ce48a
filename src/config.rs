//! Runtime settings read from `MEMVDB_*` environment variables

use crate::embedding::{EmbeddingProvider, NoopProvider, OpenAiProvider};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: usize = 200;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
pub const DEFAULT_BIND: &str = "0.0.0.0:7878";

#[derive(Debug, Clone)]
pub struct Config {
    /// `openai` or `noop`
    pub provider: String,
    pub api_key: String,
    pub model: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub bind: String,
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        Config {
            provider: lookup("MEMVDB_EMBEDDING_PROVIDER").unwrap_or_else(|| "noop".into()),
            api_key: lookup("MEMVDB_EMBEDDING_API_KEY").unwrap_or_default(),
            model: lookup("MEMVDB_EMBEDDING_MODEL"),
            chunk_size: parse_or(&lookup, "MEMVDB_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            chunk_overlap: parse_or(&lookup, "MEMVDB_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP),
            bind: lookup("MEMVDB_BIND").unwrap_or_else(|| DEFAULT_BIND.into()),
        }
    }

    pub fn embedding_provider(&self) -> Arc<dyn EmbeddingProvider> {
        match self.provider.as_str() {
            "openai" => Arc::new(OpenAiProvider::new(self.api_key.clone(), self.model.clone())),
            "noop" => Arc::new(NoopProvider),
            other => {
                warn!(provider = other, "unknown embedding provider, falling back to noop");
                Arc::new(NoopProvider)
            }
        }
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default, "invalid number, using default");
            default
        }),
    }
}
