//! Embedding functions injected into a [`VecStore`](crate::VecStore)
//!
//! The store only knows [`Embedder`]: take a record, hand back the same
//! record carrying a vector, or `None` to decline it. Text embedding
//! services plug in through [`EmbeddingProvider`] and [`ProviderEmbedder`].

use crate::record::{EmbedText, VectorRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, Deserialize};
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// Turns a record without a vector into one with a vector.
///
/// Returning `None` means the record could not be embedded; the store drops it.
#[async_trait]
pub trait Embedder<T: Send + 'static>: Send + Sync {
    async fn embed(&self, record: T) -> Option<T>;
}

/// Wraps an async closure as an [`Embedder`].
///
/// ```
/// use memvdb::{EmbedFn, TextChunk};
///
/// let embedder = EmbedFn(|mut chunk: TextChunk| async move {
///     chunk.vector = Some(vec![chunk.text.len() as f32]);
///     Some(chunk)
/// });
/// # let _ = embedder;
/// ```
pub struct EmbedFn<F>(pub F);

#[async_trait]
impl<T, F, Fut> Embedder<T> for EmbedFn<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<T>> + Send + 'static,
{
    async fn embed(&self, record: T) -> Option<T> {
        (self.0)(record).await
    }
}

/// Accepts records that already carry a vector and declines the rest.
pub struct Precomputed;

#[async_trait]
impl<T: VectorRecord> Embedder<T> for Precomputed {
    async fn embed(&self, record: T) -> Option<T> {
        if record.vector().is_ok() {
            Some(record)
        } else {
            None
        }
    }
}

/// A remote or local service mapping texts to dense vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String>;
    fn dimension(&self) -> usize;
}

/// Embeds [`EmbedText`] records through an [`EmbeddingProvider`].
///
/// Provider failures and empty answers become declines, so a flaky service
/// never aborts a batch insert.
#[derive(Clone)]
pub struct ProviderEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> ProviderEmbedder {
        ProviderEmbedder { provider }
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }
}

#[async_trait]
impl<T: EmbedText> Embedder<T> for ProviderEmbedder {
    async fn embed(&self, mut record: T) -> Option<T> {
        let texts = vec![record.text().to_string()];
        match self.provider.embed(&texts).await {
            Ok(mut vectors) => match vectors.pop() {
                Some(vector) if !vector.is_empty() => {
                    record.set_vector(vector);
                    Some(record)
                }
                _ => {
                    warn!("embedding provider returned no vector");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "embedding request failed");
                None
            }
        }
    }
}

/// Yields no vectors at all, so every record is declined.
pub struct NoopProvider;

#[async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        Ok(texts.iter().map(|_| vec![]).collect())
    }

    fn dimension(&self) -> usize {
        0
    }
}

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "text-embedding-3-small".to_string()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        let resp = self.client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&OpenAiRequest {
                input: texts.to_vec(),
                model: self.model.clone(),
            })
            .send()
            .await
            .map_err(|e| format!("OpenAI API error: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("OpenAI API {status}: {body}"));
        }

        let result: OpenAiResponse = resp.json().await.map_err(|e| format!("Parse error: {e}"))?;
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        1536 // text-embedding-3-small default
    }
}

#[cfg(test)]
mod embedding_test {
    use super::*;
    use crate::record::TextChunk;

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
            Err("service unavailable".to_string())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct LengthProvider;

    #[async_trait]
    impl EmbeddingProvider for LengthProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_provider_embedder_sets_vector() {
        let embedder = ProviderEmbedder::new(Arc::new(LengthProvider));
        let chunk = embedder.embed(TextChunk::query("abcd")).await.unwrap();
        assert_eq!(chunk.vector, Some(vec![4.0, 1.0]));
        assert_eq!(embedder.dimension(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_declines() {
        let embedder = ProviderEmbedder::new(Arc::new(FailingProvider));
        let result: Option<TextChunk> = embedder.embed(TextChunk::query("abcd")).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_noop_provider_declines() {
        let embedder = ProviderEmbedder::new(Arc::new(NoopProvider));
        let result: Option<TextChunk> = embedder.embed(TextChunk::query("abcd")).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_precomputed_passes_only_vectorized() {
        let mut with = TextChunk::query("a");
        with.vector = Some(vec![1.0]);
        let without = TextChunk::query("b");

        assert!(Precomputed.embed(with).await.is_some());
        assert!(Precomputed.embed(without).await.is_none());
    }

    #[tokio::test]
    async fn test_embed_fn_wraps_closure() {
        let embedder = EmbedFn(|mut chunk: TextChunk| async move {
            chunk.vector = Some(vec![2.0]);
            Some(chunk)
        });
        let chunk = embedder.embed(TextChunk::query("x")).await.unwrap();
        assert_eq!(chunk.vector, Some(vec![2.0]));
    }
}
