//! # MEMVDB - An In-Memory Vector Store
//!
//! MEMVDB keeps vector-bearing records in memory and finds the ones whose
//! embeddings have the highest dot product with a query vector, using an
//! exact linear scan with a bounded top-k buffer. Records get their vectors
//! from an embedding function injected at construction, and the whole
//! collection can be saved to and loaded from a single JSON document.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use memvdb::{EmbedFn, TextChunk, VecStore};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! // Fake embedding: one dimension per vowel count
//! let embedder = EmbedFn(|mut chunk: TextChunk| async move {
//!     let a = chunk.text.matches('a').count() as f32;
//!     let o = chunk.text.matches('o').count() as f32;
//!     chunk.vector = Some(vec![a, o]);
//!     Some(chunk)
//! });
//! let store: VecStore<TextChunk> = VecStore::new(2, Arc::new(embedder));
//!
//! store.insert(TextChunk::new("doc", 0, "banana")).await;
//! store.insert(TextChunk::new("doc", 7, "oolong")).await;
//!
//! let results = store.find_nearest(&[1.0, 0.0], 1).unwrap();
//! assert_eq!(results[0].record.text, "banana");
//! # });
//! ```

pub mod vector;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod error;
pub mod record;
pub mod server;
mod db;

// Re-export the store as the primary public API
pub use db::{Neighbor, VecStore};
pub use embedding::{EmbedFn, Embedder, Precomputed, ProviderEmbedder};
pub use error::StoreError;
pub use record::{EmbedText, TextChunk, VectorRecord};
