//! Error type shared by the vector math, the store and the chunker

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Different dimensions: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Cannot normalize a zero vector")]
    ZeroVector,

    #[error("Embedding missing on record")]
    MissingEmbedding,

    #[error("Embedding holds a non-finite value")]
    NonFinite,

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Encode error: {0}")]
    Encode(serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
