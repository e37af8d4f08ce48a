//! Records that can live inside a [`VecStore`](crate::VecStore)

use crate::error::StoreError;
use serde::{Serialize, Deserialize, de::DeserializeOwned};

/// Anything the store can hold: a self-contained, serializable value that
/// can report its embedding.
///
/// Implementations return [`StoreError::MissingEmbedding`] until a vector
/// has been assigned.
pub trait VectorRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn vector(&self) -> Result<&[f32], StoreError>;
}

/// A record whose embedding is computed from a piece of text.
pub trait EmbedText: VectorRecord {
    fn text(&self) -> &str;
    fn set_vector(&mut self, vector: Vec<f32>);
}

/// A window of text cut from a larger document.
///
/// `start_char` and `char_length` are byte offsets into the source text,
/// always on `char` boundaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub source: String,
    pub start_char: usize,
    pub char_length: usize,
    pub text: String,
    #[serde(default)]
    pub vector: Option<Vec<f32>>,
}

impl TextChunk {
    pub fn new(source: impl Into<String>, start_char: usize, text: impl Into<String>) -> TextChunk {
        let text = text.into();
        TextChunk {
            source: source.into(),
            start_char,
            char_length: text.len(),
            text,
            vector: None,
        }
    }

    /// Chunk holding only a query string, used to embed search text.
    pub fn query(text: impl Into<String>) -> TextChunk {
        TextChunk::new("", 0, text)
    }

    /// Embedding services often answer in `f64`; narrow to the stored width.
    pub fn set_vector_f64(&mut self, vector: &[f64]) {
        self.vector = Some(vector.iter().map(|x| *x as f32).collect());
    }
}

impl VectorRecord for TextChunk {
    fn vector(&self) -> Result<&[f32], StoreError> {
        self.vector.as_deref().ok_or(StoreError::MissingEmbedding)
    }
}

impl EmbedText for TextChunk {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_vector(&mut self, vector: Vec<f32>) {
        self.vector = Some(vector);
    }
}
