//! Splits documents into overlapping word windows ready for embedding

use crate::error::StoreError;
use crate::record::TextChunk;

/// Words longer than this many characters are cut after one more character.
const WORD_BREAK: usize = 50;

/// A labelled section (e.g. a page) of a [`Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentIndex {
    pub label: String,
    pub offset: usize,
    pub length: usize,
}

/// Text assembled from labelled sections.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub source: String,
    text: String,
    indices: Vec<DocumentIndex>,
}

impl Document {
    pub fn new(source: impl Into<String>) -> Document {
        Document { source: source.into(), text: String::new(), indices: Vec::new() }
    }

    /// Document made of a single unlabelled section.
    pub fn from_text(source: impl Into<String>, text: &str) -> Document {
        let mut doc = Document::new(source);
        doc.add(text, "");
        doc
    }

    /// Appends `text` as a new section named `label`.
    pub fn add(&mut self, text: &str, label: impl Into<String>) {
        self.indices.push(DocumentIndex {
            label: label.into(),
            offset: self.text.len(),
            length: text.len(),
        });
        self.text.push_str(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn indices(&self) -> &[DocumentIndex] {
        &self.indices
    }

    /// Label of the section containing byte `offset`.
    pub fn index_at(&self, offset: usize) -> Option<&str> {
        self.indices.iter()
            .find(|i| i.offset <= offset && offset < i.offset + i.length)
            .map(|i| i.label.as_str())
    }

    /// Text from the start of section `label` to the end of the document.
    pub fn section_text(&self, label: &str) -> Option<&str> {
        self.indices.iter()
            .find(|i| i.label == label)
            .map(|i| &self.text[i.offset..])
    }
}

/// Cuts a document into windows of `chunk_size` words, each sharing
/// `overlap` words with the previous one.
#[derive(Debug, Clone, Copy)]
pub struct ChunkGenerator {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkGenerator {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<ChunkGenerator, StoreError> {
        if chunk_size == 0 {
            return Err(StoreError::InvalidInput("chunk size must be at least one word".to_string()));
        }
        if overlap >= chunk_size {
            return Err(StoreError::InvalidInput(format!(
                "overlap ({}) must be smaller than chunk size ({})", overlap, chunk_size
            )));
        }

        Ok(ChunkGenerator { chunk_size, overlap })
    }

    /// Produces every window of `doc` in order. The last window may hold
    /// fewer than `chunk_size` words.
    pub fn chunks(&self, doc: &Document) -> Vec<TextChunk> {
        let text = doc.text();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();

        let mut index = 0;
        while index < text.len() {
            // start of the next window
            let overlap_index = next_words(text, index, step);
            let end = next_words(text, overlap_index, self.overlap);

            chunks.push(TextChunk::new(doc.source.clone(), index, &text[index..end]));

            if end >= text.len() {
                break;
            }
            index = overlap_index;
        }

        chunks
    }
}

/// Byte offset just past the word starting at `start` and its trailing whitespace.
fn next_word(text: &str, start: usize) -> usize {
    let mut chars = text[start..].char_indices().peekable();
    let mut word_len = 0;

    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        chars.next();
        word_len += 1;
        if word_len > WORD_BREAK {
            return start + i + c.len_utf8();
        }
    }

    while let Some(&(_, c)) = chars.peek() {
        if !c.is_whitespace() {
            break;
        }
        chars.next();
    }

    match chars.peek() {
        Some(&(i, _)) => start + i,
        None => text.len(),
    }
}

fn next_words(text: &str, start: usize, count: usize) -> usize {
    (0..count).fold(start, |index, _| next_word(text, index))
}
