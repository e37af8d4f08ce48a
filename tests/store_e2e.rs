use memvdb::chunker::{ChunkGenerator, Document};
use memvdb::vector::{l2_norm, length};
use memvdb::{EmbedFn, Embedder, StoreError, TextChunk, VecStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Normalized letter histogram, declined for text without letters
fn letter_embedding(text: &str) -> Option<Vec<f32>> {
    let mut counts = vec![0.0f32; 26];
    for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
        counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
    }
    l2_norm(&counts).ok()
}

fn letter_embedder() -> EmbedFn<impl Fn(TextChunk) -> std::future::Ready<Option<TextChunk>> + Send + Sync + 'static> {
    EmbedFn(|mut chunk: TextChunk| {
        let vector = letter_embedding(&chunk.text);
        std::future::ready(vector.map(|v| {
            chunk.vector = Some(v);
            chunk
        }))
    })
}

#[tokio::test]
async fn test_chunk_embed_and_search() {
    let mut doc = Document::new("story.txt");
    doc.add("zzz zzz zzz zzz ", "0");
    doc.add("aaa aaa aaa aaa ", "1");
    doc.add("mmm mmm mmm mmm", "2");

    let chunks = ChunkGenerator::new(4, 0).unwrap().chunks(&doc);
    assert_eq!(chunks.len(), 3);

    let store: VecStore<TextChunk> = VecStore::new(26, Arc::new(letter_embedder()));
    assert_eq!(store.insert_many(chunks).await, 3);

    let query = letter_embedder().embed(TextChunk::query("a")).await.unwrap();
    let results = store.find_nearest(query.vector.as_ref().unwrap(), 1).unwrap();

    assert_eq!(results.len(), 1);
    let hit = &results[0].record;
    assert_eq!(hit.text, "aaa aaa aaa aaa ");
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(doc.index_at(hit.start_char), Some("1"));
    assert_eq!(&doc.text()[hit.start_char..hit.start_char + hit.char_length], hit.text);
}

#[tokio::test]
async fn test_declined_chunks_are_dropped() {
    let doc = Document::from_text("numbers.txt", "abc 123 456 def");
    let chunks = ChunkGenerator::new(1, 0).unwrap().chunks(&doc);
    assert_eq!(chunks.len(), 4);

    let store: VecStore<TextChunk> = VecStore::new(26, Arc::new(letter_embedder()));
    assert_eq!(store.insert_many(chunks).await, 2);

    let texts: Vec<String> = store.records().into_iter().map(|c| c.text).collect();
    assert_eq!(texts, vec!["abc ", "def"]);
}

#[tokio::test]
async fn test_stored_vectors_are_unit_length() {
    let doc = Document::from_text("doc", "the quick brown fox jumps over the lazy dog");
    let chunks = ChunkGenerator::new(3, 1).unwrap().chunks(&doc);

    let store: VecStore<TextChunk> = VecStore::new(26, Arc::new(letter_embedder()));
    store.insert_many(chunks).await;

    for chunk in store.records() {
        assert!((length(chunk.vector.as_ref().unwrap()) - 1.0).abs() < 1e-5);
    }
}

#[tokio::test]
async fn test_embedder_called_once_per_record() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let embedder = EmbedFn(move |mut chunk: TextChunk| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move {
            chunk.vector = Some(vec![1.0]);
            Some(chunk)
        }
    });
    let store: VecStore<TextChunk> = VecStore::new(1, Arc::new(embedder));

    store.insert_many((0..5).map(|i| TextChunk::query(i.to_string()))).await;
    store.find_nearest(&[1.0], 3).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_mismatched_query_fails_fast() {
    let store: VecStore<TextChunk> = VecStore::new(26, Arc::new(letter_embedder()));
    store.insert(TextChunk::query("abc")).await;

    let result = store.find_nearest(&[1.0, 0.0], 1);
    assert!(matches!(result, Err(StoreError::LengthMismatch { left: 26, right: 2 })));
}
