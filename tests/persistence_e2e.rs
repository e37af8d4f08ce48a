use memvdb::{Precomputed, TextChunk, VecStore};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

fn random_vector(dim: usize, seed: u64) -> Vec<f32> {
    // Simple LCG pseudo-random generator
    let mut state = seed;
    (0..dim)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            // Map to [-1.0, 1.0]
            ((state >> 33) as f32) / (u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

fn new_store(dim: usize) -> VecStore<TextChunk> {
    VecStore::new(dim, Arc::new(Precomputed))
}

#[tokio::test]
async fn test_save_load_10k_vectors_and_search() {
    let dim = 128;
    let num_vectors = 10_000;
    let num_searches = 50;

    println!("\n=== Persistence E2E Test ===");
    println!("Vectors: {}, Dimensions: {}, Searches: {}\n", num_vectors, dim, num_searches);

    // Phase 1: Create store and insert vectors
    let start = Instant::now();
    let store = new_store(dim);
    let chunks = (0..num_vectors).map(|i| {
        let mut chunk = TextChunk::new("random", i, format!("chunk_{}", i));
        chunk.vector = Some(random_vector(dim, i as u64));
        chunk
    });
    assert_eq!(store.insert_many(chunks).await, num_vectors);
    println!("Phase 1 - Insert {} records: {:.3}s", num_vectors, start.elapsed().as_secs_f64());

    // Phase 2: Save to file
    let start = Instant::now();
    let temp = NamedTempFile::new().unwrap();
    let path = temp.path();
    store.save_json(path).unwrap();
    let file_size = std::fs::metadata(path).unwrap().len();
    println!("Phase 2 - Save to disk: {:.3}s (file size: {:.2} MB)",
        start.elapsed().as_secs_f64(), file_size as f64 / 1_048_576.0);

    // Phase 3: Load into a fresh store
    let start = Instant::now();
    let loaded = new_store(dim);
    assert_eq!(loaded.load_json(path).unwrap(), num_vectors);
    println!("Phase 3 - Load from disk: {:.3}s", start.elapsed().as_secs_f64());

    // Order and exact bits survive the round trip
    let before = store.records();
    let after = loaded.records();
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.text, b.text);
        let a_bits: Vec<u32> = a.vector.as_ref().unwrap().iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.vector.as_ref().unwrap().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    // Phase 4: Searches agree between original and loaded store
    let start = Instant::now();
    for i in 0..num_searches {
        let query = random_vector(dim, (num_vectors + i) as u64);
        let results = loaded.find_nearest(&query, 10).unwrap();
        let expected = store.find_nearest(&query, 10).unwrap();

        assert_eq!(results.len(), 10);
        for w in results.windows(2) {
            assert!(w[0].score >= w[1].score, "Results not sorted by score");
        }
        let ids: Vec<&str> = results.iter().map(|n| n.record.text.as_str()).collect();
        let expected_ids: Vec<&str> = expected.iter().map(|n| n.record.text.as_str()).collect();
        assert_eq!(ids, expected_ids);
    }
    println!("Phase 4 - {} searches: {:.3}s\n", num_searches, start.elapsed().as_secs_f64());
}

#[tokio::test]
async fn test_top_k_matches_full_sort() {
    let dim = 16;
    let store = new_store(dim);
    for i in 0..500 {
        let mut chunk = TextChunk::new("random", i, i.to_string());
        chunk.vector = Some(random_vector(dim, 7_000 + i as u64));
        store.insert(chunk).await;
    }

    let query = random_vector(dim, 42);
    let mut all: Vec<(usize, f32)> = store.records().iter().enumerate()
        .map(|(i, c)| (i, memvdb::vector::dot_product(c.vector.as_ref().unwrap(), &query).unwrap()))
        .collect();
    // Stable sort keeps insertion order on ties
    all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    for k in [1, 5, 25, 500, 1000] {
        let results = store.find_nearest(&query, k).unwrap();
        assert_eq!(results.len(), k.min(500));
        for (n, (i, score)) in results.iter().zip(all.iter()) {
            assert_eq!(n.record.start_char, *i);
            assert_eq!(n.score, *score);
        }
    }
}
