//! REST API for memvdb.
//!
//! Provides a stateless HTTP server with JSON endpoints over text chunk
//! collections. Each request includes a `db` field naming the JSON
//! collection file. The server loads the collection per request and saves
//! it after insertions. Vectors arrive precomputed with each chunk; chunks
//! without `values`, or whose `values` length differs from the vectors
//! already in the collection, are skipped.
//!
//! ## Endpoints
//!
//! - `POST /insert` - Append chunks
//! - `POST /search` - Search for the most similar chunks
//! - `POST /get` - Retrieve chunks by position
//!
//! ## Usage
//!
//! ```rust,no_run
//! use actix_web::{App, HttpServer};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     HttpServer::new(|| App::new().configure(memvdb::server::config))
//!         .bind("0.0.0.0:7878")?
//!         .run()
//!         .await
//! }
//! ```

use actix_web::{web, HttpResponse, Responder};
use serde::{Serialize, Deserialize};
use crate::{Precomputed, StoreError, TextChunk, VecStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, warn};


// --- Request structs ---

#[derive(Deserialize)]
struct ChunkEntry {
    #[serde(default)]
    source: String,
    #[serde(default)]
    start_char: usize,
    text: String,
    values: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct Query {
    value: Vec<f32>,
    top_k: usize,
}

#[derive(Deserialize)]
struct InsertRequest {
    db: String,
    chunks: Vec<ChunkEntry>,
}

#[derive(Deserialize)]
struct SearchRequest {
    db: String,
    queries: Vec<Query>,
}

#[derive(Deserialize)]
struct GetRequest {
    db: String,
    indices: Vec<usize>,
}

// --- Response structs ---

#[derive(Serialize)]
struct InsertResponse {
    inserted: usize,
    skipped: usize,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResultGroup>,
}

#[derive(Serialize)]
struct SearchResultGroup {
    matches: Vec<MatchResult>,
    message: String,
}

#[derive(Serialize)]
struct MatchResult {
    source: String,
    start_char: usize,
    char_length: usize,
    text: String,
    score: f32,
}

#[derive(Serialize)]
struct GetResponse {
    results: Vec<GetResult>,
}

#[derive(Serialize)]
struct GetResult {
    index: usize,
    record: Option<TextChunk>,
}


/// Helper function for load or create collection
fn load_or_create(path: &str) -> Result<VecStore<TextChunk>, StoreError> {
    let store: VecStore<TextChunk> = VecStore::new(0, Arc::new(Precomputed));
    if Path::new(path).exists() {
        store.load_json(path)?;
    }

    Ok(store)
}

fn internal_error(e: StoreError) -> HttpResponse {
    error!(error = %e, "request failed");
    HttpResponse::InternalServerError().json(serde_json::json!({"error": e.to_string()}))
}

// --- Handlers ---

async fn insert_handler(body: web::Json<InsertRequest>) -> impl Responder {
    let body = body.into_inner();
    let store = match load_or_create(&body.db) {
        Ok(store) => store,
        Err(e) => return internal_error(e),
    };

    let total = body.chunks.len();
    // The collection keeps the length of its first vector
    let mut dimension = store.get(0).and_then(|chunk| chunk.vector.map(|v| v.len()));
    let chunks: Vec<TextChunk> = body.chunks.into_iter()
        .filter(|entry| {
            let len = match &entry.values {
                Some(values) if !values.is_empty() => values.len(),
                _ => return false,
            };
            match dimension {
                Some(expected) if expected != len => {
                    warn!(expected, got = len, "Different dimension, chunk skipped");
                    false
                }
                Some(_) => true,
                None => {
                    dimension = Some(len);
                    true
                }
            }
        })
        .map(|entry| {
            let mut chunk = TextChunk::new(entry.source, entry.start_char, entry.text);
            chunk.vector = entry.values;
            chunk
        })
        .collect();
    let inserted = store.insert_many(chunks).await;

    if let Err(e) = store.save_json(&body.db) {
        return internal_error(e);
    }

    HttpResponse::Ok().json(InsertResponse { inserted, skipped: total - inserted })
}

async fn search_handler(body: web::Json<SearchRequest>) -> impl Responder {
    let store = match load_or_create(&body.db) {
        Ok(store) => store,
        Err(e) => return internal_error(e),
    };

    let mut results = Vec::new();

    for query in &body.queries {
        match store.find_nearest(&query.value, query.top_k) {
            Ok(res) => {
                results.push(SearchResultGroup {
                    matches: res.into_iter()
                        .map(|n| MatchResult {
                            source: n.record.source,
                            start_char: n.record.start_char,
                            char_length: n.record.char_length,
                            text: n.record.text,
                            score: n.score,
                        })
                        .collect(),
                    message: "Search Success".to_string(),
                });
            }
            Err(e) => {
                results.push(SearchResultGroup {
                    matches: Vec::new(),
                    message: e.to_string(),
                });
            }
        }
    }

    HttpResponse::Ok().json(SearchResponse { results })
}

async fn get_handler(body: web::Json<GetRequest>) -> impl Responder {
    let store = match load_or_create(&body.db) {
        Ok(store) => store,
        Err(e) => return internal_error(e),
    };

    let results = body.indices.iter()
        .map(|&index| GetResult { index, record: store.get(index) })
        .collect();

    HttpResponse::Ok().json(GetResponse { results })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/insert").route(web::post().to(insert_handler)))
       .service(web::resource("/search").route(web::post().to(search_handler)))
       .service(web::resource("/get").route(web::post().to(get_handler)));
}
