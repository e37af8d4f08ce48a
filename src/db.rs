//! The database module
//! Provide insertion, top-k similarity search and JSON persistence

use crate::embedding::Embedder;
use crate::error::StoreError;
use crate::record::VectorRecord;
use crate::vector::dot_product;
use parking_lot::RwLock;
use serde::{Serialize, Deserialize};
use std::{
    fs::File,
    io::{
        BufReader,
        BufWriter,
        Read,
        Write,
    },
    path::Path,
    sync::Arc,
};
use tracing::{debug, info, warn};

/// One search hit: the record and its dot product with the query.
#[derive(Debug, Clone, Serialize)]
pub struct Neighbor<T> {
    pub score: f32,
    pub record: T,
}

#[derive(Serialize)]
struct CollectionRef<'a, T> {
    vector_objects: &'a [T],
}

#[derive(Deserialize)]
struct CollectionData<T> {
    vector_objects: Vec<T>,
}

/// An in-memory collection of vector-bearing records.
///
/// Appends and full replacement take the write lock; searches and
/// serialization share the read lock. The embedding function is awaited
/// before the lock is taken, so a slow embedding service never blocks readers.
pub struct VecStore<T: VectorRecord> {
    records: RwLock<Vec<T>>,
    dimensions: usize,
    embedder: Arc<dyn Embedder<T>>,
}

impl<T: VectorRecord> VecStore<T> {
    /// Creates an empty store.
    ///
    /// `dimensions` is a hint only: inserted vectors of another length are
    /// logged but still kept. Pass `0` to skip the check.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use memvdb::{Precomputed, TextChunk, VecStore};
    ///
    /// let store: VecStore<TextChunk> = VecStore::new(3, Arc::new(Precomputed));
    /// assert_eq!(store.len(), 0);
    /// ```
    pub fn new(dimensions: usize, embedder: Arc<dyn Embedder<T>>) -> VecStore<T> {
        VecStore { records: RwLock::new(Vec::new()), dimensions, embedder }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns the number of records in the store.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns a copy of the record at `index` in insertion order.
    pub fn get(&self, index: usize) -> Option<T> {
        self.records.read().get(index).cloned()
    }

    /// Copy of every record, in insertion order.
    pub fn records(&self) -> Vec<T> {
        self.records.read().clone()
    }

    /// Embeds `record` and appends it.
    ///
    /// Returns `false` when the embedding function declined the record, or
    /// handed it back without a vector or with a NaN or infinite component;
    /// the store is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use memvdb::{Precomputed, TextChunk, VecStore};
    ///
    /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
    /// let store: VecStore<TextChunk> = VecStore::new(2, Arc::new(Precomputed));
    ///
    /// let mut chunk = TextChunk::new("doc.txt", 0, "hello");
    /// chunk.vector = Some(vec![1.0, 0.0]);
    /// assert!(store.insert(chunk).await);
    ///
    /// // No vector, Precomputed declines it
    /// assert!(!store.insert(TextChunk::new("doc.txt", 6, "world")).await);
    /// assert_eq!(store.len(), 1);
    /// # });
    /// ```
    pub async fn insert(&self, record: T) -> bool {
        let embedded = match self.embedder.embed(record).await {
            Some(embedded) => embedded,
            None => {
                debug!("embedding declined, record skipped");
                return false;
            }
        };

        let dim = match embedded.vector() {
            Ok(vector) if vector.iter().all(|x| x.is_finite()) => vector.len(),
            Ok(_) => {
                warn!("embedding holds a non-finite value, record skipped");
                return false;
            }
            Err(_) => {
                warn!("embedder returned a record without a vector, record skipped");
                return false;
            }
        };
        if self.dimensions != 0 && dim != self.dimensions {
            warn!(expected = self.dimensions, got = dim, "embedding length differs from store dimensions");
        }

        self.records.write().push(embedded);
        true
    }

    /// Inserts each record in order. Returns how many were kept.
    pub async fn insert_many<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut inserted = 0;
        let mut skipped = 0;
        for record in records {
            if self.insert(record).await {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }
        debug!(inserted, skipped, "batch insert finished");
        inserted
    }

    /// Searches for the k records whose vectors have the highest dot product
    /// with `query`.
    ///
    /// Neither side is normalized here; normalize both beforehand for cosine
    /// similarity. Results are in descending score order. On equal scores the
    /// record inserted first ranks first, and a full result set only admits
    /// strictly higher scores. Records scoring NaN are never returned.
    ///
    /// # Returns
    ///
    /// * `Ok(vec![])` - if `k` is 0, `query` is empty or the store is empty
    /// * `Err(StoreError::MissingEmbedding)` - a stored record has no vector
    /// * `Err(StoreError::LengthMismatch)` - a stored vector and `query` differ in length
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use memvdb::{Precomputed, TextChunk, VecStore};
    ///
    /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
    /// let store: VecStore<TextChunk> = VecStore::new(2, Arc::new(Precomputed));
    /// for (i, v) in [[1.0, 0.0], [0.0, 1.0], [0.7, 0.7]].iter().enumerate() {
    ///     let mut chunk = TextChunk::new("doc", i, format!("chunk {}", i));
    ///     chunk.vector = Some(v.to_vec());
    ///     store.insert(chunk).await;
    /// }
    ///
    /// let results = store.find_nearest(&[1.0, 0.0], 2).unwrap();
    /// assert_eq!(results.len(), 2);
    /// assert_eq!(results[0].record.text, "chunk 0");
    /// assert_eq!(results[1].record.text, "chunk 2");
    /// # });
    /// ```
    pub fn find_nearest(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor<T>>, StoreError> {
        if k == 0 || query.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.records.read();

        // (index, score), kept sorted by descending score
        let mut top: Vec<(usize, f32)> = Vec::with_capacity(k.min(records.len()) + 1);
        for (i, record) in records.iter().enumerate() {
            let sim = dot_product(record.vector()?, query)?;
            if sim.is_nan() {
                continue;
            }
            if top.len() == k && sim <= top[k - 1].1 {
                continue;
            }
            let insert_index = top.partition_point(|x| x.1 >= sim);
            top.insert(insert_index, (i, sim));
            top.truncate(k);
        }

        let result = top.into_iter()
            .map(|(i, score)| Neighbor { score, record: records[i].clone() })
            .collect();

        Ok(result)
    }

    /// Same as [`find_nearest`](VecStore::find_nearest) without the scores.
    pub fn find_nearest_records(&self, query: &[f32], k: usize) -> Result<Vec<T>, StoreError> {
        let result = self.find_nearest(query, k)?
            .into_iter()
            .map(|n| n.record)
            .collect();

        Ok(result)
    }

    /// Writes the whole collection as `{"vector_objects": [...]}`.
    ///
    /// Fails with [`StoreError::MissingEmbedding`] or [`StoreError::NonFinite`]
    /// before writing anything if a record's vector could not be read back.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        let records = self.records.read();
        ensure_vectors(&records)?;
        write_collection(&records, writer)
    }

    /// Replaces the whole collection with the one read from `reader`.
    ///
    /// The current records are kept if the document does not decode or any
    /// decoded record lacks a vector. Returns the new record count.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<usize, StoreError> {
        let data: CollectionData<T> = serde_json::from_reader(reader)?;
        ensure_vectors(&data.vector_objects)?;

        let count = data.vector_objects.len();
        *self.records.write() = data.vector_objects;
        Ok(count)
    }

    /// Saves the collection to a JSON file, overwriting it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use memvdb::{Precomputed, TextChunk, VecStore};
    ///
    /// let store: VecStore<TextChunk> = VecStore::new(3, Arc::new(Precomputed));
    /// store.save_json("vectors.json").unwrap();
    /// ```
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let records = self.records.read();
        ensure_vectors(&records)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_collection(&records, &mut writer)?;
        writer.flush()?;

        info!(path = %path.display(), records = records.len(), "collection saved");
        Ok(())
    }

    /// Loads a collection previously written by [`save_json`](VecStore::save_json),
    /// replacing the current contents.
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<usize, StoreError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let count = self.from_reader(BufReader::new(file))?;

        info!(path = %path.display(), records = count, "collection loaded");
        Ok(count)
    }
}

/// JSON has no spelling for NaN or infinity, so such a vector would be
/// written as `null` and never load back.
fn ensure_vectors<T: VectorRecord>(records: &[T]) -> Result<(), StoreError> {
    for record in records {
        if !record.vector()?.iter().all(|x| x.is_finite()) {
            return Err(StoreError::NonFinite);
        }
    }
    Ok(())
}

// Callers validate with `ensure_vectors` first
fn write_collection<T: VectorRecord, W: Write>(records: &[T], writer: W) -> Result<(), StoreError> {
    serde_json::to_writer(writer, &CollectionRef { vector_objects: records })
        .map_err(|e| if e.is_io() { StoreError::Io(e.into()) } else { StoreError::Encode(e) })
}
