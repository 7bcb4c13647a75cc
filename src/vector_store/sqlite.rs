//! SQLite-based vector store implementation.
//!
//! Reads a collection file produced by the ingestion process. The file is opened
//! read-only and similarity is computed in Rust over the stored vectors.

use super::{cosine_similarity, is_finite_vector, rank, validate_query, ChunkMetadata, Neighbor, VectorStore};
use crate::error::{Result, VidGenieError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Table layout the ingestion process writes.
///
/// `metadata` is a JSON object carrying at least `video_uri` and `start_time`;
/// `embedding` is the vector as little-endian `f32`s.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    dimension INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    collection_id INTEGER NOT NULL REFERENCES collections(id),
    chunk_id TEXT NOT NULL,
    document TEXT NOT NULL,
    metadata TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_collection ON chunks(collection_id);
"#;

/// SQLite-based vector store bound to one collection.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    collection: String,
    collection_id: i64,
    dimension: usize,
}

impl SqliteVectorStore {
    /// Open `collection` inside the database at `path`.
    #[instrument(skip_all, fields(path = %path.display(), collection = %collection))]
    pub fn open(path: &Path, collection: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(VidGenieError::StoreUnavailable(format!(
                "No vector database at {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            VidGenieError::StoreUnavailable(format!("Cannot open {}: {}", path.display(), e))
        })?;

        let store = Self::from_connection(conn, collection)?;
        info!(
            "Opened collection {} ({} dimensions) at {:?}",
            collection, store.dimension, path
        );
        Ok(store)
    }

    fn from_connection(conn: Connection, collection: &str) -> Result<Self> {
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('collections', 'chunks')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| VidGenieError::StoreUnavailable(format!("Not a vector database: {}", e)))?;

        if tables != 2 {
            return Err(VidGenieError::StoreUnavailable(
                "Database has no collections/chunks tables".to_string(),
            ));
        }

        let found: Option<(i64, i64)> = conn
            .query_row(
                "SELECT id, dimension FROM collections WHERE name = ?1",
                params![collection],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (collection_id, dimension) =
            found.ok_or_else(|| VidGenieError::CollectionNotFound(collection.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            collection_id,
            dimension: dimension.max(0) as usize,
        })
    }

    /// Deserialize embedding from bytes. `None` if the blob is not a whole number of `f32`s.
    fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        Some(
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect(),
        )
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidGenieError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, embedding))]
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        validate_query(embedding, top_k, self.dimension)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT chunk_id, document, metadata, embedding
            FROM chunks
            WHERE collection_id = ?1
            ORDER BY seq
            "#,
        )?;

        let rows = stmt.query_map(params![self.collection_id], |row| {
            let id: String = row.get(0)?;
            let document: Option<String> = row.get(1)?;
            let metadata: Option<String> = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((id, document, metadata, embedding_bytes))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, document, metadata, embedding_bytes) = row?;
            let Some(stored) = Self::bytes_to_embedding(&embedding_bytes) else {
                warn!(
                    "Skipping chunk {} with a {}-byte embedding blob",
                    id,
                    embedding_bytes.len()
                );
                continue;
            };
            if stored.len() != self.dimension {
                warn!(
                    "Skipping chunk {} with {} dimensions (expected {})",
                    id,
                    stored.len(),
                    self.dimension
                );
                continue;
            }
            if !is_finite_vector(&stored) {
                warn!("Skipping chunk {} with non-finite embedding values", id);
                continue;
            }

            hits.push(Neighbor {
                score: cosine_similarity(embedding, &stored),
                document: document.unwrap_or_default(),
                metadata: metadata
                    .map(|m| ChunkMetadata::from_json(&m))
                    .unwrap_or_default(),
                id,
            });
        }

        let results = rank(hits, top_k);
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    /// Counts rows whose embedding blob has the collection's size; others are never returned.
    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection_id = ?1 AND length(embedding) = ?2",
            params![self.collection_id, (self.dimension * 4) as i64],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Write a collection the way the ingestion process does.
    fn seed(path: &Path, collection: &str, dimension: i64, chunks: &[(&str, &str, &str, Vec<f32>)]) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO collections (name, dimension) VALUES (?1, ?2)",
            params![collection, dimension],
        )
        .unwrap();
        let collection_id = conn.last_insert_rowid();

        for (id, document, metadata, embedding) in chunks {
            conn.execute(
                "INSERT INTO chunks (collection_id, chunk_id, document, metadata, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![collection_id, id, document, metadata, embedding_to_bytes(embedding)],
            )
            .unwrap();
        }
    }

    fn db_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("vectors.db")
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        seed(
            &path,
            "video_metadata",
            3,
            &[
                ("c1", "Title: Far", r#"{"video_uri": "https://youtu.be/a", "start_time": 0}"#, vec![0.0, 1.0, 0.0]),
                ("c2", "Title: Near", r#"{"video_uri": "https://youtu.be/b", "start_time": 75.5}"#, vec![1.0, 0.0, 0.0]),
                ("c3", "Title: Tie", r#"{"video_uri": "https://youtu.be/c", "start_time": 10}"#, vec![0.0, 1.0, 0.0]),
            ],
        );

        let store = SqliteVectorStore::open(&path, "video_metadata").unwrap();
        assert_eq!(store.dimension(), 3);
        assert_eq!(store.collection(), "video_metadata");
        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.query(&[1.0, 0.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1", "c3"]);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].metadata, ChunkMetadata::new("https://youtu.be/b", 75.5));
        assert_eq!(results[0].document, "Title: Near");

        let results = store.query(&[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_skips_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        seed(
            &path,
            "video_metadata",
            2,
            &[
                ("short", "Title: Short", "{}", vec![1.0]),
                ("loose", "Title: Loose", "not json", vec![1.0, 0.0]),
            ],
        );

        let conn = Connection::open(&path).unwrap();
        let mut ragged = embedding_to_bytes(&[1.0, 0.0]);
        ragged.extend_from_slice(&[0, 0]);
        conn.execute(
            "INSERT INTO chunks (collection_id, chunk_id, document, metadata, embedding) VALUES (1, 'ragged', '', '{}', ?1)",
            params![ragged],
        )
        .unwrap();
        drop(conn);

        let store = SqliteVectorStore::open(&path, "video_metadata").unwrap();
        let results = store.query(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "loose");
        assert_eq!(results[0].metadata, ChunkMetadata::default());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_skips_non_finite_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        seed(
            &path,
            "video_metadata",
            2,
            &[
                ("low", "Title: Low", "{}", vec![0.0, 1.0]),
                ("nan", "Title: NaN", "{}", vec![f32::NAN, 0.0]),
                ("high", "Title: High", "{}", vec![1.0, 0.0]),
                ("inf", "Title: Inf", "{}", vec![f32::INFINITY, 1.0]),
                ("mid", "Title: Mid", "{}", vec![1.0, 1.0]),
            ],
        );

        let store = SqliteVectorStore::open(&path, "video_metadata").unwrap();
        let results = store.query(&[1.0, 0.0], 10).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_bytes_to_embedding() {
        let bytes = embedding_to_bytes(&[1.5, -2.0]);
        assert_eq!(SqliteVectorStore::bytes_to_embedding(&bytes), Some(vec![1.5, -2.0]));
        assert_eq!(SqliteVectorStore::bytes_to_embedding(&bytes[..7]), None);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        seed(&path, "video_metadata", 2, &[]);

        let store = SqliteVectorStore::open(&path, "video_metadata").unwrap();
        assert!(store.query(&[1.0, 0.0], 3).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);

        assert!(matches!(
            SqliteVectorStore::open(&path, "video_metadata"),
            Err(VidGenieError::StoreUnavailable(_))
        ));

        seed(&path, "podcasts", 2, &[]);
        assert!(matches!(
            SqliteVectorStore::open(&path, "video_metadata"),
            Err(VidGenieError::CollectionNotFound(_))
        ));

        let bogus = dir.path().join("notes.txt");
        std::fs::write(&bogus, "definitely not sqlite, just some text padding it out").unwrap();
        assert!(matches!(
            SqliteVectorStore::open(&bogus, "video_metadata"),
            Err(VidGenieError::StoreUnavailable(_))
        ));

        let empty_db = dir.path().join("empty.db");
        Connection::open(&empty_db)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();
        assert!(matches!(
            SqliteVectorStore::open(&empty_db, "video_metadata"),
            Err(VidGenieError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_queries() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        seed(
            &path,
            "video_metadata",
            2,
            &[("a", "Title: A", r#"{"video_uri": "u", "start_time": 1}"#, vec![1.0, 0.0])],
        );

        let store = std::sync::Arc::new(SqliteVectorStore::open(&path, "video_metadata").unwrap());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.query(&[1.0, 0.0], 1).await.map(|r| r.len())
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }
    }
}
