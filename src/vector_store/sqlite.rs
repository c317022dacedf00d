//! SQLite-based vector backend.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For production use cases with large datasets, consider using sqlite-vec
//! extension or a dedicated vector database.

use super::{
    cosine_similarity, CatalogEntry, Course, ScoredChunk, SearchFilter, StoredChunk, VectorBackend,
};
use crate::error::{KursError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog (
    title TEXT PRIMARY KEY,
    course_json TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course_title ON chunks(course_title);
"#;

/// SQLite-based vector backend.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Create a new SQLite backend at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector backend at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite backend (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| KursError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_course(json: &str) -> Result<Course> {
        serde_json::from_str(json)
            .map_err(|e| KursError::VectorStore(format!("Corrupt catalog entry: {}", e)))
    }
}

#[async_trait]
impl VectorBackend for SqliteBackend {
    #[instrument(skip(self, entry), fields(title = %entry.course.title))]
    async fn upsert_course(&self, entry: &CatalogEntry) -> Result<()> {
        let conn = self.lock_conn()?;

        let course_json = serde_json::to_string(&entry.course)?;
        let embedding_bytes = Self::embedding_to_bytes(&entry.embedding);

        conn.execute(
            "INSERT OR REPLACE INTO catalog (title, course_json, embedding) VALUES (?1, ?2, ?3)",
            params![entry.course.title, course_json, embedding_bytes],
        )?;

        debug!("Upserted catalog entry '{}'", entry.course.title);
        Ok(())
    }

    #[instrument(skip(self, query_embedding))]
    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<Course>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare("SELECT course_json, embedding FROM catalog")?;
        let rows = stmt.query_map([], |row| {
            let json: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((json, Self::bytes_to_embedding(&embedding_bytes)))
        })?;

        let mut best: Option<(f32, String)> = None;
        for row in rows.flatten() {
            let score = cosine_similarity(query_embedding, &row.1);
            if best.as_ref().is_none_or(|(s, _)| score > *s) {
                best = Some((score, row.0));
            }
        }

        match best {
            Some((_, json)) => Ok(Some(Self::parse_course(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock_conn()?;

        let result = conn.query_row(
            "SELECT course_json FROM catalog WHERE title = ?1",
            params![title],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(json) => Ok(Some(Self::parse_course(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn all_courses(&self) -> Result<Vec<Course>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare("SELECT course_json FROM catalog ORDER BY title")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut courses = Vec::new();
        for json in rows.flatten() {
            courses.push(Self::parse_course(&json)?);
        }
        Ok(courses)
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self, chunks))]
    async fn upsert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.lock_conn()?;

        let tx = conn.unchecked_transaction()?;
        for chunk in chunks {
            let embedding_bytes = Self::embedding_to_bytes(&chunk.embedding);
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, content, course_title, lesson_number, chunk_index, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    chunk.id,
                    chunk.content,
                    chunk.metadata.course_title,
                    chunk.metadata.lesson_number,
                    chunk.metadata.chunk_index as i64,
                    embedding_bytes,
                ],
            )?;
        }
        tx.commit()?;

        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query_chunks(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT content, course_title, lesson_number, chunk_index, embedding FROM chunks",
        )?;
        let rows = stmt.query_map([], |row| {
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let lesson_number: Option<i64> = row.get(2)?;
            let chunk_index: i64 = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                super::ChunkMetadata {
                    course_title: row.get(1)?,
                    lesson_number: lesson_number.map(|n| n as u32),
                    chunk_index: chunk_index as usize,
                },
                Self::bytes_to_embedding(&embedding_bytes),
            ))
        })?;

        let mut results: Vec<ScoredChunk> = rows
            .flatten()
            .filter(|(_, meta, _)| filter.matches(meta))
            .map(|(content, metadata, embedding)| ScoredChunk {
                score: cosine_similarity(query_embedding, &embedding),
                content,
                metadata,
            })
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
