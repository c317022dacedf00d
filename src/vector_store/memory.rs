//! In-memory vector backend.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, CatalogEntry, Course, ScoredChunk, SearchFilter, StoredChunk, VectorBackend,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector backend holding both collections.
pub struct MemoryBackend {
    catalog: RwLock<HashMap<String, CatalogEntry>>,
    chunks: RwLock<HashMap<String, StoredChunk>>,
}

impl MemoryBackend {
    /// Create a new in-memory backend.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(HashMap::new()),
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorBackend for MemoryBackend {
    async fn upsert_course(&self, entry: &CatalogEntry) -> Result<()> {
        let mut catalog = self.catalog.write().unwrap();
        catalog.insert(entry.course.title.clone(), entry.clone());
        Ok(())
    }

    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<Course>> {
        let catalog = self.catalog.read().unwrap();

        let best = catalog
            .values()
            .map(|entry| {
                let score = cosine_similarity(query_embedding, &entry.embedding);
                (score, entry)
            })
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best.map(|(_, entry)| entry.course.clone()))
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.get(title).map(|e| e.course.clone()))
    }

    async fn all_courses(&self) -> Result<Vec<Course>> {
        let catalog = self.catalog.read().unwrap();
        let mut courses: Vec<Course> = catalog.values().map(|e| e.course.clone()).collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(courses)
    }

    async fn course_count(&self) -> Result<usize> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.len())
    }

    async fn upsert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let mut store = self.chunks.write().unwrap();
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn query_chunks(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let chunks = self.chunks.read().unwrap();

        let mut results: Vec<ScoredChunk> = chunks
            .values()
            .filter(|c| filter.matches(&c.metadata))
            .map(|c| ScoredChunk {
                content: c.content.clone(),
                metadata: c.metadata.clone(),
                score: cosine_similarity(query_embedding, &c.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().unwrap();
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::ChunkMetadata;

    fn chunk(id: &str, course: &str, lesson: Option<u32>, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk {
            id: id.to_string(),
            content: format!("content of {}", id),
            metadata: ChunkMetadata {
                course_title: course.to_string(),
                lesson_number: lesson,
                chunk_index: 0,
            },
            embedding,
        }
    }

    #[test]
    fn test_memory_backend_chunks() {
        let backend = MemoryBackend::new();

        tokio_test::block_on(async {
            backend
                .upsert_chunks(&[
                    chunk("a::0", "Course A", Some(1), vec![1.0, 0.0, 0.0]),
                    chunk("a::1", "Course A", Some(2), vec![0.0, 1.0, 0.0]),
                    chunk("b::0", "Course B", Some(1), vec![0.9, 0.1, 0.0]),
                ])
                .await
                .unwrap();

            assert_eq!(backend.chunk_count().await.unwrap(), 3);

            let all = backend
                .query_chunks(&[1.0, 0.0, 0.0], &SearchFilter::default(), 10)
                .await
                .unwrap();
            assert_eq!(all.len(), 3);
            assert!(all[0].score >= all[1].score);

            let filtered = backend
                .query_chunks(
                    &[1.0, 0.0, 0.0],
                    &SearchFilter::new(Some("Course A".to_string()), None),
                    10,
                )
                .await
                .unwrap();
            assert_eq!(filtered.len(), 2);

            let both = backend
                .query_chunks(
                    &[1.0, 0.0, 0.0],
                    &SearchFilter::new(Some("Course A".to_string()), Some(2)),
                    10,
                )
                .await
                .unwrap();
            assert_eq!(both.len(), 1);
            assert_eq!(both[0].metadata.lesson_number, Some(2));
        });
    }

    #[test]
    fn test_memory_backend_upsert_overwrites() {
        let backend = MemoryBackend::new();

        tokio_test::block_on(async {
            backend
                .upsert_chunks(&[chunk("a::0", "Course A", None, vec![1.0, 0.0, 0.0])])
                .await
                .unwrap();
            backend
                .upsert_chunks(&[chunk("a::0", "Course A", None, vec![0.0, 1.0, 0.0])])
                .await
                .unwrap();

            assert_eq!(backend.chunk_count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_memory_backend_empty_catalog() {
        let backend = MemoryBackend::new();

        tokio_test::block_on(async {
            assert_eq!(backend.course_count().await.unwrap(), 0);
            assert!(backend.all_courses().await.unwrap().is_empty());
            assert!(backend
                .nearest_course(&[1.0, 0.0, 0.0])
                .await
                .unwrap()
                .is_none());
        });
    }

    #[test]
    fn test_memory_backend_nearest_course() {
        let backend = MemoryBackend::new();

        let course_a = Course {
            title: "Course A".to_string(),
            instructor: "A".to_string(),
            course_link: None,
            lessons: vec![],
        };
        let course_b = Course {
            title: "Course B".to_string(),
            instructor: "B".to_string(),
            course_link: None,
            lessons: vec![],
        };

        tokio_test::block_on(async {
            backend
                .upsert_course(&CatalogEntry {
                    course: course_a,
                    embedding: vec![1.0, 0.0, 0.0],
                })
                .await
                .unwrap();
            backend
                .upsert_course(&CatalogEntry {
                    course: course_b,
                    embedding: vec![0.0, 1.0, 0.0],
                })
                .await
                .unwrap();

            let nearest = backend.nearest_course(&[0.9, 0.1, 0.0]).await.unwrap();
            assert_eq!(nearest.unwrap().title, "Course A");
        });
    }
}
