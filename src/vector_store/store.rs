//! The course store: fuzzy name resolution, filtered semantic search, and
//! catalog reporting over a vector backend.

use super::{
    CatalogEntry, Course, CourseChunk, SearchFilter, SearchResults, StoredChunk, VectorBackend,
};
use crate::embedding::Embedder;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Domain-facing store over the catalog and content collections.
///
/// `search` never raises: every failure is folded into the returned
/// `SearchResults` so the caller (a tool feeding an LLM) can surface it as
/// ordinary text.
pub struct CourseStore {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseStore {
    /// Create a new course store.
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn Embedder>,
        max_results: usize,
    ) -> Self {
        Self {
            backend,
            embedder,
            max_results,
        }
    }

    /// Semantic search over course content with optional course/lesson filters.
    ///
    /// A fuzzy `course_name` is resolved against the catalog first; when no
    /// course matches, the content collection is not queried at all.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(Some(title)) => Some(title),
                Ok(None) => {
                    debug!("No catalog match for '{}'", name);
                    return SearchResults::empty(format!("No course found matching '{}'", name));
                }
                Err(e) => return SearchResults::empty(format!("Search error: {}", e)),
            },
            None => None,
        };

        let filter = SearchFilter::new(course_title, lesson_number);

        let query_embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => return SearchResults::empty(format!("Search error: {}", e)),
        };

        match self
            .backend
            .query_chunks(&query_embedding, &filter, self.max_results)
            .await
        {
            Ok(hits) => {
                debug!("Search returned {} hits", hits.len());
                SearchResults::from_hits(hits)
            }
            Err(e) => {
                warn!("Content search failed: {}", e);
                SearchResults::empty(format!("Search error: {}", e))
            }
        }
    }

    /// Resolve a partial course name to an exact stored title.
    ///
    /// Takes the single best catalog match with no similarity threshold; an
    /// empty catalog resolves to None.
    pub async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(name).await?;
        let nearest = self.backend.nearest_course(&embedding).await?;
        Ok(nearest.map(|course| course.title))
    }

    /// Fetch full course metadata by exact title.
    pub async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        self.backend.get_course(title).await
    }

    /// Look up a course's link (best-effort).
    pub async fn get_course_link(&self, title: &str) -> Result<Option<String>> {
        Ok(self
            .backend
            .get_course(title)
            .await?
            .and_then(|c| c.course_link))
    }

    /// Look up a lesson's link within a course (best-effort).
    pub async fn get_lesson_link(&self, title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .backend
            .get_course(title)
            .await?
            .and_then(|c| c.lesson_link(lesson_number).map(String::from)))
    }

    /// All stored course titles.
    pub async fn get_existing_course_titles(&self) -> Result<Vec<String>> {
        let courses = self.backend.all_courses().await?;
        Ok(courses.into_iter().map(|c| c.title).collect())
    }

    /// Number of courses in the catalog.
    pub async fn get_course_count(&self) -> Result<usize> {
        self.backend.course_count().await
    }

    /// Full metadata for every stored course.
    pub async fn get_all_courses_metadata(&self) -> Result<Vec<Course>> {
        self.backend.all_courses().await
    }

    /// Upsert a course into the catalog, embedding its title for fuzzy lookup.
    #[instrument(skip(self, course), fields(title = %course.title))]
    pub async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        self.backend
            .upsert_course(&CatalogEntry {
                course: course.clone(),
                embedding,
            })
            .await?;
        info!("Added course '{}' to catalog", course.title);
        Ok(())
    }

    /// Embed and upsert content chunks. Chunk ids are derived from
    /// (course title, chunk index), so re-adding overwrites.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let stored: Vec<StoredChunk> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredChunk {
                id: format!("{}::{}", chunk.course_title, chunk.chunk_index),
                content: chunk.content.clone(),
                metadata: super::ChunkMetadata {
                    course_title: chunk.course_title.clone(),
                    lesson_number: chunk.lesson_number,
                    chunk_index: chunk.chunk_index,
                },
                embedding,
            })
            .collect();

        self.backend.upsert_chunks(&stored).await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{sample_course, CountingBackend, FakeEmbedder};
    use super::*;
    use std::sync::atomic::Ordering;

    const COMPUTER_USE: &str = "Building Toward Computer Use with Anthropic";
    const RAG_INTRO: &str = "Introduction to RAG Systems";

    fn embedder() -> Arc<FakeEmbedder> {
        Arc::new(FakeEmbedder::new(&[
            (COMPUTER_USE, vec![1.0, 0.0, 0.0]),
            ("Computer Use", vec![0.9, 0.1, 0.0]),
            (RAG_INTRO, vec![0.0, 1.0, 0.0]),
            ("api requests", vec![1.0, 0.1, 0.0]),
            ("chunk about apis", vec![1.0, 0.0, 0.0]),
            ("chunk about rag", vec![0.0, 1.0, 0.0]),
        ]))
    }

    async fn populated_store(backend: Arc<dyn VectorBackend>) -> CourseStore {
        let store = CourseStore::new(backend, embedder(), 5);

        store
            .add_course_metadata(&sample_course(COMPUTER_USE, "colt"))
            .await
            .unwrap();
        store
            .add_course_metadata(&sample_course(RAG_INTRO, "andrew"))
            .await
            .unwrap();

        store
            .add_course_content(&[
                CourseChunk {
                    content: "chunk about apis".to_string(),
                    course_title: COMPUTER_USE.to_string(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                },
                CourseChunk {
                    content: "chunk about rag".to_string(),
                    course_title: RAG_INTRO.to_string(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                },
            ])
            .await
            .unwrap();

        store
    }

    #[tokio::test]
    async fn test_resolve_partial_course_name() {
        let store = populated_store(Arc::new(CountingBackend::new())).await;

        let resolved = store.resolve_course_name("Computer Use").await.unwrap();
        assert_eq!(resolved.as_deref(), Some(COMPUTER_USE));
    }

    #[tokio::test]
    async fn test_search_unfiltered() {
        let store = populated_store(Arc::new(CountingBackend::new())).await;

        let results = store.search("api requests", None, None).await;
        assert!(results.error.is_none());
        assert_eq!(results.documents.len(), 2);
        // Closest chunk first
        assert_eq!(results.documents[0], "chunk about apis");
    }

    #[tokio::test]
    async fn test_search_with_course_filter() {
        let store = populated_store(Arc::new(CountingBackend::new())).await;

        let results = store.search("api requests", Some("Computer Use"), None).await;
        assert!(results.error.is_none());
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.metadata[0].course_title, COMPUTER_USE);
    }

    #[tokio::test]
    async fn test_search_with_lesson_filter_no_match() {
        let store = populated_store(Arc::new(CountingBackend::new())).await;

        let results = store.search("api requests", None, Some(9)).await;
        assert!(results.error.is_none());
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_course_skips_content_search() {
        let backend = Arc::new(CountingBackend::new());
        let embedder = embedder();
        let store = CourseStore::new(backend.clone(), embedder, 5);

        // Empty catalog: resolution misses before any content query
        let results = store.search("anything", Some("Nonexistent"), None).await;

        assert_eq!(
            results.error.as_deref(),
            Some("No course found matching 'Nonexistent'")
        );
        assert!(results.is_empty());
        assert_eq!(backend.content_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedder_failure_becomes_search_error() {
        let backend = Arc::new(CountingBackend::new());
        let mut embedder = FakeEmbedder::new(&[]);
        embedder.fail = true;
        let store = CourseStore::new(backend, Arc::new(embedder), 5);

        let results = store.search("anything", None, None).await;
        let error = results.error.as_ref().expect("expected error");
        assert!(error.starts_with("Search error: "));
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_reporting() {
        let store = populated_store(Arc::new(CountingBackend::new())).await;

        assert_eq!(store.get_course_count().await.unwrap(), 2);
        let titles = store.get_existing_course_titles().await.unwrap();
        assert!(titles.contains(&COMPUTER_USE.to_string()));
        assert!(titles.contains(&RAG_INTRO.to_string()));
        assert_eq!(store.get_all_courses_metadata().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_link_lookups() {
        let store = populated_store(Arc::new(CountingBackend::new())).await;

        assert_eq!(
            store.get_lesson_link(COMPUTER_USE, 0).await.unwrap(),
            Some("https://example.com/lesson0".to_string())
        );
        assert_eq!(store.get_lesson_link(COMPUTER_USE, 1).await.unwrap(), None);
        assert_eq!(
            store.get_course_link(COMPUTER_USE).await.unwrap(),
            Some("https://example.com/colt".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_catalog_reporting() {
        let store = CourseStore::new(Arc::new(CountingBackend::new()), embedder(), 5);

        assert_eq!(store.get_course_count().await.unwrap(), 0);
        assert!(store.get_existing_course_titles().await.unwrap().is_empty());
        assert!(store.get_all_courses_metadata().await.unwrap().is_empty());
    }
}
