//! Vector store abstraction for Kurs.
//!
//! Two logical collections back the store: a small course catalog (one entry
//! per course, queried to resolve fuzzy course names) and a content collection
//! (one entry per transcript chunk). The `VectorBackend` trait covers both so
//! tests can supply in-memory fakes.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::CourseStore;

#[cfg(test)]
pub(crate) use store::test_support;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single lesson within a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lesson {
    /// Lesson number, unique within a course.
    pub lesson_number: u32,
    /// Lesson title.
    pub title: String,
    /// Optional link to the lesson page.
    pub lesson_link: Option<String>,
}

/// A course with its ordered lesson list. The title is the unique identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub title: String,
    pub instructor: String,
    pub course_link: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Look up a lesson's link by number.
    pub fn lesson_link(&self, lesson_number: u32) -> Option<&str> {
        self.lessons
            .iter()
            .find(|l| l.lesson_number == lesson_number)
            .and_then(|l| l.lesson_link.as_deref())
    }
}

/// A chunk of course content produced by an external document processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Position of this chunk within the course.
    pub chunk_index: usize,
}

/// Metadata stored alongside each content chunk and returned with search hits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
}

/// Equality filter applied to content searches.
///
/// No fields set means no filtering; both set means a conjunctive match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl SearchFilter {
    pub fn new(course_title: Option<String>, lesson_number: Option<u32>) -> Self {
        Self {
            course_title,
            lesson_number,
        }
    }

    /// True when no filtering is requested.
    pub fn is_empty(&self) -> bool {
        self.course_title.is_none() && self.lesson_number.is_none()
    }

    /// Check whether a chunk's metadata passes this filter.
    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        if let Some(title) = &self.course_title {
            if &meta.course_title != title {
                return false;
            }
        }
        if let Some(n) = self.lesson_number {
            if meta.lesson_number != Some(n) {
                return false;
            }
        }
        true
    }
}

/// Ranked results from a content search.
///
/// The three sequences are always the same length. When `error` is set all
/// three are empty; empty sequences without an error are a valid "no matches"
/// state.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub scores: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    /// Build results from ranked content hits.
    pub fn from_hits(hits: Vec<ScoredChunk>) -> Self {
        let mut results = SearchResults::default();
        for hit in hits {
            results.documents.push(hit.content);
            results.metadata.push(hit.metadata);
            results.scores.push(hit.score);
        }
        results
    }

    /// Build an empty result carrying an error message.
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// True iff no documents were matched, regardless of error presence.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A content chunk with its similarity score (higher is better).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// A content chunk as stored in the backend, with its embedding.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    /// Stable id; re-adding the same id overwrites.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// A catalog entry: full course metadata plus the embedding of its title.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub course: Course,
    pub embedding: Vec<f32>,
}

/// Trait for vector backend implementations.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Upsert a course into the catalog, keyed by title.
    async fn upsert_course(&self, entry: &CatalogEntry) -> Result<()>;

    /// Return the single closest catalog entry to the query embedding.
    async fn nearest_course(&self, query_embedding: &[f32]) -> Result<Option<Course>>;

    /// Fetch a course by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// All courses in the catalog, ordered by title.
    async fn all_courses(&self) -> Result<Vec<Course>>;

    /// Number of catalog entries.
    async fn course_count(&self) -> Result<usize>;

    /// Upsert content chunks, keyed by chunk id.
    async fn upsert_chunks(&self, chunks: &[StoredChunk]) -> Result<usize>;

    /// Ranked, filtered content search.
    async fn query_chunks(
        &self,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>>;

    /// Total number of stored chunks.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(course: &str, lesson: Option<u32>) -> ChunkMetadata {
        ChunkMetadata {
            course_title: course.to_string(),
            lesson_number: lesson,
            chunk_index: 0,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_search_results_error_implies_empty() {
        let results = SearchResults::empty("No course found matching 'X'");
        assert!(results.error.is_some());
        assert!(results.documents.is_empty());
        assert!(results.metadata.is_empty());
        assert!(results.scores.is_empty());
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_results_empty_without_error() {
        let results = SearchResults::default();
        assert!(results.is_empty());
        assert!(results.error.is_none());
    }

    #[test]
    fn test_search_results_from_hits() {
        let hits = vec![
            ScoredChunk {
                content: "doc1".to_string(),
                metadata: meta("Course 1", Some(1)),
                score: 0.9,
            },
            ScoredChunk {
                content: "doc2".to_string(),
                metadata: meta("Course 2", Some(2)),
                score: 0.8,
            },
        ];

        let results = SearchResults::from_hits(hits);
        assert_eq!(results.documents.len(), 2);
        assert_eq!(results.metadata.len(), 2);
        assert_eq!(results.scores.len(), 2);
        assert!(results.error.is_none());
        assert!(!results.is_empty());
    }

    #[test]
    fn test_filter_construction_combinations() {
        assert_eq!(SearchFilter::new(None, None), SearchFilter::default());
        assert!(SearchFilter::new(None, None).is_empty());

        let course_only = SearchFilter::new(Some("MCP".to_string()), None);
        assert_eq!(
            course_only,
            SearchFilter {
                course_title: Some("MCP".to_string()),
                lesson_number: None,
            }
        );

        let lesson_only = SearchFilter::new(None, Some(3));
        assert_eq!(
            lesson_only,
            SearchFilter {
                course_title: None,
                lesson_number: Some(3),
            }
        );

        let both = SearchFilter::new(Some("MCP".to_string()), Some(3));
        assert_eq!(
            both,
            SearchFilter {
                course_title: Some("MCP".to_string()),
                lesson_number: Some(3),
            }
        );
    }

    #[test]
    fn test_filter_matching() {
        let unfiltered = SearchFilter::default();
        assert!(unfiltered.matches(&meta("Any", None)));

        let course_only = SearchFilter::new(Some("Course 1".to_string()), None);
        assert!(course_only.matches(&meta("Course 1", Some(5))));
        assert!(!course_only.matches(&meta("Course 2", Some(5))));

        let lesson_only = SearchFilter::new(None, Some(5));
        assert!(lesson_only.matches(&meta("Course 1", Some(5))));
        assert!(!lesson_only.matches(&meta("Course 1", Some(6))));
        assert!(!lesson_only.matches(&meta("Course 1", None)));

        let both = SearchFilter::new(Some("Course 1".to_string()), Some(5));
        assert!(both.matches(&meta("Course 1", Some(5))));
        assert!(!both.matches(&meta("Course 1", Some(6))));
        assert!(!both.matches(&meta("Course 2", Some(5))));
    }

    #[test]
    fn test_course_lesson_link() {
        let course = Course {
            title: "Test".to_string(),
            instructor: "Someone".to_string(),
            course_link: None,
            lessons: vec![
                Lesson {
                    lesson_number: 0,
                    title: "Intro".to_string(),
                    lesson_link: Some("https://example.com/0".to_string()),
                },
                Lesson {
                    lesson_number: 1,
                    title: "Basics".to_string(),
                    lesson_link: None,
                },
            ],
        };

        assert_eq!(course.lesson_link(0), Some("https://example.com/0"));
        assert_eq!(course.lesson_link(1), None);
        assert_eq!(course.lesson_link(9), None);
    }
}
