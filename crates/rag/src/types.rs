//! RAG pipeline type definitions.

use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A raw input document: opaque bytes plus a display name.
///
/// Owned by the caller for the duration of one index build; the pipeline
/// never persists document bytes.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name (typically the file name)
    pub name: String,

    /// Raw document content
    pub bytes: Vec<u8>,
}

impl Document {
    /// Create a document from in-memory bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, bytes })
    }
}

/// Configuration for one index build.
///
/// All values the pipeline depends on are explicit here; nothing is read
/// from ambient state. The embedding identity recorded at build time is
/// authoritative for all later queries against that index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Embedding provider name ("gemini", "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identity
    pub embedding_model: String,

    /// Embedding vector dimensions
    pub embedding_dimensions: usize,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            embedding_provider: "gemini".to_string(),
            embedding_model: "embedding-001".to_string(),
            embedding_dimensions: 768,
            chunk_size: 10_000,
            chunk_overlap: 1_000,
        }
    }
}

impl IndexConfig {
    /// Validate the chunking invariant: overlap must be strictly smaller
    /// than the chunk size, or the splitter cannot make progress.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk size must be non-zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// A chunk of extracted text before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkCandidate {
    /// Position within the chunk sequence
    pub position: u32,

    /// Text content
    pub text: String,
}

/// A chunk with its embedding, as stored in the index.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Position within the chunk sequence
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// Metadata describing a persisted index.
///
/// Recorded at build time and checked at query time so that queries never
/// compare vectors produced by a different embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Embedding provider used at build time
    pub embedding_provider: String,

    /// Embedding model identity used at build time
    pub embedding_model: String,

    /// Embedding vector dimensions
    pub embedding_dimensions: usize,

    /// Chunk size the index was built with
    pub chunk_size: usize,

    /// Chunk overlap the index was built with
    pub chunk_overlap: usize,

    /// Names of the indexed documents
    pub documents: Vec<String>,

    /// When the index was built
    pub built_at: DateTime<Utc>,
}

/// A chunk returned by similarity search, ranked by descending score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Text content
    pub text: String,

    /// Cosine similarity to the query embedding
    pub score: f32,
}

/// Options for one question.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Number of chunks to retrieve
    pub top_k: usize,

    /// Sampling temperature for answer synthesis
    pub temperature: f32,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            temperature: 0.3,
        }
    }
}

/// The synthesized answer for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text (or the "not available in the context" sentinel)
    pub text: String,

    /// Highest similarity score among the retrieved chunks
    pub max_score: f32,

    /// Number of chunks passed to the language model as context
    pub chunks_used: usize,
}

/// Statistics from an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of documents supplied
    pub documents_count: u32,

    /// Number of chunks indexed
    pub chunks_count: u32,

    /// Characters of extracted text
    pub characters: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics describing the persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Names of the indexed documents
    pub documents: Vec<String>,

    /// Number of chunks in the index
    pub chunks_count: u32,

    /// Index file size in bytes
    pub db_size_bytes: u64,

    /// When the index was built
    pub built_at: DateTime<Utc>,
}

/// Observable state of the index phase, derived from the on-disk artifact.
///
/// The hosting shell queries this to decide whether a question can be
/// asked; the core still fails with `IndexNotFound` if raced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    /// No index has ever been built
    NotStarted,

    /// A build completed and the index is queryable
    Indexed,
}
