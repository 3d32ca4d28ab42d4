//! Document question answering pipeline.
//!
//! Two phases over a workspace-local SQLite index:
//!
//! - **Build**: extract text from documents, split it into overlapping
//!   chunks, embed them, and persist the index ([`build_index`]).
//! - **Query**: embed a question, retrieve the most similar chunks, and
//!   synthesize a grounded answer via the LLM ([`ask`]).
//!
//! The index records the embedding identity it was built with; queries
//! verify it before comparing vectors.

pub mod answer;
pub mod chunk;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod types;

#[cfg(test)]
mod tests;

pub use answer::NO_ANSWER_SENTINEL;
pub use types::{
    Answer, AskOptions, BuildStats, ChunkCandidate, Document, IndexConfig, IndexMeta, IndexPhase,
    IndexStats, RetrievedChunk,
};

use chrono::Utc;
use docqa_core::{AppError, AppResult};
use std::path::Path;
use std::time::Instant;
use types::IndexedChunk;

/// Build (or fully rebuild) the index for a workspace from the given
/// documents.
///
/// Runs the whole build phase: extraction, chunking, embedding, and a
/// transactional index rebuild. A failure at any stage leaves the
/// previous index intact.
pub async fn build_index(
    workspace: &Path,
    documents: &[Document],
    config: &IndexConfig,
    api_key: Option<&str>,
) -> AppResult<BuildStats> {
    config.validate()?;

    if documents.is_empty() {
        return Err(AppError::NoExtractableContent);
    }

    let started = Instant::now();

    tracing::info!("Building index from {} documents", documents.len());

    let text = extract::extract_documents(documents)?;
    let candidates = chunk::split_text(&text, config.chunk_size, config.chunk_overlap)?;

    let provider = embeddings::create_provider(
        &config.embedding_provider,
        &config.embedding_model,
        config.embedding_dimensions,
        api_key,
    )?;

    let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let vectors = provider.embed_batch(&texts).await?;

    if vectors.len() != candidates.len() {
        return Err(AppError::Embedding(format!(
            "Provider returned {} embeddings for {} chunks",
            vectors.len(),
            candidates.len()
        )));
    }

    let chunks: Vec<IndexedChunk> = candidates
        .into_iter()
        .zip(vectors)
        .map(|(candidate, embedding)| IndexedChunk {
            id: uuid::Uuid::new_v4().to_string(),
            position: candidate.position,
            text: candidate.text,
            embedding,
        })
        .collect();

    let meta = IndexMeta {
        embedding_provider: provider.provider_name().to_string(),
        embedding_model: provider.model_name().to_string(),
        embedding_dimensions: provider.dimensions(),
        chunk_size: config.chunk_size,
        chunk_overlap: config.chunk_overlap,
        documents: documents.iter().map(|d| d.name.clone()).collect(),
        built_at: Utc::now(),
    };

    // Write into a staging file; the live index is only replaced once
    // the rebuild has fully succeeded.
    let db_path = index::index_path(workspace);
    let staging = db_path.with_extension("sqlite.tmp");
    if staging.exists() {
        std::fs::remove_file(&staging)?;
    }
    let mut conn = index::create(&staging)?;
    if let Err(e) = index::rebuild(&mut conn, &meta, &chunks) {
        drop(conn);
        let _ = std::fs::remove_file(&staging);
        return Err(e);
    }
    drop(conn);
    std::fs::rename(&staging, &db_path)?;

    let stats = BuildStats {
        documents_count: documents.len() as u32,
        chunks_count: chunks.len() as u32,
        characters: text.len() as u64,
        duration_secs: started.elapsed().as_secs_f64(),
    };

    tracing::info!(
        "Indexed {} chunks from {} documents in {:.2}s",
        stats.chunks_count,
        stats.documents_count,
        stats.duration_secs
    );

    Ok(stats)
}

/// Retrieve the chunks most similar to `question` from the workspace
/// index, ordered by descending score.
///
/// The query is embedded with the same provider and model recorded at
/// build time; a dimension disagreement fails fast rather than
/// producing silently meaningless scores.
pub async fn retrieve(
    workspace: &Path,
    question: &str,
    top_k: usize,
    api_key: Option<&str>,
) -> AppResult<Vec<RetrievedChunk>> {
    let conn = index::open_existing(&index::index_path(workspace))?;
    let meta = index::load_meta(&conn)?;

    let provider = embeddings::create_provider(
        &meta.embedding_provider,
        &meta.embedding_model,
        meta.embedding_dimensions,
        api_key,
    )?;

    if provider.dimensions() != meta.embedding_dimensions {
        return Err(AppError::EmbeddingDimensionMismatch {
            expected: meta.embedding_dimensions,
            actual: provider.dimensions(),
        });
    }

    let query_embedding = provider.embed(question).await?;
    if query_embedding.len() != meta.embedding_dimensions {
        return Err(AppError::EmbeddingDimensionMismatch {
            expected: meta.embedding_dimensions,
            actual: query_embedding.len(),
        });
    }

    index::query_chunks(&conn, &query_embedding, top_k)
}

/// Answer a question from the indexed documents.
///
/// Retrieves the top-k chunks and synthesizes a grounded answer. When
/// retrieval yields nothing at all, the sentinel answer is returned
/// without calling the LLM.
pub async fn ask(
    workspace: &Path,
    question: &str,
    llm_provider: &str,
    llm_model: &str,
    options: &AskOptions,
    api_key: Option<&str>,
) -> AppResult<Answer> {
    tracing::info!("Answering question: {}", question);

    let chunks = retrieve(workspace, question, options.top_k, api_key).await?;

    if chunks.is_empty() {
        tracing::info!("No chunks retrieved; returning sentinel answer");
        return Ok(Answer {
            text: NO_ANSWER_SENTINEL.to_string(),
            max_score: 0.0,
            chunks_used: 0,
        });
    }

    let max_score = chunks.first().map(|c| c.score).unwrap_or(0.0);

    let client = docqa_llm::create_client(llm_provider, None, api_key)?;
    let text = answer::synthesize(
        client.as_ref(),
        llm_model,
        &chunks,
        question,
        options.temperature,
    )
    .await?;

    Ok(Answer {
        text,
        max_score,
        chunks_used: chunks.len(),
    })
}

/// Report statistics about the workspace index.
pub fn stats(workspace: &Path) -> AppResult<IndexStats> {
    let db_path = index::index_path(workspace);
    let conn = index::open_existing(&db_path)?;
    let meta = index::load_meta(&conn)?;
    let chunks_count = index::count_chunks(&conn)?;
    let db_size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    Ok(IndexStats {
        documents: meta.documents,
        chunks_count,
        db_size_bytes,
        built_at: meta.built_at,
    })
}

/// Delete the workspace index. Returns `true` if an index existed.
pub fn clean(workspace: &Path) -> AppResult<bool> {
    let db_path = index::index_path(workspace);
    if !db_path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&db_path)?;
    tracing::info!("Removed index at {:?}", db_path);
    Ok(true)
}

/// Observable phase of the workspace index.
pub fn index_phase(workspace: &Path) -> IndexPhase {
    if index::index_path(workspace).exists() {
        IndexPhase::Indexed
    } else {
        IndexPhase::NotStarted
    }
}
