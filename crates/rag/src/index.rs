//! SQLite-backed vector index.
//!
//! Chunks are stored with their embeddings as little-endian f32 BLOBs
//! and searched by brute-force cosine similarity. A single-row `meta`
//! table records the embedding identity and build parameters so that
//! queries can verify they use the same model the index was built with.
//! Rebuilds replace the entire index in one transaction.

use crate::types::{IndexMeta, IndexedChunk, RetrievedChunk};
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Directory under the workspace holding all persisted state.
pub const STATE_DIR: &str = ".docqa";

/// Index database file name.
pub const INDEX_FILE: &str = "index.sqlite";

/// Path of the index database for a workspace.
pub fn index_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join(INDEX_FILE)
}

/// Open (creating if needed) the index database and ensure its schema.
pub fn create(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Other(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            embedding_provider TEXT NOT NULL,
            embedding_model TEXT NOT NULL,
            embedding_dimensions INTEGER NOT NULL,
            chunk_size INTEGER NOT NULL,
            chunk_overlap INTEGER NOT NULL,
            documents TEXT NOT NULL,
            built_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL
        );
        "#,
    )
    .map_err(|e| AppError::Other(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Opened SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Open an existing index database.
///
/// # Errors
/// Returns `AppError::IndexNotFound` if no index file exists at the path.
pub fn open_existing(db_path: &Path) -> AppResult<Connection> {
    if !db_path.exists() {
        return Err(AppError::IndexNotFound(db_path.to_path_buf()));
    }
    create(db_path)
}

/// Replace the entire index content in one transaction.
///
/// Either the new meta row and all chunks land, or nothing changes.
///
/// # Errors
/// Returns `AppError::NoChunksProvided` if `chunks` is empty.
pub fn rebuild(conn: &mut Connection, meta: &IndexMeta, chunks: &[IndexedChunk]) -> AppResult<()> {
    if chunks.is_empty() {
        return Err(AppError::NoChunksProvided);
    }

    let tx = conn
        .transaction()
        .map_err(|e| AppError::Other(format!("Failed to start transaction: {}", e)))?;

    tx.execute("DELETE FROM chunks", [])
        .map_err(|e| AppError::Other(format!("Failed to clear chunks: {}", e)))?;
    tx.execute("DELETE FROM meta", [])
        .map_err(|e| AppError::Other(format!("Failed to clear meta: {}", e)))?;

    let documents_json = serde_json::to_string(&meta.documents)?;
    tx.execute(
        "INSERT INTO meta (id, embedding_provider, embedding_model, embedding_dimensions,
                           chunk_size, chunk_overlap, documents, built_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            meta.embedding_provider,
            meta.embedding_model,
            meta.embedding_dimensions as i64,
            meta.chunk_size as i64,
            meta.chunk_overlap as i64,
            documents_json,
            meta.built_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Other(format!("Failed to insert meta: {}", e)))?;

    for chunk in chunks {
        tx.execute(
            "INSERT INTO chunks (id, position, text, embedding) VALUES (?1, ?2, ?3, ?4)",
            params![
                chunk.id,
                chunk.position as i64,
                chunk.text,
                embedding_to_bytes(&chunk.embedding),
            ],
        )
        .map_err(|e| AppError::Other(format!("Failed to insert chunk: {}", e)))?;
    }

    tx.commit()
        .map_err(|e| AppError::Other(format!("Failed to commit rebuild: {}", e)))?;

    tracing::info!("Indexed {} chunks", chunks.len());
    Ok(())
}

/// Load the index metadata row.
pub fn load_meta(conn: &Connection) -> AppResult<IndexMeta> {
    conn.query_row(
        "SELECT embedding_provider, embedding_model, embedding_dimensions,
                chunk_size, chunk_overlap, documents, built_at
         FROM meta WHERE id = 1",
        [],
        |row| {
            let documents_json: String = row.get(5)?;
            let built_at: String = row.get(6)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                documents_json,
                built_at,
            ))
        },
    )
    .map_err(|e| AppError::Other(format!("Failed to load index metadata: {}", e)))
    .and_then(
        |(provider, model, dims, size, overlap, documents_json, built_at)| {
            let documents: Vec<String> = serde_json::from_str(&documents_json)?;
            let built_at = DateTime::parse_from_rfc3339(&built_at)
                .map_err(|e| AppError::Other(format!("Invalid built_at timestamp: {}", e)))?
                .with_timezone(&Utc);
            Ok(IndexMeta {
                embedding_provider: provider,
                embedding_model: model,
                embedding_dimensions: dims as usize,
                chunk_size: size as usize,
                chunk_overlap: overlap as usize,
                documents,
                built_at,
            })
        },
    )
}

/// Query the index for the top-k most similar chunks, ordered by
/// descending cosine similarity.
///
/// # Errors
/// Returns `AppError::EmbeddingDimensionMismatch` if a stored vector's
/// length disagrees with the query embedding.
pub fn query_chunks(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<RetrievedChunk>> {
    let mut stmt = conn
        .prepare("SELECT text, embedding FROM chunks")
        .map_err(|e| AppError::Other(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let text: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((text, embedding_bytes))
        })
        .map_err(|e| AppError::Other(format!("Failed to query chunks: {}", e)))?;

    let mut results = Vec::new();
    for row in rows {
        let (text, embedding_bytes) =
            row.map_err(|e| AppError::Other(format!("Failed to read chunk row: {}", e)))?;
        let embedding = bytes_to_embedding(&embedding_bytes)?;
        if embedding.len() != query_embedding.len() {
            return Err(AppError::EmbeddingDimensionMismatch {
                expected: embedding.len(),
                actual: query_embedding.len(),
            });
        }
        let score = cosine_similarity(query_embedding, &embedding);
        results.push(RetrievedChunk { text, score });
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);

    tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), top_k);
    Ok(results)
}

/// Count the chunks in the index.
pub fn count_chunks(conn: &Connection) -> AppResult<u32> {
    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| {
        row.get::<_, i64>(0).map(|v| v as u32)
    })
    .map_err(|e| AppError::Other(format!("Failed to count chunks: {}", e)))
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Other(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    Ok(embedding)
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta(dimensions: usize) -> IndexMeta {
        IndexMeta {
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            embedding_dimensions: dimensions,
            chunk_size: 100,
            chunk_overlap: 10,
            documents: vec!["a.txt".to_string()],
            built_at: Utc::now(),
        }
    }

    fn test_chunk(id: &str, position: u32, text: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            id: id.to_string(),
            position,
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_open_existing_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = index_path(temp.path());
        let err = open_existing(&path).unwrap_err();
        assert!(matches!(err, AppError::IndexNotFound(_)));
    }

    #[test]
    fn test_rebuild_rejects_empty_chunks() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut conn = create(&index_path(temp.path())).unwrap();
        let err = rebuild(&mut conn, &test_meta(3), &[]).unwrap_err();
        assert!(matches!(err, AppError::NoChunksProvided));
    }

    #[test]
    fn test_rebuild_and_query() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut conn = create(&index_path(temp.path())).unwrap();

        let chunks = vec![
            test_chunk("c1", 0, "north", vec![1.0, 0.0, 0.0]),
            test_chunk("c2", 1, "east", vec![0.0, 1.0, 0.0]),
            test_chunk("c3", 2, "northeast", vec![0.7, 0.7, 0.0]),
        ];
        rebuild(&mut conn, &test_meta(3), &chunks).unwrap();

        let results = query_chunks(&conn, &[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "north");
        assert_eq!(results[1].text, "northeast");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_rebuild_replaces_previous_content() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut conn = create(&index_path(temp.path())).unwrap();

        let first = vec![
            test_chunk("c1", 0, "old one", vec![1.0, 0.0]),
            test_chunk("c2", 1, "old two", vec![0.0, 1.0]),
        ];
        rebuild(&mut conn, &test_meta(2), &first).unwrap();
        assert_eq!(count_chunks(&conn).unwrap(), 2);

        let second = vec![test_chunk("c3", 0, "new", vec![1.0, 1.0])];
        rebuild(&mut conn, &test_meta(2), &second).unwrap();
        assert_eq!(count_chunks(&conn).unwrap(), 1);

        let results = query_chunks(&conn, &[1.0, 1.0], 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "new");
    }

    #[test]
    fn test_meta_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut conn = create(&index_path(temp.path())).unwrap();

        let meta = test_meta(384);
        let chunks = vec![test_chunk("c1", 0, "text", vec![0.5; 384])];
        rebuild(&mut conn, &meta, &chunks).unwrap();

        let loaded = load_meta(&conn).unwrap();
        assert_eq!(loaded.embedding_provider, "trigram");
        assert_eq!(loaded.embedding_model, "trigram-v1");
        assert_eq!(loaded.embedding_dimensions, 384);
        assert_eq!(loaded.chunk_size, 100);
        assert_eq!(loaded.documents, vec!["a.txt".to_string()]);
    }

    #[test]
    fn test_query_returns_at_most_top_k() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut conn = create(&index_path(temp.path())).unwrap();

        let chunks: Vec<IndexedChunk> = (0..10)
            .map(|i| test_chunk(&format!("c{}", i), i, &format!("text {}", i), vec![i as f32, 1.0]))
            .collect();
        rebuild(&mut conn, &test_meta(2), &chunks).unwrap();

        let results = query_chunks(&conn, &[1.0, 1.0], 4).unwrap();
        assert_eq!(results.len(), 4);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_query_with_wrong_dimensions_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut conn = create(&index_path(temp.path())).unwrap();

        let chunks = vec![test_chunk("c1", 0, "text", vec![1.0, 0.0, 0.0])];
        rebuild(&mut conn, &test_meta(3), &chunks).unwrap();

        let err = query_chunks(&conn, &[1.0, 0.0], 4).unwrap_err();
        assert!(matches!(
            err,
            AppError::EmbeddingDimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let embedding = vec![0.25, -1.5, 3.125];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
