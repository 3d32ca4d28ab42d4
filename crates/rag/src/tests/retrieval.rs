//! End-to-end build and retrieval tests.
//!
//! Use the deterministic trigram provider so the whole pipeline runs
//! offline: extract, chunk, embed, persist, and query against a real
//! SQLite index in a temporary workspace.

use crate::types::{Document, IndexConfig, IndexPhase};
use crate::{build_index, clean, index, index_phase, retrieve, stats};
use docqa_core::AppError;

fn trigram_config() -> IndexConfig {
    IndexConfig {
        embedding_provider: "trigram".to_string(),
        embedding_model: "trigram-v1".to_string(),
        embedding_dimensions: 128,
        chunk_size: 200,
        chunk_overlap: 20,
    }
}

fn corpus() -> Vec<Document> {
    let facts = "Lutetia is the capital city of Francia. The city of Lutetia sits on \
                 the river Sequana and is famous for its lantern towers.\n\n\
                 The kingdom of Francia exports lavender, walnuts, and glass.";
    let noise = "Photosynthesis converts sunlight into chemical energy inside the \
                 chloroplasts of green plants.\n\n\
                 Mitochondria supply cellular energy through respiration.";
    vec![
        Document::new("facts.txt", facts.as_bytes().to_vec()),
        Document::new("noise.txt", noise.as_bytes().to_vec()),
    ]
}

#[tokio::test]
async fn test_build_then_retrieve_marker_phrase() {
    let temp = tempfile::TempDir::new().unwrap();
    let build = build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();
    assert_eq!(build.documents_count, 2);
    assert!(build.chunks_count >= 2);

    let chunks = retrieve(temp.path(), "what is the capital of Francia", 4, None)
        .await
        .unwrap();
    assert!(!chunks.is_empty());
    assert!(chunks.len() <= 4);
    assert!(
        chunks[0].text.contains("Lutetia"),
        "expected the capital chunk first, got: {}",
        chunks[0].text
    );
    for pair in chunks.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_rebuild_replaces_previous_index() {
    let temp = tempfile::TempDir::new().unwrap();
    build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();

    let replacement = vec![Document::new(
        "only.txt",
        b"Granite quarries dominate the northern valley economy.".to_vec(),
    )];
    build_index(temp.path(), &replacement, &trigram_config(), None)
        .await
        .unwrap();

    let chunks = retrieve(temp.path(), "capital of Francia", 10, None)
        .await
        .unwrap();
    for chunk in &chunks {
        assert!(
            !chunk.text.contains("Lutetia"),
            "old content survived the rebuild"
        );
    }

    let stats = stats(temp.path()).unwrap();
    assert_eq!(stats.documents, vec!["only.txt".to_string()]);
}

#[tokio::test]
async fn test_stale_embedding_dimensions_fail_fast() {
    let temp = tempfile::TempDir::new().unwrap();
    build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();

    // Shrink the recorded dimensions, as if the index had been built by
    // an older configuration. The stored vectors are still 128-dim, so
    // the 64-dim query embedding must be rejected, not scored.
    let conn = rusqlite::Connection::open(index::index_path(temp.path())).unwrap();
    conn.execute("UPDATE meta SET embedding_dimensions = 64", [])
        .unwrap();
    drop(conn);

    let err = retrieve(temp.path(), "capital of Francia", 4, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::EmbeddingDimensionMismatch {
            expected: 128,
            actual: 64
        }
    ));
}

#[tokio::test]
async fn test_retrieve_without_index_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    let err = retrieve(temp.path(), "anything", 4, None).await.unwrap_err();
    assert!(matches!(err, AppError::IndexNotFound(_)));
}

#[tokio::test]
async fn test_build_with_no_documents_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    let err = build_index(temp.path(), &[], &trigram_config(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoExtractableContent));
}

#[tokio::test]
async fn test_build_with_whitespace_documents_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    let docs = vec![Document::new("blank.txt", b"  \n\n  ".to_vec())];
    let err = build_index(temp.path(), &docs, &trigram_config(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoExtractableContent));
}

#[tokio::test]
async fn test_failed_first_build_creates_no_artifact() {
    let temp = tempfile::TempDir::new().unwrap();
    let blank = vec![Document::new("blank.txt", b"   ".to_vec())];
    assert!(build_index(temp.path(), &blank, &trigram_config(), None)
        .await
        .is_err());

    assert_eq!(index_phase(temp.path()), IndexPhase::NotStarted);
    let err = stats(temp.path()).unwrap_err();
    assert!(matches!(err, AppError::IndexNotFound(_)));
}

#[tokio::test]
async fn test_successful_build_leaves_no_staging_file() {
    let temp = tempfile::TempDir::new().unwrap();
    build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();

    let staging = index::index_path(temp.path()).with_extension("sqlite.tmp");
    assert!(!staging.exists());
    assert_eq!(index_phase(temp.path()), IndexPhase::Indexed);
}

#[tokio::test]
async fn test_failed_build_leaves_previous_index_intact() {
    let temp = tempfile::TempDir::new().unwrap();
    build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();

    let blank = vec![Document::new("blank.txt", b"   ".to_vec())];
    assert!(build_index(temp.path(), &blank, &trigram_config(), None)
        .await
        .is_err());

    let chunks = retrieve(temp.path(), "capital of Francia", 4, None)
        .await
        .unwrap();
    assert!(!chunks.is_empty());
}

#[tokio::test]
async fn test_index_phase_and_clean() {
    let temp = tempfile::TempDir::new().unwrap();
    assert_eq!(index_phase(temp.path()), IndexPhase::NotStarted);
    assert!(!clean(temp.path()).unwrap());

    build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();
    assert_eq!(index_phase(temp.path()), IndexPhase::Indexed);

    assert!(clean(temp.path()).unwrap());
    assert_eq!(index_phase(temp.path()), IndexPhase::NotStarted);
    let err = stats(temp.path()).unwrap_err();
    assert!(matches!(err, AppError::IndexNotFound(_)));
}

#[tokio::test]
async fn test_stats_reflect_build() {
    let temp = tempfile::TempDir::new().unwrap();
    let build = build_index(temp.path(), &corpus(), &trigram_config(), None)
        .await
        .unwrap();

    let stats = stats(temp.path()).unwrap();
    assert_eq!(stats.chunks_count, build.chunks_count);
    assert_eq!(
        stats.documents,
        vec!["facts.txt".to_string(), "noise.txt".to_string()]
    );
    assert!(stats.db_size_bytes > 0);
}
