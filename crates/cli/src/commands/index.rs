//! Index command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_rag::{Document, IndexConfig};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions accepted when expanding directory arguments.
const SUPPORTED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "md", "markdown"];

/// Build (or rebuild) the index from documents
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Files or directories to index
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for {} paths", self.paths.len());

        let files = collect_files(&self.paths)?;
        if files.is_empty() {
            return Err(AppError::Config(format!(
                "No supported documents found. Supported extensions: {}",
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            match Document::from_path(file) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!("Skipping unreadable file {:?}: {}", file, e),
            }
        }

        let index_config = IndexConfig {
            embedding_provider: config.embedding_provider.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimensions: config.embedding_dimensions,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        };

        let api_key = config.resolve_api_key(&config.embedding_provider)?;

        let stats = docqa_rag::build_index(
            &config.workspace,
            &documents,
            &index_config,
            api_key.as_deref(),
        )
        .await?;

        if self.json {
            let output = serde_json::json!({
                "documentsCount": stats.documents_count,
                "chunksCount": stats.chunks_count,
                "characters": stats.characters,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} chunks, {} characters) in {:.2}s",
                stats.documents_count, stats.chunks_count, stats.characters, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Expand the path arguments into a flat list of document files.
/// Directories are walked recursively, keeping supported extensions.
fn collect_files(paths: &[PathBuf]) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(AppError::Config(format!("Path not found: {:?}", path)));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
