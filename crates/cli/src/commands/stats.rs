//! Stats command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = docqa_rag::stats(&config.workspace)?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "chunksCount": stats.chunks_count,
                "dbSizeBytes": stats.db_size_bytes,
                "builtAt": stats.built_at.to_rfc3339(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Index statistics:");
            println!("  Documents: {}", stats.documents.len());
            for name in &stats.documents {
                println!("    - {}", name);
            }
            println!("  Chunks: {}", stats.chunks_count);
            println!("  Size: {} bytes", stats.db_size_bytes);
            println!("  Built: {}", stats.built_at.to_rfc3339());
        }

        Ok(())
    }
}
