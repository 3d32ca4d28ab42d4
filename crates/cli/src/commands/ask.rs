//! Ask command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_rag::{AskOptions, IndexPhase};

/// Ask a question answered from the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        if docqa_rag::index_phase(&config.workspace) == IndexPhase::NotStarted {
            return Err(AppError::Config(
                "No index has been built yet. Run 'docqa index <paths>' first.".to_string(),
            ));
        }

        let options = AskOptions {
            top_k: self.top_k.unwrap_or(config.top_k),
            temperature: self.temperature.unwrap_or(config.temperature),
        };

        let api_key = config.resolve_api_key(&config.provider)?;

        let answer = docqa_rag::ask(
            &config.workspace,
            &self.question,
            &config.provider,
            &config.model,
            &options,
            api_key.as_deref(),
        )
        .await?;

        tracing::debug!(
            "Answer synthesized (max_score={:.3}, chunks_used={})",
            answer.max_score,
            answer.chunks_used
        );

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer.text,
                "maxScore": answer.max_score,
                "chunksUsed": answer.chunks_used,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.text);
        }

        Ok(())
    }
}
