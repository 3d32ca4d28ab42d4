//! Clean command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Delete the index
#[derive(Args, Debug)]
pub struct CleanCommand {}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command");

        if docqa_rag::clean(&config.workspace)? {
            println!("Index removed");
        } else {
            println!("No index to remove");
        }

        Ok(())
    }
}
