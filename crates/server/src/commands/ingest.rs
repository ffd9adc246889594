//! Ingest command handler.
//!
//! Runs the indexing stages without starting the API.

use clap::Args;
use medbot_core::{config::AppConfig, AppResult};
use medbot_knowledge::LoadOutcome;

/// Load, split and index the PDF directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for index '{}'", config.index.name);

        let embedder = medbot_knowledge::create_embedder(config)?;
        let manager = medbot_knowledge::create_index_manager(config)?;
        let (_, report) =
            medbot_knowledge::index_documents(config, embedder.as_ref(), manager.as_ref()).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let outcome = match report.outcome {
                LoadOutcome::Loaded => "loaded existing index".to_string(),
                LoadOutcome::Created { uploaded } => format!("uploaded {} vectors", uploaded),
            };
            println!(
                "Index '{}': {} ({} files, {} pages, {} chunks) in {:.2}s",
                report.index_name,
                outcome,
                report.files,
                report.pages,
                report.chunks,
                report.duration_secs
            );
        }

        Ok(())
    }
}
