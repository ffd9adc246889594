//! Serve command handler.

use clap::Args;
use medbot_core::{config::AppConfig, AppResult};

/// Run the HTTP API
#[derive(Args, Debug, Default)]
pub struct ServeCommand {
    /// Listen address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        medbot::server::run(config).await
    }
}
