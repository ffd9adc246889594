//! HTTP service startup.

use crate::api::{self, AppContext};
use medbot_core::{AppConfig, AppError, AppResult};
use std::io;
use tokio::task::JoinError;

/// Bind the listener, then build the answer pipeline in the background.
///
/// Requests are served immediately; query endpoints answer "not
/// initialized" until the pipeline is installed. An initialization failure
/// stops the server and is returned.
pub async fn run(config: AppConfig) -> AppResult<()> {
    let context = AppContext::new(config.index.name.clone());
    let app = api::router(context.clone());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(address.as_str()).await?;
    tracing::info!("Medical Chatbot API listening on http://{}", address);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });
    let mut init = tokio::spawn(initialize(config, context));

    tokio::select! {
        result = &mut init => {
            let outcome = result
                .map_err(|e| AppError::Other(format!("Initialization task failed: {}", e)))
                .and_then(|r| r);
            if let Err(e) = outcome {
                tracing::error!("Startup failed: {}", e);
                server.abort();
                return Err(e);
            }
            server_result(server.await)
        }
        result = &mut server => {
            init.abort();
            server_result(result)
        }
    }
}

async fn initialize(config: AppConfig, context: AppContext) -> AppResult<()> {
    tracing::info!("Building answer pipeline for index '{}'", config.index.name);

    let pipeline = medbot_knowledge::build_pipeline(&config).await?;
    context.mark_ready(pipeline.chain)?;

    tracing::info!(
        "Startup complete: {} pages, {} chunks ({:?})",
        pipeline.report.pages,
        pipeline.report.chunks,
        pipeline.report.outcome
    );
    Ok(())
}

fn server_result(result: Result<io::Result<()>, JoinError>) -> AppResult<()> {
    result
        .map_err(|e| AppError::Other(format!("Server task failed: {}", e)))?
        .map_err(AppError::Io)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
