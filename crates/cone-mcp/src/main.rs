//! MCP server binary.
//!
//! stdout carries the protocol; all logging goes to stderr.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rmcp::transport::stdio;
use rmcp::ServiceExt;

use cone_inference::{InferenceConfig, InferencePipeline};
use cone_mcp::{McpError, McpResult, McpServer};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = InferenceConfig::from_env();
    info!(
        "Starting cone-mcp: model={}, reference_images={}",
        config.model_path.display(),
        config.reference_images_dir.display()
    );

    let server = McpServer::new(Arc::new(InferencePipeline::new(config)));
    if let Err(e) = run(server).await {
        error!("MCP server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(server: McpServer) -> McpResult<()> {
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| McpError::Initialize(e.to_string()))?;
    let reason = service.waiting().await?;
    info!("MCP session ended: {:?}", reason);
    Ok(())
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "cone=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    }
}
