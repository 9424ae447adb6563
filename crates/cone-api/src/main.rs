//! Axum API server binary.

use std::net::SocketAddr;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cone_api::{create_router, metrics, ApiConfig, AppState};
use cone_inference::InferenceConfig;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    init_tracing();
    info!("Starting cone-api");

    let config = ApiConfig::from_env();
    let inference = InferenceConfig::from_env();
    info!(
        "API config: host={}, port={}, production={}, model={}, project_root={}",
        config.host,
        config.port,
        config.is_production(),
        inference.model_path.display(),
        inference.project_root.display()
    );

    let state = AppState::new(config.clone(), inference);

    // Eager load; a failure here is retried on the first request.
    match state.pipeline.model().get().await {
        Ok(model) => info!("Model ready with {} classes", model.info().num_classes()),
        Err(e) => warn!("Model not loaded at startup, will retry on first request: {}", e),
    }

    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address {}:{}: {}", config.host, config.port, e);
            std::process::exit(1);
        }
    };

    let tls = if config.tls_available() {
        match RustlsConfig::from_pem_file(&config.tls_cert_path, &config.tls_key_path).await {
            Ok(tls) => Some(tls),
            Err(e) => {
                warn!("Failed to load TLS certificates, falling back to HTTP: {}", e);
                None
            }
        }
    } else {
        if config.use_https {
            warn!(
                "TLS certificates not found at {} / {}, falling back to HTTP",
                config.tls_cert_path.display(),
                config.tls_key_path.display()
            );
        }
        None
    };

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    let served = match tls {
        Some(tls) => {
            info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("Listening on http://{}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };

    if let Err(e) = served {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "cone=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal(handle: Handle) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Received shutdown signal");
    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
