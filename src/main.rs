//! Leemer Chat relay server

use leemer_chat::api::{create_router, AppState};
use leemer_chat::config::ServerConfig;
use leemer_chat::llm::{HttpUpstream, LoggingUpstream, ModelRegistry};
use leemer_chat::relay::StreamRelay;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leemer_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env()?;
    let catalog = config.load_catalog()?;

    // Initialize model registry
    let llm_registry = Arc::new(ModelRegistry::new(&config.llm, catalog)?);
    tracing::info!(
        models = llm_registry.models().len(),
        default = %llm_registry.default_model_id(),
        policy = config.forward_policy.as_str(),
        "Model registry initialized"
    );

    let upstream = Arc::new(LoggingUpstream::new(Arc::new(HttpUpstream::new()?)));
    let relay = Arc::new(StreamRelay::new(
        llm_registry,
        upstream,
        config.forward_policy,
        config.assistant_name.clone(),
    ));
    let state = AppState::new(relay);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.addr();
    tracing::info!("Leemer Chat relay listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
