mod auth;
mod config;
mod errors;
mod llm_client;
mod models;
mod render;
mod review;
mod routes;
mod state;
mod store;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::HttpAuthGate;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::render::PdfiumRenderer;
use crate::review::analyzer::ClaudeAnalyzer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::redis_kv::RedisRecordStore;
use crate::store::s3_blobs::S3BlobStore;
use crate::store::BlobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; startup fails on missing required env vars
    let config = Config::from_env()?;

    // Structured logging; RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Critiq API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the Redis-backed record store
    let redis = redis::Client::open(config.redis_url.clone())?;
    let records = Arc::new(RedisRecordStore::connect(&redis).await?);
    info!("Record store initialized");

    // Initialize the S3 / MinIO blob store
    let s3 = build_s3_client(&config).await;
    let blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(s3, config.s3_bucket.clone()));
    info!("Blob store initialized");

    // LLM client and the analyzer on top of it
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let analyzer = Arc::new(ClaudeAnalyzer::new(llm, blobs.clone()));

    // The pdfium engine binds lazily on first render
    let renderer = Arc::new(PdfiumRenderer);

    // Session gate against the hosted auth endpoint
    let auth = Arc::new(HttpAuthGate::new(config.auth_endpoint.clone()));

    let state = AppState {
        records,
        blobs,
        renderer,
        analyzer,
        auth,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3 client pointed at MinIO locally or AWS in production.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "critiq-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
