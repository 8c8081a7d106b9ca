//! synapse HTTP server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use synapse_api::{router, AppState};
use synapse_core::{ItemRepository, SynapseConfig, VectorStore};
use synapse_db::Database;
use synapse_inference::{ProviderAdapter, ProviderStrategy};
use synapse_ingest::{HttpPageFetcher, IngestSettings, IngestionPipeline, MetadataResolver};
use synapse_search::{HybridSearchEngine, SearchSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, daily rotation)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - env filter
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "synapse_api=debug,synapse_ingest=debug,synapse_search=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("synapse-api.log");
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(log_ansi.unwrap_or(false)),
                )
                .init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = SynapseConfig::from_env()?;
    info!(
        primary_provider = %config.primary_provider.as_str(),
        fallback_provider = config.fallback_provider.map(|k| k.as_str()).unwrap_or("none"),
        vector_collection = %config.vector_collection,
        "Configuration loaded"
    );

    let db = Database::connect(&config).await?;
    db.migrate().await?;
    db.health_check().await?;
    info!("Database ready");

    let adapter = ProviderAdapter::new(ProviderStrategy::from_config(&config)?);
    let fetcher = HttpPageFetcher::new(&config.metadata)?;
    let resolver = MetadataResolver::new(Arc::new(fetcher), config.metadata.clone());
    let items: Arc<dyn ItemRepository> = Arc::new(db.items.clone());
    let vectors: Arc<dyn VectorStore> = Arc::new(db.vectors.clone());

    let pipeline = IngestionPipeline::new(
        adapter.clone(),
        resolver,
        items.clone(),
        vectors.clone(),
        IngestSettings::from(&config),
    );
    let search = HybridSearchEngine::new(adapter, items, vectors, SearchSettings::from(&config));

    let app = router(AppState { pipeline, search });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
