use anyhow::Context as _;
use clap::{Parser, Subcommand};
use grounder::api::{self, ApiState};
use grounder::config::{Config, GENERATION_TEMPERATURE};
use grounder::console;
use grounder::embedding::{Embedder as _, FastembedEmbedder};
use grounder::engine::QueryEngine;
use grounder::generation::GroqClient;
use grounder::index::{ChunkStore as _, IngestionPipeline, LanceChunkStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grounder", about = "Retrieval-augmented document Q&A")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Ingest a document into the index.
    Ingest { path: PathBuf },
    /// Interactive question/answer session.
    Chat,
    /// Interactive menu (also the default when no subcommand is given).
    Menu,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("configuration error")?;
    let system = System::build(&config).await?;

    match cli.command {
        Some(Command::Serve { bind }) => {
            let state = Arc::new(ApiState::new(system.engine, system.pipeline));
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            let handle = api::start_http_server(bind, state, shutdown_rx).await?;

            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            let _ = shutdown_tx.send(true);
            handle.await?;
        }
        Some(Command::Ingest { path }) => {
            let chunks = system.pipeline.ingest(&path).await?;
            println!("Ingested {chunks} chunks from {}", path.display());
            if chunks > 0 {
                system.store.create_index().await?;
            }
        }
        Some(Command::Chat) => console::chat(&system.engine).await?,
        Some(Command::Menu) | None => console::run(system.pipeline, system.engine).await?,
    }

    Ok(())
}

/// Long-lived handles, constructed once per process and shared by every
/// request. No globals; front-ends receive these explicitly.
struct System {
    store: Arc<LanceChunkStore>,
    pipeline: Arc<IngestionPipeline>,
    engine: Arc<QueryEngine>,
}

impl System {
    async fn build(config: &Config) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", config.data_dir.display()))?;

        tracing::info!(model = %config.embedding_model, "loading embedding model");
        let model_name = config.embedding_model.clone();
        let cache_dir = config.model_cache_dir();
        let embedder = tokio::task::spawn_blocking(move || {
            FastembedEmbedder::new(&model_name, &cache_dir)
        })
        .await
        .context("embedding model load task failed")??;
        let embedder = Arc::new(embedder);

        let connection = lancedb::connect(
            config
                .data_dir
                .to_str()
                .context("data dir path is not valid UTF-8")?,
        )
        .execute()
        .await
        .context("failed to open the vector store")?;

        let store = Arc::new(
            LanceChunkStore::open_or_create(
                &connection,
                &config.table_name,
                embedder.dimensions(),
            )
            .await?,
        );

        if store.count().await? > 0 {
            store.create_index().await?;
        }

        let generator = Arc::new(GroqClient::new(
            config.groq_base_url.clone(),
            config.groq_api_key.clone(),
            config.chat_model.clone(),
            GENERATION_TEMPERATURE,
        ));

        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            embedder.clone(),
            config.chunk_size,
            config.chunk_overlap,
        ));
        let engine = Arc::new(QueryEngine::new(
            store.clone(),
            embedder,
            generator,
            config.top_k,
        ));

        Ok(Self {
            store,
            pipeline,
            engine,
        })
    }
}
