use anyhow::Context;
use clap::Parser;
use pagebuilder_editor::{FilePageStore, MemoryPageStore, PageStore, StoreConfig};
use pagebuilder_evaluator::{Evaluator, RenderConfig};
use pagebuilder_model::SchemaRegistry;
use pagebuilder_workspace::{flush_session, router, spawn_autosave, AppState, WorkspaceState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pagebuilder-server")]
#[command(about = "Storefront page builder server", long_about = None)]
struct Args {
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// HTTP port
    #[arg(short, long, default_value_t = 3030)]
    port: u16,

    /// Directory holding one JSON document per page
    #[arg(long, default_value = "pages")]
    data_dir: PathBuf,

    /// Keep pages in memory only
    #[arg(long)]
    memory: bool,

    /// Quiet period before an edited page is autosaved
    #[arg(long, default_value_t = 1000)]
    debounce_ms: u64,

    /// Undo levels kept per session (0 = unlimited)
    #[arg(long, default_value_t = 100)]
    history_limit: usize,

    /// Rendering options as a JSON file
    #[arg(long)]
    render_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let pages: Arc<dyn PageStore> = if args.memory {
        Arc::new(MemoryPageStore::new())
    } else {
        std::fs::create_dir_all(&args.data_dir)
            .with_context(|| format!("Failed to create data directory {}", args.data_dir.display()))?;
        Arc::new(FilePageStore::new(&args.data_dir))
    };

    let render_config = match &args.render_config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<RenderConfig>(&source)
                .with_context(|| format!("Invalid render config {}", path.display()))?
        }
        None => RenderConfig::default(),
    };
    let evaluator = Evaluator::with_config(render_config).with_schema(Arc::new(SchemaRegistry::builtin()));

    let store_config = StoreConfig {
        autosave_debounce_ms: args.debounce_ms,
        history_limit: args.history_limit,
    };

    let state = AppState::new(WorkspaceState::new(pages, evaluator, store_config));
    let (stop_autosave, autosave_stopped) = tokio::sync::watch::channel(false);
    let autosave = spawn_autosave(state.clone(), Duration::from_millis(250), autosave_stopped);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, memory = args.memory, "Page builder server listening");

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // let a write in progress finish before flushing
    let _ = stop_autosave.send(true);
    autosave.await.context("Autosave task failed")?;

    // flush edits still waiting on the debounce
    let open = state.lock()?.session_ids();
    for page_id in open {
        if flush_session(&state, &page_id).await? {
            tracing::info!(page_id, "Flushed on shutdown");
        } else {
            tracing::error!(page_id, "Unsaved edits lost on shutdown");
        }
    }
    Ok(())
}
