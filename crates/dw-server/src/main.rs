use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dw_db::RecordStore;
use dw_server::{AppState, StaticTokens, router};

#[derive(Parser, Debug)]
#[command(name = "dw-server", version, about = "Dwell-time ingestion and analytics service")]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:3001")]
    listen: SocketAddr,

    /// SQLite database path for the raw record store.
    #[arg(long, default_value = "./data/dw-records.db")]
    db: PathBuf,

    /// Bearer token mapping as `owner=token`. Repeatable.
    ///
    /// Tokens are validated locally; issuing them is out of scope here.
    #[arg(long = "token", value_name = "OWNER=TOKEN")]
    tokens: Vec<String>,
}

fn parse_tokens(specs: &[String]) -> Result<Vec<(String, String)>> {
    specs
        .iter()
        .map(|spec| {
            let (owner, token) = spec
                .split_once('=')
                .with_context(|| format!("invalid --token {spec:?}, expected OWNER=TOKEN"))?;
            Ok((token.to_string(), owner.to_string()))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse();

    if let Some(parent) = args.db.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let store = RecordStore::open(&args.db)
        .with_context(|| format!("failed to open {}", args.db.display()))?;

    let tokens = StaticTokens::new(parse_tokens(&args.tokens)?);
    let app = router(AppState::new(store, tokens));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    tracing::info!(listen = %args.listen, db = %args.db.display(), "serving");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
    }
}
