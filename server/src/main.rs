use anyhow::{bail, Result};
use axum::Router;
use clap::{ArgGroup, Parser};
use offsearch_core::searchbox::parse_max_results;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};
use server::source::IndexSource;
use server::{build_app, spawn_index_load, AppState, Settings};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["index_source_url", "snapshot"])))]
struct Args {
    /// Index data file: http(s) URL, file:// URL or local path
    #[arg(long)]
    index_source_url: Option<String>,
    /// Snapshot directory written by `indexer build`
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Maximum number of results per query
    #[arg(long, value_parser = |s: &str| parse_max_results(s).map_err(|e| e.to_string()))]
    max_results: usize,
    /// Prefix joined with every document ref to form its link
    #[arg(long)]
    base_href: String,
    /// Timeout for fetching a remote index, in seconds
    #[arg(long, default_value_t = 30)]
    fetch_timeout_secs: u64,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let source = match (&args.snapshot, &args.index_source_url) {
        (Some(dir), _) => IndexSource::Snapshot(dir.clone()),
        (None, Some(url)) => IndexSource::from_url(url)?,
        (None, None) => bail!("either --index-source-url or --snapshot is required"),
    };
    let state = AppState::new(Settings { max_results: args.max_results, base_href: args.base_href.clone() });
    // serve right away, queries are no-ops until the index is in
    spawn_index_load(state.clone(), source, Duration::from_secs(args.fetch_timeout_secs));
    let app: Router = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
