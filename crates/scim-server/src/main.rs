#![deny(unsafe_code)]
use anyhow::{Context, Result};
use clap::Parser;
use scim_server::ServerConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scim-server", version, about = "In-process reference SCIM server")]
struct Args {
    /// Bind address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// TOML file of non-conformance knobs (`ServerConfig`). Omit for a
    /// fully conformant server.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("scim=debug")
    } else {
        EnvFilter::new("scim=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            ServerConfig::from_toml(&text).context("parse config")?
        }
        None => ServerConfig::conformant(),
    };

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    let addr = listener.local_addr().context("read local addr")?;
    let base_url = format!("http://{addr}");

    tracing::info!(bind = %args.bind, "scim-server listening");

    let state = scim_server::AppState::new(config, base_url);
    let app = scim_server::build_app(state);

    axum::serve(listener, app).await.context("serve")?;
    Ok(())
}
