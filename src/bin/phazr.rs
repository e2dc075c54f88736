use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use phazr::config::{self, Credentials};
use phazr::tumblr::TumblrClient;
use phazr::web;

#[derive(Parser)]
#[command(name = "phazr", version, about = "Social-blog content relay server")]
struct Cli {
    /// Path to the config file (default: ./phazr.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials and blog list may live in .env.local, like the rest of
    // the deployment tooling expects.
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phazr=info")),
        )
        .init();

    let cli = Cli::parse();

    let config_file = cli
        .config
        .unwrap_or_else(|| config::config_path(Path::new(".")));
    let mut config = config::load_config(&config_file)?.unwrap_or_default();
    config.apply_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if config.blogs.is_empty() {
        tracing::warn!("no blogs configured; set BLOG_LIST or add blogs to phazr.toml");
    }

    let client = TumblrClient::new(Credentials::from_env())?;
    web::serve(&config, Arc::new(client)).await
}
