use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lucid_core::config::{LoggingConfig, LucidConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "lucid-server",
    version,
    about = "Serve the Lucid Loop Studio Chat web client"
)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the built frontend (overrides LUCID_SERVER_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Read settings from this file instead of the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LucidConfig::load_from_paths(vec![path.clone()]),
        None => LucidConfig::load(),
    }
    .context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(root) = args.root {
        config.server.root = root;
    }

    init_logging(&config.logging, args.verbose)?;

    lucid_server::serve(&config.server)
        .await
        .context("server error")?;
    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let mut filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    if !level.contains('=') {
        filter = filter.add_directive(format!("lucid={}", level).parse()?);
    }
    let filter = filter.add_directive("tower_http=info".parse()?);

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
    Ok(())
}
