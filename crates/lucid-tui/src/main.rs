mod app;
mod event;
mod theme;
mod ui;
mod views;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use app::App;
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use event::{AppEvent, EventReader};
use lucid_core::config::{get_data_dir, LoggingConfig, LucidConfig};
use lucid_core::state::{Action, AppState, Effect};
use lucid_core::{ApiClient, Executor, TokenStore};
use ratatui::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "lucid-tui",
    version,
    about = "Lucid Loop Studio Chat in the terminal"
)]
struct Args {
    /// Chat API base URL (overrides VITE_API_URL and config files)
    #[arg(long)]
    api_url: Option<String>,

    /// View to open: login, signup, chat or profile
    #[arg(short, long, default_value = "chat")]
    route: String,

    /// Read settings from this file instead of the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep the sign-in in memory only
    #[arg(long)]
    ephemeral: bool,

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
    if let Some(url) = args.api_url {
        config.client.api_url = url;
    }
    config.validate_client()?;

    let _guard = init_logging(&config.logging, args.verbose)?;

    let api = Arc::new(ApiClient::from_config(&config.client)?);
    let store = match (args.ephemeral, config.storage_path()) {
        (false, Some(path)) => TokenStore::open(path),
        _ => TokenStore::in_memory(),
    };
    if let Some(path) = store.path() {
        info!("Token store at {}", path.display());
    }
    let executor = Executor::new(api, Arc::new(store));

    let (state, effects) = AppState::boot(&config.client, Some(&args.route));
    let mut app = App::new(state, &config.client);
    let (tx, rx) = mpsc::unbounded_channel();
    run_effects(&executor, effects, &tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run(&mut terminal, &mut app, &executor, tx, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    executor: &Executor,
    tx: UnboundedSender<Action>,
    mut rx: UnboundedReceiver<Action>,
) -> anyhow::Result<()> {
    let events = EventReader::new(50);

    while app.running {
        while let Ok(action) = rx.try_recv() {
            let effects = app.dispatch(action);
            run_effects(executor, effects, &tx);
        }

        terminal.draw(|f| ui::render(f, app))?;

        match events.next()? {
            AppEvent::Key(key) => {
                for action in app.handle_key(key) {
                    let effects = app.dispatch(action);
                    run_effects(executor, effects, &tx);
                }
            }
            AppEvent::Resize | AppEvent::Tick => {}
        }
    }

    info!("Exiting");
    Ok(())
}

fn run_effects(executor: &Executor, effects: Vec<Effect>, tx: &UnboundedSender<Action>) {
    for effect in effects {
        executor.spawn(effect, tx.clone());
    }
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<WorkerGuard> {
    let path = if logging.file_path.is_empty() {
        get_data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("logs")
            .join("lucid-tui.log")
    } else {
        PathBuf::from(&logging.file_path)
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "lucid-tui.log".into());

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let level = if verbose { "debug" } else { logging.level.as_str() };
    let mut filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    if !level.contains('=') {
        filter = filter.add_directive(format!("lucid={}", level).parse()?);
    }

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(fmt::layer().json().with_writer(writer)).init();
    } else {
        registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .init();
    }

    Ok(guard)
}
