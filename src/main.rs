//! gemini-panel - a terminal chat panel for Google Gemini.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use gemini_panel::app::App;
use gemini_panel::auth::{FileStore, KeyValueStore, MemoryStore, CREDENTIAL_KEY};
use gemini_panel::cli::{Args, Commands};
use gemini_panel::config::Config;
use gemini_panel::input;
use gemini_panel::llm::{GeminiClient, GeminiConfig};
use gemini_panel::logging;

/// `--store` value selecting a store that lives only for this run.
const MEMORY_STORE: &str = ":memory:";

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = args.log_file.clone().or_else(logging::default_log_path) {
        if let Err(e) = logging::init(&path) {
            eprintln!("Logging disabled: {:#}", e);
        }
    }

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };

    let store = open_store(&args, &config)?;

    match args.subcommand() {
        Commands::SignOut => {
            store
                .delete(CREDENTIAL_KEY)
                .context("Failed to remove stored API key")?;
            println!("Stored API key removed.");
            Ok(())
        }
        Commands::Chat => run_tui(store, &config),
    }
}

fn open_store(args: &Args, config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let path = args.store.clone().or_else(|| config.storage.path.clone());
    let store: Arc<dyn KeyValueStore> = match path {
        Some(path) if path.as_os_str() == MEMORY_STORE => Arc::new(MemoryStore::new()),
        Some(path) => Arc::new(FileStore::new(path)),
        None => Arc::new(FileStore::open_default().context("Failed to locate credential store")?),
    };
    Ok(store)
}

fn run_tui(store: Arc<dyn KeyValueStore>, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let _guard = runtime.enter();

    let gemini = GeminiConfig::from_env_and_config(Some(&config.gemini));
    tracing::info!(model = %gemini.chat_model, api_base = %gemini.api_base, "Starting gemini-panel");
    let api = Arc::new(GeminiClient::new(gemini));

    let mut app = App::new(
        store,
        api,
        Duration::from_millis(config.behavior.saved_display_ms),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = input::run_app(&mut terminal, &mut app, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Application error: {:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
