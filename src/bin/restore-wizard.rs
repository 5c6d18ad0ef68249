use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use restore_wizard::api::{DemoRestoreApi, HttpRestoreApi, RestoreApi};
use restore_wizard::config::WizardConfig;
use restore_wizard::error::{RestoreError, Result};
use restore_wizard::event::{Event, EventHandler};
use restore_wizard::wizard::{self, App, WizardStateProps, WizardStore};
use std::io::stdout;
use std::panic;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "restore-wizard")]
#[command(author, version, about = "Restore a backup image onto a local disk")]
struct Args {
    /// Path to config file (default: /etc/restore-wizard/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Base URL of the restore-control service
    #[arg(long)]
    url: Option<String>,

    /// Walk through the wizard against a simulated service
    #[arg(long)]
    demo: bool,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The terminal belongs to the UI, so logs only ever go to a file
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting restore-wizard");
        }
    }

    let config = load_config(&args);

    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    let result = run_wizard(&mut terminal, config).await;

    restore_terminal()?;

    if let Err(ref e) = result {
        error!("Wizard error: {}", e);
    }

    result
}

fn load_config(args: &Args) -> WizardConfig {
    let loaded = match &args.config {
        Some(path) => WizardConfig::load_from(path),
        None => WizardConfig::load(),
    };

    let mut config = loaded.unwrap_or_else(|e| {
        warn!("Ignoring unreadable config: {}", e);
        WizardConfig::default()
    });

    // Command line overrides config
    if let Some(url) = &args.url {
        config.server.url = url.clone();
    }
    if args.demo {
        config.general.demo = true;
    }
    config
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| RestoreError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| RestoreError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| RestoreError::Terminal(e.to_string()))
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| RestoreError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen).map_err(|e| RestoreError::Terminal(e.to_string()))?;
    Ok(())
}

async fn run_wizard(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: WizardConfig,
) -> Result<()> {
    let api: Arc<dyn RestoreApi> = if config.general.demo {
        info!("Running against the demo service");
        Arc::new(DemoRestoreApi::new())
    } else {
        let api = HttpRestoreApi::new(&config.server.url, config.server.request_timeout())?;
        info!("Restore service at {}", api.base_url());
        Arc::new(api)
    };

    let store = WizardStore::new(WizardStateProps::default());
    let mut events = EventHandler::new(Duration::from_millis(250));
    events.attach_store(store.subscribe());

    let (mut app, steps) = App::new(config, api, store);
    events.attach_steps(steps);
    app.sync();

    loop {
        terminal
            .draw(|frame| wizard::ui::draw(frame, &app))
            .map_err(|e| RestoreError::Terminal(e.to_string()))?;

        let Some(event) = events.next().await else {
            break;
        };

        match event {
            Event::Key(key) => {
                if let Some(action) = app.handle_key(key) {
                    app.perform(action);
                }
            }
            Event::Step(envelope) => {
                app.handle_step(envelope);
            }
            Event::StateChanged => app.sync(),
            Event::Tick => app.tick(),
            Event::Resize => {}
        }

        if app.should_exit {
            break;
        }
    }

    info!("Leaving restore-wizard");
    Ok(())
}
