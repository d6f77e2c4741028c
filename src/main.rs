//! sonos-queue-tui - A terminal view of a Sonos play queue with lazily loaded album art.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;

mod action;
mod app;
mod art;
mod config;
mod device;
mod tui;
mod ui;

use action::Action;
use app::App;
use config::Config;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "sonos-queue-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Device HTTP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Queue snapshot to show (overrides config)
    #[arg(short, long)]
    queue: Option<PathBuf>,

    /// Persist the effective configuration, overrides included
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_hooks()?;
    init_logging()?;

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(config, action_tx.clone());

    let mut terminal = tui::init()?;
    app.init().await?;

    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if event::poll(tick_rate)? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    Action::from_key(key.code, key.modifiers, app.show_help)
                }
                Event::Mouse(mouse) => Action::from_mouse(mouse.kind),
                Event::Resize(width, height) => Action::Resize(width, height),
                _ => Action::None,
            };
            if !action.is_none() {
                action_tx.send(action)?;
            }
        }

        action_tx.send(Action::Tick)?;

        while let Ok(action) = action_rx.try_recv() {
            app.handle_action(action).await?;
        }

        if app.should_quit {
            break;
        }
    }

    tui::restore()?;

    Ok(())
}

/// Log to a file under the cache dir; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_file = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sonos-queue-tui")
        .join("sonos-queue-tui.log");

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::fs::File::create(&log_file)?)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with(file_layer)
        .try_init()
        .ok();

    Ok(())
}

/// Load the config file and apply command-line overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    if let Some(host) = &args.host {
        config.device.host = host.clone();
    }
    if let Some(port) = args.port {
        config.device.port = port;
    }
    if let Some(queue) = &args.queue {
        config.ui.queue_path = Some(queue.clone());
    }

    if args.save_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        tracing::info!("Saved configuration");
    }

    Ok(config)
}

use tracing_subscriber::prelude::*;
