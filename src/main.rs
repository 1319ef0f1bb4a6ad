mod app;
mod audio;
mod config;
mod digits;
mod error;
mod interval;
mod notifications;
mod overlays;
mod panels;
mod scheduler;
mod ui;
mod util;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use audio::ChimeAlert;
use config::Config;
use error::Result;
use notifications::{BackgroundNotifier, NotificationCenter};
use scheduler::ChimeScheduler;

fn main() -> Result<()> {
    // Optional first argument overrides the config file location
    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(config::default_config_path, PathBuf::from);

    init_logging(&config::log_path(&config_path))?;
    info!(config = %config_path.display(), "random-chime starting");

    let (config, config_error) = match Config::load(&config_path) {
        Ok(config) => (config, None),
        Err(err) => {
            warn!(%err, "config rejected, using defaults");
            (
                Config::default(),
                Some(format!("{}: {err}. Using defaults.", config_path.display())),
            )
        }
    };
    let interval = config.interval()?;

    let alert_settings = config.alert_settings();
    let (notifier, deliveries) =
        BackgroundNotifier::spawn(move || ChimeAlert::new(alert_settings))?;
    let scheduler = ChimeScheduler::new(
        notifier,
        StdRng::from_entropy(),
        interval,
        config.scheduler_settings(),
    );

    let mut app = App::new(scheduler, deliveries);
    if let Some(ref message) = config_error {
        app.show_error(message.as_str());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableFocusChange,
        SetTitle("random-chime")
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;

    app.scheduler.stop();

    // Keep a broken config file for the user to fix
    if config_error.is_none() {
        let mut config = config;
        config.set_interval(app.scheduler.interval());
        if let Err(err) = config.save(&config_path) {
            warn!(%err, "could not save settings");
        }
    }

    info!(chimes = app.scheduler.delivered(), "random-chime exiting");
    result
}

fn run<N: NotificationCenter>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<N>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|frame| ui::render(frame, app, Instant::now()))?;

        if event::poll(tick_rate)? {
            app.handle_event(event::read()?, Instant::now());
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
