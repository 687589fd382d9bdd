//! vpntop: live throughput and connection dashboard for a command-line VPN client.
//!
//! Features:
//!   - Active interface discovery and per-interface download/upload rate
//!   - Connection status scraped from the VPN client
//!   - Country / city / group / roulette server selection
//!   - Optional rate file for status bars and scripts
//!
//! Keybindings: `s` opens server selection, `q` quits.

mod app;
mod config;
mod error;
mod event;
mod input;
mod instance;
mod selection;
mod system;
mod ui;
mod vpn;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use app::App;
use config::Config;
use event::{Event, Events};
use instance::InstanceLock;
use system::network::SysinfoCounters;
use system::rate_file::RateFile;
use system::sampler::{Sampler, SharedRate};
use ui::theme::Theme;
use vpn::{VpnCommand, VpnControl};

#[derive(Debug, Parser)]
#[command(name = "vpntop")]
#[command(about = "Live throughput and connection dashboard for a VPN client", long_about = None)]
struct Cli {
    /// The path to a config file. Defaults to $XDG_CONFIG_HOME/vpntop/vpntoprc.
    #[arg(short = 'C', long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Sample this interface instead of discovering the active one.
    #[arg(short, long)]
    interface: Option<String>,
    /// VPN client binary to drive.
    #[arg(long, value_name = "PROGRAM")]
    vpn_command: Option<String>,
    /// Sampling interval in milliseconds.
    #[arg(long, value_name = "MS")]
    interval: Option<u64>,
    /// Mirror the latest rate to this file as "<down> <up>".
    #[arg(long, value_name = "FILE")]
    rate_file: Option<PathBuf>,
    /// Write logs here. Defaults to vpntop.log in the temp directory.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Disable colors.
    #[arg(long)]
    monochrome: bool,
    /// Print the rate published by a running instance and exit.
    #[arg(long)]
    print_rate: bool,
    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Override with command line flags.
    fn apply(&self, cfg: &mut Config) {
        if let Some(interface) = &self.interface {
            cfg.interface = Some(interface.clone());
        }
        if let Some(command) = &self.vpn_command {
            cfg.vpn_command = command.clone();
        }
        if let Some(ms) = self.interval {
            cfg.sample_interval_ms = ms.clamp(200, 60_000);
        }
        if let Some(path) = &self.rate_file {
            cfg.rate_file = Some(path.clone());
        }
        if self.monochrome {
            cfg.monochrome = true;
        }
    }
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("vpntop: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().or_else(config::default_config_path);
    let mut cfg = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply(&mut cfg);

    if cli.save_config {
        let path = config_path.context("could not determine config path")?;
        cfg.save(&path)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    if cli.print_rate {
        return print_rate(&cfg);
    }

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("vpntop.log"));
    init_logging(&log_file)?;
    debug!(?cfg, "starting up");

    let lock = InstanceLock::acquire(&cfg.lock_file)?;
    debug!(path = %lock.path().display(), "holding instance lock");

    // Nothing downstream means anything without an interface.
    let interface = match &cfg.interface {
        Some(name) => system::interface::require_interface(name),
        None => system::interface::find_active_interface(),
    }
    .context("interface discovery")?;

    let shared = SharedRate::new();
    let mut sampler = Sampler::spawn(
        interface.clone(),
        cfg.sample_interval(),
        SysinfoCounters::new(),
        shared.clone(),
        cfg.rate_file.clone().map(RateFile::new),
    )?;
    info!(interface = %sampler.interface(), "sampling interface");

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        debug!("received termination signal");
        shutdown_tx.try_send(()).ok();
    })?;

    let vpn = VpnCommand::new(cfg.vpn_command.clone()).with_timeout(cfg.command_timeout());
    let mut app = App::new(
        interface,
        vpn.program().to_string(),
        Theme::new(cfg.monochrome),
        cfg.max_prompt_attempts,
    );

    let result = (|| -> Result<()> {
        // Setup terminal; the guard restores it on every way out of here
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;

        let events = Events::new(cfg.refresh_interval(), cfg.input_poll(), shutdown_rx)?;
        run_app(&mut terminal, &mut app, &events, &vpn, &shared)
    })();

    shutdown(&mut sampler);
    drop(lock);
    result
}

/// Raw mode + alternate screen for as long as it lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("failed to leave raw mode: {}", e);
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
            warn!("failed to restore screen: {}", e);
        }
    }
}

/// The one exit path for background work. Returns whether this call was
/// the one that stopped the sampler.
fn shutdown(sampler: &mut Sampler) -> bool {
    let stopped = sampler.stop();
    info!(stopped, "shut down");
    stopped
}

/// Main application loop
fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &Events,
    vpn: &dyn VpnControl,
    shared: &SharedRate,
) -> Result<()> {
    let mut rng = rand::thread_rng();

    // Initial data collection
    app.refresh(vpn, shared)?;

    loop {
        if app.clear_screen {
            terminal.clear()?;
            app.clear_screen = false;
        }
        terminal.draw(|f| ui::draw(f, app))?;

        match events.next() {
            Event::Tick => app.refresh(vpn, shared)?,
            Event::Key(key) => input::handle_input(app, key, vpn, &mut rng),
            Event::Resize => {}
            Event::Shutdown => app.request_quit(),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_rate(cfg: &Config) -> Result<()> {
    let path = cfg
        .rate_file
        .as_deref()
        .context("no rate file configured (set rate_file or pass --rate-file)")?;
    match RateFile::read(path).with_context(|| format!("reading {}", path.display()))? {
        Some((down, up)) => println!("{:.2} {:.2}", down, up),
        None => println!("unavailable"),
    }
    Ok(())
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    // The terminal belongs to the dashboard, so logs only go to the file.
    let file_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(
            EnvFilter::builder()
                .with_default_directive("vpntop=info".parse()?)
                .from_env_lossy(),
        );

    tracing_subscriber::registry().with(file_log).init();
    Ok(())
}
