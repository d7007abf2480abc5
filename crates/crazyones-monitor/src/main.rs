//! CrazyOnes monitor binary: CLI entrypoint, configuration resolution,
//! single-instance enforcement, and signal-driven shutdown (spec §6).

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crazyones_core::config::{self, FileConfig};
use crazyones_monitor::scheduler::{self, SchedulerState};
use crazyones_monitor::tick::TickConfig;
use regex::Regex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_INTERVAL_SECS: u64 = 21_600;
const DEFAULT_APPLE_UPDATES_URL: &str = "https://support.apple.com/en-us/HT201222";
const TOKEN_PATTERN: &str = r"^[0-9]{8,10}:[A-Za-z0-9_-]{35,}$";

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG_ERROR: i32 = 1;
const EXIT_NETWORK_ERROR: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "crazyones-monitor")]
#[command(about = "Scrapes Apple's security-releases page across locales and writes the bot trigger")]
struct Args {
    /// Telegram bot token; overrides config.json and the environment.
    #[arg(long)]
    token: Option<String>,

    /// Apple security-releases index URL; overrides config.json and the environment.
    #[arg(long)]
    url: Option<String>,

    /// Run the scheduler loop instead of a single tick.
    #[arg(long)]
    daemon: bool,

    /// Seconds between ticks in daemon mode.
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval: u64,

    /// Print the last 100 lines of the log file and exit.
    #[arg(long)]
    log: bool,

    /// Print the crate version and exit.
    #[arg(long)]
    version: bool,
}

fn main() {
    let args = Args::parse();

    if args.version {
        println!("crazyones-monitor {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(EXIT_SUCCESS);
    }

    let _ = dotenvy::dotenv();

    if let Err(e) = config::ensure_data_dirs() {
        eprintln!("failed to create data directory: {e}");
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    init_logging();

    if args.log {
        print_last_log_lines(&config::log_file(), 100);
        std::process::exit(EXIT_SUCCESS);
    }

    let resolved = match resolve_config(&args) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let lock = match crazyones_core::instance_lock::acquire(&config::monitor_lock_file()) {
        Ok(lock) => lock,
        Err(e) => {
            tracing::error!(error = %e, "failed to acquire instance lock");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let exit_code = runtime.block_on(run(resolved, args.daemon, args.interval));
    drop(lock);
    std::process::exit(exit_code);
}

struct ResolvedConfig {
    index_url: String,
}

/// Resolves the effective configuration, highest precedence first:
/// CLI flag > `config.json` > environment variable > built-in default.
/// The token, if present from any source, is format-validated; an
/// invalid token is a configuration error.
fn resolve_config(args: &Args) -> Result<ResolvedConfig, String> {
    let file: FileConfig = config::load_file_config(&config::config_file())
        .map_err(|e| format!("failed to read config.json: {e}"))?;

    let token = args
        .token
        .clone()
        .or_else(|| file.telegram_bot_token.clone())
        .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok());

    if let Some(token) = &token {
        let pattern = Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex");
        if !pattern.is_match(token) {
            return Err("TELEGRAM_BOT_TOKEN does not match the expected format".to_string());
        }
    }

    let index_url = args
        .url
        .clone()
        .or(file.apple_updates_url)
        .or_else(|| std::env::var("APPLE_UPDATES_URL").ok())
        .unwrap_or_else(|| DEFAULT_APPLE_UPDATES_URL.to_string());

    Ok(ResolvedConfig { index_url })
}

async fn run(resolved: ResolvedConfig, daemon: bool, interval_secs: u64) -> i32 {
    let client = match reqwest::Client::builder().build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to build HTTP client");
            return EXIT_CONFIG_ERROR;
        }
    };

    let tick_config = TickConfig { data_dir: config::data_dir(), index_url: resolved.index_url };

    if !daemon {
        return match crazyones_monitor::tick::run_tick(&client, &tick_config).await {
            Ok(outcome) => {
                tracing::info!(?outcome, "single tick complete");
                EXIT_SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "tick failed");
                EXIT_NETWORK_ERROR
            }
        };
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let state = Arc::new(Mutex::new(SchedulerState::Idle));

    let scheduler_state = Arc::clone(&state);
    let scheduler_task = tokio::spawn(scheduler::run(
        client,
        tick_config,
        Duration::from_secs(interval_secs),
        shutdown_rx,
        scheduler_state,
    ));

    let interrupted = wait_for_shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(30);
    match tokio::time::timeout(grace, scheduler_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "scheduler exited with an error"),
        Ok(Err(e)) => tracing::error!(error = %e, "scheduler task panicked"),
        Err(_) => tracing::warn!("scheduler did not stop within the shutdown grace period"),
    }

    if interrupted {
        EXIT_INTERRUPTED
    } else {
        EXIT_SUCCESS
    }
}

/// Waits for SIGINT or SIGTERM, returning `true` once either arrives.
async fn wait_for_shutdown_signal() -> bool {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
    true
}

#[derive(Clone)]
struct SharedFile(Arc<Mutex<std::fs::File>>);

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log file mutex poisoned").write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().expect("log file mutex poisoned").flush()
    }
}

/// Initializes `tracing_subscriber` to emit to both stderr and the
/// rotating-free log file under the data directory, following
/// `commander-telegram::main`'s `EnvFilter` setup.
fn init_logging() {
    let path = config::log_file();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .unwrap_or_else(|e| panic!("failed to open log file {}: {e}", path.display()));
    let shared = SharedFile(Arc::new(Mutex::new(file)));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(move || shared.clone()))
        .init();
}

fn print_last_log_lines(path: &PathBuf, count: usize) {
    let mut contents = String::new();
    if std::fs::File::open(path).and_then(|mut f| f.read_to_string(&mut contents)).is_err() {
        println!("(no log file yet at {})", path.display());
        return;
    }
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(count);
    for line in &lines[start..] {
        println!("{line}");
    }
}
