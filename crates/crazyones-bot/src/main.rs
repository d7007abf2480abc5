//! CrazyOnes bot binary: CLI entrypoint, configuration resolution,
//! single-instance enforcement, and signal-driven shutdown, mirroring
//! `crazyones-monitor::main` exactly (spec §6, §7).

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crazyones_bot::bot;
use crazyones_bot::state::BotState;
use crazyones_core::config::{self, FileConfig};
use regex::Regex;
use teloxide::prelude::*;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const TOKEN_PATTERN: &str = r"^[0-9]{8,10}:[A-Za-z0-9_-]{35,}$";

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG_ERROR: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "crazyones-bot")]
#[command(about = "Telegram front-end for CrazyOnes: subscriptions, /updates, and trigger fan-out")]
struct Args {
    /// Telegram bot token; overrides config.json and the environment.
    #[arg(long)]
    token: Option<String>,

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
        println!("crazyones-bot {}", env!("CARGO_PKG_VERSION"));
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

    let token = match resolve_token(&args) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let lock = match crazyones_core::instance_lock::acquire(&config::bot_lock_file()) {
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

    let exit_code = runtime.block_on(run(token));
    drop(lock);
    std::process::exit(exit_code);
}

/// Resolves the bot token, highest precedence first: CLI flag >
/// `config.json` > environment variable. A token from any source is
/// format-validated; a missing or malformed token is a configuration
/// error, matching the monitor's token-resolution contract.
fn resolve_token(args: &Args) -> Result<String, String> {
    let file: FileConfig = config::load_file_config(&config::config_file())
        .map_err(|e| format!("failed to read config.json: {e}"))?;

    let token = args
        .token
        .clone()
        .or(file.telegram_bot_token)
        .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
        .ok_or_else(|| "Telegram bot token not set. Set TELEGRAM_BOT_TOKEN, pass --token, or set it in config.json.".to_string())?;

    let pattern = Regex::new(TOKEN_PATTERN).expect("token pattern is a valid regex");
    if !pattern.is_match(&token) {
        return Err("TELEGRAM_BOT_TOKEN does not match the expected format".to_string());
    }

    Ok(token)
}

async fn run(token: String) -> i32 {
    let translations = match crazyones_core::translation::load_catalog(&config::translations_dir()) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "failed to load translation catalog");
            return EXIT_CONFIG_ERROR;
        }
    };

    let state = Arc::new(BotState::new(config::data_dir(), translations));
    let bot = Bot::new(token);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let dispatch_state = Arc::clone(&state);
    let dispatch_bot = bot.clone();
    let dispatch_shutdown = shutdown_rx.clone();
    let dispatch_task = tokio::spawn(async move {
        bot::run_polling(dispatch_bot, dispatch_state, dispatch_shutdown).await;
    });

    let interrupted = wait_for_shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(30);
    match tokio::time::timeout(grace, dispatch_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "dispatcher task panicked"),
        Err(_) => tracing::warn!("dispatcher did not stop within the shutdown grace period"),
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

/// Initializes `tracing_subscriber` to emit to both stderr and the log
/// file under the data directory, identical to the monitor's setup.
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
