//! Conduit - VLESS share-link launcher for the Xray proxy engine.
//!
//! The CLI is the presentation layer over [`conduit_app::Launcher`]:
//! it submits a link (parse, generate config, record history), starts
//! the engine, echoes its output, and stops it on ctrl-c.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conduit_app::{Launcher, LauncherPaths};
use conduit_engine::LogSink;

/// Conduit - convert VLESS share-links and run the proxy engine
#[derive(Parser, Debug)]
#[command(name = "conduit", version, about)]
struct Args {
    /// Path to the proxy engine binary (default: `xray` from PATH)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Path for the generated engine config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path for the persisted link history file
    #[arg(long)]
    history: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert the link, record it in history, and run the engine
    Run {
        /// VLESS share-link
        link: String,
    },
    /// Convert the link to a config file without launching anything
    Convert {
        /// VLESS share-link
        link: String,

        /// Output file (default: the configured config path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print previously used links
    History,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "conduit", "Conduit").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with optional file rotation.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("conduit={},warn", log_level)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("conduit")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    None
}

/// Resolve launcher paths from defaults plus CLI overrides.
fn resolve_paths(args: &Args) -> anyhow::Result<LauncherPaths> {
    let mut paths = LauncherPaths::default_paths()?;
    if let Some(engine) = &args.engine {
        paths.engine = engine.clone();
    }
    if let Some(config) = &args.config {
        paths.config = config.clone();
    }
    if let Some(history) = &args.history {
        paths.history = history.clone();
    }
    Ok(paths)
}

/// Submit the link and run the engine until it exits or ctrl-c.
async fn run(launcher: &Launcher, link: &str) -> anyhow::Result<()> {
    let config_path = launcher.submit(link)?;

    // Engine output goes straight to stdout; println's internal lock
    // keeps lines from the two relay tasks intact.
    let sink: LogSink = Arc::new(|stream, line| println!("[{stream}] {line}"));

    let handle = launcher.start(&config_path, sink)?;
    let wait = handle.wait();
    tokio::pin!(wait);

    let status = tokio::select! {
        status = &mut wait => status?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-c received, stopping engine");
            launcher.stop();
            wait.await?
        }
    };

    if status.success() {
        tracing::info!("Engine exited cleanly");
    } else {
        tracing::warn!("Engine exited with {}", status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _log_guard = init_logging(&args);

    let paths = resolve_paths(&args)?;
    let launcher = Launcher::new(paths);

    match &args.command {
        Command::Run { link } => run(&launcher, link).await?,
        Command::Convert { link, output } => {
            let output = output
                .clone()
                .unwrap_or_else(|| launcher.paths().config.clone());
            launcher.convert(link, &output)?;
            println!("{}", output.display());
        }
        Command::History => {
            for link in launcher.history()? {
                println!("{link}");
            }
        }
    }

    Ok(())
}
