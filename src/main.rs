use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use restock_watcher::web::{self, AppState};
use restock_watcher::{AppConfig, ItemScheduler, SnapshotWriter, StateStore, StockChecker};

#[derive(Parser)]
#[command(name = "restock-watcher", version, about = "Watch retail stores for items coming back in stock")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write daily-rotated logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the whole watchlist once and print the results
    Once(RunArgs),
    /// Poll every item on its own jittered interval until interrupted
    Run(RunArgs),
    /// Serve the read-only status API
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log alerts instead of delivering them
    #[arg(long)]
    dry_run: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,
}

fn init_tracing(verbose: bool, log_dir: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("restock_watcher={}", level)));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "restock-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

fn load_config(path: &PathBuf, headed: bool) -> Result<AppConfig> {
    let mut config = AppConfig::from_file(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    if headed {
        config.scraper.headless = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_dir.as_ref())?;

    match cli.command {
        Command::Once(args) => {
            let config = load_config(&args.config, args.headed)?;
            let checker = StockChecker::from_config(config, args.dry_run).await?;

            let records = checker.run_once().await?;
            for record in &records {
                println!(
                    "{} | {} | {} | {}",
                    record.retailer, record.label, record.store_name, record.status
                );
            }
            checker.state().close().await;
        }
        Command::Run(args) => {
            let config = load_config(&args.config, args.headed)?;
            let interval = config.poll_interval();
            let checker = Arc::new(StockChecker::from_config(config, args.dry_run).await?);

            let mut scheduler = ItemScheduler::new(checker.clone(), checker.watchlist().to_vec(), interval);
            scheduler
                .run_until(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutdown requested");
                })
                .await;
            checker.state().close().await;
        }
        Command::Serve { config } => {
            let config = load_config(&config, false)?;
            let state = Arc::new(StateStore::open(&config.state_db).await?);
            let app_state = AppState::new(Arc::clone(&state), SnapshotWriter::new(&config.status_json));

            web::serve(&config.server, app_state).await?;
            state.close().await;
        }
    }

    info!("Shutting down...");
    Ok(())
}
