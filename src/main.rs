use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hikyaku::config::Config;
use hikyaku::http::{ConnectivityFlag, ReqwestNetwork};
use hikyaku::queue::{QueueStore, TokioFsBackend};
use hikyaku::sync::{SyncCoordinator, SyncOutcome};
use hikyaku::ServiceWorker;
use std::path::PathBuf;
use std::sync::Arc;

/// Hikyaku - offline request cache and background sync worker
#[derive(Parser, Debug)]
#[command(name = "hikyaku")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and exit
    Check,
    /// List writes waiting in the durable queue
    Queue,
    /// Replay the durable queue against the origin once
    Sync {
        /// Print prometheus metrics after the replay
        #[arg(long)]
        metrics: bool,
    },
    /// Dry run: install and activate against the origin into in-memory
    /// storage and report what would be cached; nothing is persisted
    Prewarm {
        /// Print prometheus metrics after the report
        #[arg(long)]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;

    hikyaku::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging subsystem")?;

    tracing::info!(
        config_file = %args.config.display(),
        origin = %config.network.origin,
        generation = %config.cache.current_generation(),
        queue_dir = %config.queue.dir,
        api_patterns = config.cache.api_patterns.len(),
        "Configuration loaded successfully"
    );

    match args.command {
        Command::Check => {
            println!("Configuration OK");
        }
        Command::Queue => {
            let store = queue_store(&config);
            let entries = store.drain_all().await.context("Failed to read queue")?;
            for entry in &entries {
                println!(
                    "{}\t{}\t{}\t{}\tattempts={}",
                    entry.id,
                    entry.enqueued_at(),
                    entry.method,
                    entry.url,
                    entry.attempts
                );
            }
            println!("{} pending", entries.len());
        }
        Command::Sync { metrics } => {
            let network = Arc::new(
                ReqwestNetwork::from_config(&config.network).context("Failed to build client")?,
            );
            let sync = SyncCoordinator::from_config(
                &config.sync,
                Arc::new(queue_store(&config)),
                network,
            );
            match sync.sync_pending_requests().await.context("Sync failed")? {
                SyncOutcome::Completed(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                SyncOutcome::Coalesced => println!("Sync already in progress"),
            }
            if metrics {
                print!("{}", hikyaku::metrics::gather_text());
            }
        }
        Command::Prewarm { metrics } => {
            let worker = ServiceWorker::from_config(config, Arc::new(ConnectivityFlag::default()))
                .context("Failed to build worker")?;
            let report = worker.start().await.context("Failed to start worker")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if let Some(summary) = worker
                .cache_summary()
                .await
                .context("Failed to summarize cache")?
            {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            worker.shutdown().await;
            if metrics {
                print!("{}", hikyaku::metrics::gather_text());
            }
        }
    }

    Ok(())
}

fn queue_store(config: &Config) -> QueueStore {
    QueueStore::new(
        Arc::new(TokioFsBackend::new()),
        &config.queue.dir,
        &config.queue.store_name,
    )
}
