use std::env;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metricsink_api::{handlers::AppState, ApiServer};
use metricsink_config::AppConfig;
use metricsink_core::{schedule_jobs, EtlPipeline, MetricsStore, Registry};
use metricsink_store::{MemoryMetricsStore, PgMetricsStore};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "metricsink")]
#[command(about = "Design metrics ETL service CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server and the recurring sync scheduler
    Serve {
        /// Path to configuration directory
        #[arg(short, long, default_value = "config")]
        config_dir: String,
    },

    /// Run the full pipeline once and exit
    Run {
        /// Path to configuration directory
        #[arg(short, long, default_value = "config")]
        config_dir: String,
    },
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let level = match config.logging.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level);
    if config.logging.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

async fn build_pipeline(config: &AppConfig) -> anyhow::Result<(Arc<EtlPipeline>, Arc<dyn MetricsStore>)> {
    // Pick the storage backend: configured database URL, then the
    // conventional env variable, else in-memory.
    let database_url = config
        .database
        .url
        .clone()
        .or_else(|| env::var("DATABASE_URL").ok());

    let store: Arc<dyn MetricsStore> = match database_url {
        Some(url) => {
            info!("Using PostgreSQL metrics store");
            Arc::new(PgMetricsStore::new(&url).await?)
        }
        None => {
            warn!("No database configured, using in-memory store; data will not survive restarts");
            Arc::new(MemoryMetricsStore::new())
        }
    };

    let mut registry = Registry::new(store.clone());
    metricsink_connectors::register_all(&mut registry);
    info!("Registered connectors: {:?}", registry.source_types());

    let pipeline = Arc::new(
        EtlPipeline::new(store.clone(), Arc::new(registry))
            .with_stage_timeout(Duration::from_secs(config.etl.stage_timeout_secs)),
    );

    Ok((pipeline, store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config_dir } => {
            let config = AppConfig::load(&config_dir)?;
            init_tracing(&config)?;

            info!("Starting metricsink with config directory: {}", config_dir);

            let (pipeline, store) = build_pipeline(&config).await?;

            // Kick off the recurring sync loop before serving traffic.
            let scheduler = config.etl.auto_start.then(|| {
                schedule_jobs(
                    pipeline.clone(),
                    Duration::from_secs(config.etl.sync_interval_minutes * 60),
                )
            });

            let state = AppState {
                pipeline: pipeline.clone(),
                store,
            };
            let server = ApiServer::new(
                config.api.host.clone(),
                config.api.port,
                config.api.cors_enabled,
                state,
            );

            info!(
                "API server available at http://{}:{}",
                config.api.host, config.api.port
            );

            tokio::select! {
                res = server.run() => {
                    if let Err(e) = res {
                        error!("API server error: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down metricsink...");
                }
            }

            if let Some(handle) = scheduler {
                handle.shutdown().await;
            }
        }

        Commands::Run { config_dir } => {
            let config = AppConfig::load(&config_dir)?;
            init_tracing(&config)?;

            let (pipeline, _store) = build_pipeline(&config).await?;

            let results = pipeline.run_full_pipeline().await?;
            let succeeded = results.iter().filter(|r| r.success).count();

            for result in &results {
                let marker = if result.success { "✓" } else { "✗" };
                match &result.error {
                    Some(error) => println!(
                        "{} {}: {} record(s), {}",
                        marker, result.connection_id, result.records_processed, error
                    ),
                    None => println!(
                        "{} {}: {} record(s)",
                        marker, result.connection_id, result.records_processed
                    ),
                }
            }
            println!("{succeeded} of {} connection(s) synced", results.len());
        }
    }

    Ok(())
}
