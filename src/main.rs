use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use clap::Parser;
use dataset_cleaner::{
    config::CleanerConfig,
    db::DbPool,
    index::IndexProcessorFactory,
    jobs::{
        CleanupError, CleanupQueue, CleanupReport, DatasetCleanupJob, QueueError, start_worker,
    },
    models::CleanDatasetTask,
    observability,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// CLI arguments for the dataset cleaner
#[derive(Parser, Debug)]
#[command(version, about = "Dataset cleanup worker", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short, long, global = true, default_value = "dataset-cleaner.toml")]
    config: PathBuf,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Clean up a single deleted dataset
    Clean {
        #[arg(long)]
        dataset_id: Uuid,
        #[arg(long)]
        tenant_id: Uuid,
        /// "high_quality" or "economy"; other values skip vector cleanup
        #[arg(long)]
        indexing_technique: Option<String>,
        /// Serialized index structure JSON
        #[arg(long)]
        index_struct: Option<String>,
        #[arg(long)]
        collection_binding_id: Option<Uuid>,
        /// Document form tag (text_model, qa_model, hierarchical_model)
        #[arg(long)]
        doc_form: String,
    },
    /// Run queued cleanup tasks, read as JSON lines from stdin
    Work,
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config = load_config(&args.config);

    if let Err(e) = observability::init_tracing(&config.observability.logging) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = observability::metrics::init_metrics(&config.observability.metrics) {
        tracing::error!(error = %e, "Failed to initialize metrics");
        std::process::exit(1);
    }

    let code = match args.command {
        Command::Clean {
            dataset_id,
            tenant_id,
            indexing_technique,
            index_struct,
            collection_binding_id,
            doc_form,
        } => {
            let task = CleanDatasetTask {
                dataset_id,
                tenant_id,
                indexing_technique,
                index_struct,
                collection_binding_id,
                doc_form,
            };
            run_clean(&config, task).await
        }
        Command::Work => {
            run_work(&config).await;
            ExitCode::SUCCESS
        }
        Command::Migrate => {
            run_migrate(&config).await;
            ExitCode::SUCCESS
        }
    };

    #[cfg(feature = "prometheus")]
    {
        if let Some(handle) = observability::metrics::get_prometheus_handle() {
            tracing::debug!(metrics = %handle.render(), "Final metrics snapshot");
        }
    }

    code
}

fn load_config(path: &Path) -> CleanerConfig {
    match CleanerConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Connect to the database, running migrations when configured.
async fn connect(config: &CleanerConfig) -> DbPool {
    if config.database.is_none() {
        eprintln!("Error: Database is not configured.");
        std::process::exit(1);
    }

    let db = match DbPool::from_config(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = db.health_check().await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }

    if config.database.run_migrations()
        && let Err(e) = db.run_migrations().await
    {
        tracing::error!(error = %e, "Database migrations failed");
        std::process::exit(1);
    }

    db
}

async fn build_job(config: &CleanerConfig) -> Arc<DatasetCleanupJob> {
    let db = connect(config).await;
    let processors = match IndexProcessorFactory::from_config(&config.index, &db).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize index backends");
            std::process::exit(1);
        }
    };
    Arc::new(DatasetCleanupJob::new(&db, Arc::new(processors)))
}

async fn run_clean(config: &CleanerConfig, task: CleanDatasetTask) -> ExitCode {
    let job = build_job(config).await;
    clean_exit_code(&job.execute(&task).await)
}

/// The job has already logged and counted a failure; only the status is left.
fn clean_exit_code(result: &Result<CleanupReport, CleanupError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run_work(config: &CleanerConfig) {
    let job = build_job(config).await;
    let (queue, receiver) = CleanupQueue::new(config.worker.queue_capacity);
    let cancel = CancellationToken::new();
    let worker = start_worker(receiver, job, cancel.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match queue.enqueue_json(&line) {
                    Ok(()) | Err(QueueError::Malformed(_)) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to enqueue cleanup task");
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read cleanup tasks from stdin");
                    break;
                }
            },
        }
    }

    cancel.cancel();
    drop(queue);
    let timeout = config.worker.shutdown_timeout();
    if tokio::time::timeout(timeout, worker).await.is_err() {
        tracing::warn!(
            timeout_secs = timeout.as_secs(),
            "Cleanup worker did not drain in time"
        );
    }
}

async fn run_migrate(config: &CleanerConfig) {
    if config.database.is_none() {
        eprintln!("Error: Database is not configured. Nothing to migrate.");
        std::process::exit(1);
    }

    let pool = match DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            eprintln!("Error: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    match pool.run_migrations().await {
        Ok(()) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!(error = %e, "Database migrations failed");
            eprintln!("Error: Database migrations failed: {}", e);
            std::process::exit(1);
        }
    }
}
