//! Prioritizer - deadline-based task prioritization service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use prioritizer::{
    config::Args,
    db::MongoClient,
    logging::{self, PriorityAuditLogger},
    server,
    tasks::{InMemoryTaskRepository, MongoTaskRepository, TaskRepository, TaskService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init_tracing(&args.log_level, args.json_logs());

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    let thresholds = args.thresholds()?;

    info!("======================================");
    info!("  Prioritizer - task deadline triage");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db '{}', collection '{}')", args.mongodb_uri, args.mongodb_db, args.tasks_collection);
    info!(
        "Thresholds: HIGH < {}h, MEDIUM < {}h",
        thresholds.high_within.num_hours(),
        thresholds.medium_within.num_hours()
    );
    info!("======================================");

    // Connect to MongoDB (in-memory fallback in dev mode)
    let mongo_repo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => MongoTaskRepository::new(client, &args.tasks_collection)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    let (repo, backend): (Arc<dyn TaskRepository>, &'static str) = match mongo_repo {
        Ok(repo) => {
            info!("MongoDB connected successfully");
            (Arc::new(repo), "mongodb")
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB unavailable (dev mode, using in-memory store): {}", e);
                (Arc::new(InMemoryTaskRepository::new()), "memory")
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let mut tasks = TaskService::new(repo, thresholds);

    if let Some(ref path) = args.audit_log {
        let audit = PriorityAuditLogger::new(args.node_id.to_string());
        audit.init_file(path).await?;
        tasks = tasks.with_audit(audit);
    }

    let state = Arc::new(server::AppState::new(args, tasks, backend));
    server::run(state).await?;

    Ok(())
}
