//! `TaskZenith` task server.
//!
//! Serves projects and tasks over a JSON REST API for `taskzenith` clients.
//!
//! ```bash
//! # Empty store on 0.0.0.0:9100
//! cargo run --bin taskzenith-server
//!
//! # Seeded demo data on a custom address
//! cargo run --bin taskzenith-server -- --bind 127.0.0.1:8080 \
//!     --seed taskzenith-server/seed.example.json
//! ```

use std::sync::Arc;

use clap::Parser;
use taskzenith_server::config::{ServerCliArgs, ServerConfig};
use taskzenith_server::server;
use taskzenith_server::store::{Seed, TaskRepository};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let repo = match config.seed_file.as_deref() {
        Some(path) => match Seed::from_file(path) {
            Ok(seed) => {
                tracing::info!(
                    path = %path.display(),
                    projects = seed.projects.len(),
                    tasks = seed.tasks.len(),
                    "loaded seed"
                );
                TaskRepository::from_seed(seed)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load seed file");
                std::process::exit(1);
            }
        },
        None => TaskRepository::new(),
    };

    tracing::info!(addr = %config.bind_addr, "starting taskzenith server");

    match server::start_server(&config.bind_addr, Arc::new(repo), config.max_body_size).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task server");
            std::process::exit(1);
        }
    }
}
