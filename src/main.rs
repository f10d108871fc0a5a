use log::{error, info};

mod config;
mod core;
mod storage;
mod web;

use crate::config::Config;
use crate::storage::{Database, Repository};
use crate::web::server::start_web_server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    info!("Starting Mensable...");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let repo = match Database::open(&config.database_path) {
        Ok(db) => Repository::new(db),
        Err(e) => {
            error!("Failed to open database {}: {}", config.database_path, e);
            std::process::exit(1);
        }
    };
    info!("Database ready at {}", config.database_path);

    start_web_server(config, repo).await?;

    info!("Mensable shutdown complete");
    Ok(())
}
