use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use navdb::core::config::Config;
use navdb::core::database::Database;
use navdb::core::error::Result;
use navdb::core::logging::init_tracing;
use navdb::repo::Tables;

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    match run(config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            eprintln!("navdb: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: PathBuf) -> Result<()> {
    let config = Config::load(&config_path)?;
    init_tracing(&config.log_filter);
    if config.debug {
        info!(config = ?config, "effective config");
    }

    let db = Arc::new(Database::open(config)?);
    let tables = Tables::new(db.clone());
    tables.ensure_all()?;

    let stats = db.stats();
    for (table, last) in &stats.id_counters {
        info!(table = %table, last_id = last, "id counter");
    }

    let health = db.health_check();
    for check in &health.checks {
        info!(check = %check.name, status = ?check.status, latency_ms = check.latency_ms, "health");
    }
    info!(
        status = ?health.status,
        cached_tables = stats.column_cache.size,
        "navdb ready"
    );
    Ok(())
}
