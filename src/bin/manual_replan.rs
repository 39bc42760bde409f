// Small dev utility: run one full reminder replan pass against a local database.
//
// Usage:
//   cargo run --bin manual-replan -- [db_path]
//
// Defaults to the per-user data directory when no path is given. Planned
// entries are delivered through the no-op gateway, so this is safe to run
// against a production database copy.

use anyhow::anyhow;
use ce_compliance::config::ConfigManager;
use ce_compliance::db::{init_schema, open_sqlite_connection};
use ce_compliance::engine::{ComplianceRepositories, NoOpReminderGateway, ReplanOrchestrator};
use chrono::Local;
use std::sync::{Arc, Mutex};

fn default_db_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("ce-compliance").join("ce_compliance.db"))
        .and_then(|p| p.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "ce_compliance.db".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ce_compliance::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_db_path);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let config = Arc::new(
        ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow!(e.to_string()))?,
    );
    let repos = ComplianceRepositories::from_connection(conn);
    let gateway = Arc::new(NoOpReminderGateway);

    let orchestrator = ReplanOrchestrator::new(config, repos, gateway);
    let result = orchestrator
        .replan(Local::now().naive_local())
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    println!(
        "db={} relinked={} planned={} scheduled={} authorization={}",
        db_path,
        result.relinked_count,
        result.planned.len(),
        result.scheduled_count,
        result.authorization
    );
    Ok(())
}
