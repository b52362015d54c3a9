use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::PathBuf;
use tokio::fs;

use crate::config::DbConfig;

/// Create a SeaORM connection pool.
pub async fn create_orm_conn(database_url: &str, config: &DbConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(config.max_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    tracing::debug!(
        max_connections = config.max_connections,
        "database pool ready"
    );
    Ok(conn)
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        let sql = fs::read_to_string(&file).await?;
        // One command per prepared statement on Postgres.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() || is_comment_only(stmt) {
                continue;
            }
            conn.execute(Statement::from_string(backend, format!("{stmt};")))
                .await?;
        }
        tracing::info!(file = %file.display(), "migration applied");
    }

    Ok(())
}

fn is_comment_only(stmt: &str) -> bool {
    stmt.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::is_comment_only;

    #[test]
    fn trailing_comment_blocks_are_skipped() {
        assert!(is_comment_only("-- done\n\n"));
        assert!(!is_comment_only("-- users\nCREATE TABLE users (id UUID)"));
    }
}
