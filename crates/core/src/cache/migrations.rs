//! Schema for cache generations and saved preferences.
//!
//! 1. `generations` and their `entries`, keyed by generation label and the
//!    SHA-256 of the normalized URL; entries cascade when a generation is deleted
//! 2. `preferences`, a key/value table holding the saved theme
//!
//! Applied versions are recorded in `_migrations` so reopening a database
//! only runs what is new.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// (version, SQL) pairs in application order.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_generations.sql")),
    (2, include_str!("../../migrations/002_preferences.sql")),
];

/// Bring the cache schema up to the newest version.
///
/// Each pending version is applied and recorded in its own transaction.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose batch failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > applied) {
            tracing::debug!(version, "applying cache schema migration");
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tx.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_exists(conn: &Connection, name: &'static str) -> bool {
        conn.call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                params![name],
                |row| row.get(0),
            )
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        assert!(table_exists(&conn, "generations").await);
        assert!(table_exists(&conn, "entries").await);
        assert!(table_exists(&conn, "preferences").await);
    }

    #[tokio::test]
    async fn test_migrations_version_tracking() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let count: i64 = conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();

        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_only_pending_versions_applied() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE _migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL);
                 INSERT INTO _migrations (version, applied_at) VALUES (1, 'earlier');",
            )
        })
        .await
        .unwrap();

        run(&conn).await.unwrap();

        assert!(!table_exists(&conn, "generations").await);
        assert!(table_exists(&conn, "preferences").await);
    }
}
