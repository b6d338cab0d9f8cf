//! Embedded schema steps for the record store.
//!
//! Each step is a numbered SQL file compiled in with `include_str!` and
//! applied once inside its own transaction. The highest applied step is
//! recorded in `schema_version`.

use std::path::PathBuf;

use rusqlite::Connection;

use crate::db::DbError;

/// Schema steps, oldest first.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("migrations/001_baseline.sql"))];

fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map(|(v, _)| *v).unwrap_or(0)
}

/// Highest recorded step, creating the version table on first open.
fn applied_version(conn: &Connection) -> Result<u32, DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?)
}

/// Copy the database file to `<path>.v<version>.bak` before it is upgraded.
///
/// Returns `None` for in-memory databases, which have nothing to copy.
fn snapshot(conn: &Connection, version: u32) -> Result<Option<PathBuf>, DbError> {
    let Some(path) = conn.path().filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let target = PathBuf::from(format!("{path}.v{version}.bak"));
    let fail = |e: rusqlite::Error| {
        DbError::Migration(format!(
            "could not snapshot schema v{version} to {}: {e}",
            target.display()
        ))
    };

    let mut dest = Connection::open(&target).map_err(fail)?;
    rusqlite::backup::Backup::new(conn, &mut dest)
        .and_then(|backup| backup.step(-1))
        .map_err(fail)?;
    Ok(Some(target))
}

/// Bring the schema up to date and return how many steps were applied.
///
/// A database stamped with a step this build does not know is refused, so
/// an older binary never writes into a newer layout.
pub fn run_migrations(conn: &Connection) -> Result<usize, DbError> {
    let current = applied_version(conn)?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::Migration(format!(
            "record store is at schema v{current}, newer than v{latest} known to this build"
        )));
    }

    let pending: Vec<&(u32, &str)> = SCHEMA_STEPS.iter().filter(|(v, _)| *v > current).collect();
    if pending.is_empty() {
        return Ok(0);
    }

    if current > 0 {
        if let Some(path) = snapshot(conn, current)? {
            log::info!("Record store snapshot written to {}", path.display());
        }
    }

    for (version, sql) in &pending {
        let step_failed =
            |e: rusqlite::Error| DbError::Migration(format!("schema v{version} not applied: {e}"));
        let tx = conn.unchecked_transaction().map_err(step_failed)?;
        tx.execute_batch(sql).map_err(step_failed)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
            .map_err(step_failed)?;
        tx.commit().map_err(step_failed)?;
        log::info!("Record store schema at v{}", version);
    }

    Ok(pending.len())
}
