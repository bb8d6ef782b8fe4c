//! Relational schema for the SQLite store.
//!
//! Versions are mirrored to `PRAGMA user_version` and applied in one
//! transaction. Versions must stay monotonic.

use rusqlite::Connection;

use crate::error::{StoreError, StoreResult};

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
        CREATE TABLE list (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT    NOT NULL UNIQUE,
            last_todo_id INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE todo (
            list_id   INTEGER NOT NULL REFERENCES list (id) ON DELETE CASCADE,
            id        INTEGER NOT NULL,
            name      TEXT    NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT 0,
            PRIMARY KEY (list_id, id)
        );
    "#,
}];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

pub fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let current = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();

    if current > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(version = migration.version, "applying schema migration");
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    Ok(())
}
