//! Account schema migrations.
//!
//! # Responsibility
//! - Keep the ordered list of `users` schema changes.
//! - Bring a connection up to the latest version in one transaction.
//!
//! # Invariants
//! - Versions start at 1 and increase by exactly one per step.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - `users.username` and `users.email` are `UNIQUE` from version 1 on;
//!   duplicate detection in the repository depends on it.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_users",
    sql: include_str!("0001_users.sql"),
}];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is ahead of this binary.
/// - `MigrationFailed` naming the first step that failed; nothing from the
///   batch is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        apply_one(&tx, migration)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, latest
    );
    Ok(())
}

fn apply_one(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    let result = tx.execute_batch(migration.sql).and_then(|()| {
        tx.pragma_update(None, "user_version", migration.version)
    });

    result.map_err(|source| {
        error!(
            "event=db_migrate module=db status=error version={} name={} error={}",
            migration.version, migration.name, source
        );
        DbError::MigrationFailed {
            version: migration.version,
            name: migration.name,
            source,
        }
    })
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, MIGRATIONS};

    #[test]
    fn versions_are_contiguous_from_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1, "{}", migration.name);
        }
        assert_eq!(latest_version() as usize, MIGRATIONS.len());
    }
}
