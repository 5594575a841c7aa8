use rusqlite::Connection;
use userdesk_core::db::migrations::latest_version;
use userdesk_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
}

#[test]
fn users_table_enforces_unique_username_and_email() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO users (username, password_hash, email) VALUES ('alice', 'h', 'a@x.com');",
        [],
    )
    .unwrap();

    let same_username = conn.execute(
        "INSERT INTO users (username, password_hash, email) VALUES ('alice', 'h', 'b@x.com');",
        [],
    );
    assert!(same_username.is_err());

    let same_email = conn.execute(
        "INSERT INTO users (username, password_hash, email) VALUES ('bob', 'h', 'a@x.com');",
        [],
    );
    assert!(same_email.is_err());
}

#[test]
fn ids_are_assigned_by_the_store() {
    let conn = open_db_in_memory().unwrap();
    for (username, email) in [("alice", "a@x.com"), ("bob", "b@x.com")] {
        conn.execute(
            "INSERT INTO users (username, password_hash, email) VALUES (?1, 'h', ?2);",
            [username, email],
        )
        .unwrap();
    }

    let ids: Vec<i64> = conn
        .prepare("SELECT id FROM users ORDER BY id;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("userdesk.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO users (username, password_hash, email) VALUES ('alice', 'h', 'a@x.com');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_migration_names_the_step_and_keeps_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocked.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE legacy (x TEXT); CREATE INDEX users ON legacy (x);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::MigrationFailed { version, name, .. } => {
            assert_eq!(version, 1);
            assert_eq!(name, "create_users");
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn opening_path_in_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_db(dir.path().join("missing").join("x.db")).unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
