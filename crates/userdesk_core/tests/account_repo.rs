use rusqlite::Connection;
use userdesk_core::db::open_db_in_memory;
use userdesk_core::{AccountRepository, RepoError, SqliteAccountRepository, UniqueField};

#[test]
fn create_and_find_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    let id = repo
        .create_account("alice", "$argon2id$stub", "alice@x.com")
        .unwrap();

    let loaded = repo.find_by_username("alice").unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.username, "alice");
    assert_eq!(loaded.password_hash, "$argon2id$stub");
    assert_eq!(loaded.email, "alice@x.com");
    assert_eq!(repo.count_accounts().unwrap(), 1);
}

#[test]
fn find_is_exact_match() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();
    repo.create_account("alice", "h", "alice@x.com").unwrap();

    assert!(repo.find_by_username("Alice").unwrap().is_none());
    assert!(repo.find_by_username("alice ").unwrap().is_none());
    assert!(repo.find_by_username("ali%").unwrap().is_none());
}

#[test]
fn count_by_reports_each_unique_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();
    repo.create_account("alice", "h", "alice@x.com").unwrap();

    assert_eq!(repo.count_by(UniqueField::Username, "alice").unwrap(), 1);
    assert_eq!(repo.count_by(UniqueField::Username, "bob").unwrap(), 0);
    assert_eq!(repo.count_by(UniqueField::Email, "alice@x.com").unwrap(), 1);
    assert_eq!(repo.count_by(UniqueField::Email, "bob@x.com").unwrap(), 0);
}

#[test]
fn create_rejects_duplicates_without_mutation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();
    repo.create_account("alice", "h", "alice@x.com").unwrap();

    let err = repo
        .create_account("alice", "h2", "alice2@x.com")
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UniqueField::Username)));

    let err = repo.create_account("bob", "h2", "alice@x.com").unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UniqueField::Email)));

    let err = repo.create_account("alice", "h2", "alice@x.com").unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UniqueField::Username)));

    assert_eq!(repo.count_accounts().unwrap(), 1);
    assert!(conn.is_autocommit());
}

#[test]
fn unique_constraint_is_authoritative_without_pre_check() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();
    repo.insert_account("alice", "h", "alice@x.com").unwrap();

    let err = repo
        .insert_account("alice", "h", "other@x.com")
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UniqueField::Username)));

    let err = repo.insert_account("bob", "h", "alice@x.com").unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UniqueField::Email)));

    assert_eq!(repo.count_accounts().unwrap(), 1);
}

#[test]
fn create_joins_callers_open_transaction() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();

    conn.execute_batch("BEGIN;").unwrap();
    repo.create_account("alice", "h", "alice@x.com").unwrap();
    let err = repo.create_account("alice", "h", "other@x.com").unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UniqueField::Username)));
    assert!(!conn.is_autocommit());
    repo.create_account("bob", "h", "bob@x.com").unwrap();
    conn.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(repo.count_accounts().unwrap(), 0);

    conn.execute_batch("BEGIN;").unwrap();
    repo.create_account("alice", "h", "alice@x.com").unwrap();
    conn.execute_batch("COMMIT;").unwrap();
    assert_eq!(repo.count_accounts().unwrap(), 1);
    assert!(repo.find_by_username("alice").unwrap().is_some());
}

#[test]
fn try_new_rejects_connection_without_users_table() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteAccountRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("users")));
}

#[test]
fn try_new_rejects_users_table_missing_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT, email TEXT);",
    )
    .unwrap();

    let err = SqliteAccountRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::MissingRequiredColumn {
            table: "users",
            column: "password_hash",
        }
    ));
}

#[test]
fn stored_hash_is_returned_verbatim_even_when_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::try_new(&conn).unwrap();
    repo.insert_account("alice", "", "alice@x.com").unwrap();

    let loaded = repo.find_by_username("alice").unwrap().unwrap();
    assert_eq!(loaded.password_hash, "");
}
