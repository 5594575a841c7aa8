//! Account repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide count/insert/lookup APIs over the `users` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `create_account` runs its existence checks and insert atomically: in a
//!   `BEGIN IMMEDIATE` transaction on an idle connection, or in a savepoint
//!   nested in the caller's open transaction.
//! - A `UNIQUE` constraint failure on insert is the authoritative duplicate
//!   signal, even when a pre-check passed.
//! - `password_hash` is returned exactly as stored; judging it is the
//!   hasher's job.

use crate::db::DbError;
use crate::model::account::{Account, AccountId};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    username,
    password_hash,
    email
FROM users";

pub type RepoResult<T> = Result<T, RepoError>;

/// Column carrying a uniqueness constraint in `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
        }
    }
}

/// Repository error for account persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Duplicate(UniqueField),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Duplicate(field) => write!(f, "account with this {} already exists", field.column()),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for account persistence.
pub trait AccountRepository {
    /// Counts accounts whose `field` equals `value` exactly.
    fn count_by(&self, field: UniqueField, value: &str) -> RepoResult<u64>;
    /// Inserts one row without pre-checks; relies on `UNIQUE` constraints.
    fn insert_account(&self, username: &str, password_hash: &str, email: &str)
        -> RepoResult<AccountId>;
    /// Checks both unique fields and inserts atomically.
    ///
    /// Username is checked before email, so a request colliding on both
    /// reports `Duplicate(UniqueField::Username)`. When the connection is
    /// already inside a transaction the write joins it and becomes durable
    /// only when the caller commits.
    fn create_account(&self, username: &str, password_hash: &str, email: &str)
        -> RepoResult<AccountId>;
    /// Gets one account by exact username match.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>>;
    /// Returns the total number of persisted accounts.
    fn count_accounts(&self) -> RepoResult<u64>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - Returns `MissingRequiredTable`/`MissingRequiredColumn` when the
    ///   `users` schema is absent or incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_account_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn count_by(&self, field: UniqueField, value: &str) -> RepoResult<u64> {
        count_where(self.conn, field, value)
    }

    fn insert_account(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> RepoResult<AccountId> {
        insert_row(self.conn, username, password_hash, email)
    }

    fn create_account(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> RepoResult<AccountId> {
        if !self.conn.is_autocommit() {
            return create_in_savepoint(self.conn, username, password_hash, email);
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = check_and_insert(&tx, username, password_hash, email)?;
        tx.commit()?;
        Ok(id)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE username = ?1;"))?;

        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }

        Ok(None)
    }

    fn count_accounts(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        count_to_u64(count)
    }
}

fn create_in_savepoint(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    email: &str,
) -> RepoResult<AccountId> {
    conn.execute_batch("SAVEPOINT create_account;")?;
    match check_and_insert(conn, username, password_hash, email) {
        Ok(id) => {
            conn.execute_batch("RELEASE create_account;")?;
            Ok(id)
        }
        Err(err) => {
            conn.execute_batch("ROLLBACK TO create_account; RELEASE create_account;")?;
            Err(err)
        }
    }
}

fn check_and_insert(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    email: &str,
) -> RepoResult<AccountId> {
    if count_where(conn, UniqueField::Username, username)? > 0 {
        return Err(RepoError::Duplicate(UniqueField::Username));
    }
    if count_where(conn, UniqueField::Email, email)? > 0 {
        return Err(RepoError::Duplicate(UniqueField::Email));
    }
    insert_row(conn, username, password_hash, email)
}

fn count_where(conn: &Connection, field: UniqueField, value: &str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users WHERE {} = ?1;", field.column()),
        [value],
        |row| row.get(0),
    )?;
    count_to_u64(count)
}

fn insert_row(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    email: &str,
) -> RepoResult<AccountId> {
    conn.execute(
        "INSERT INTO users (username, password_hash, email) VALUES (?1, ?2, ?3);",
        params![username, password_hash, email],
    )
    .map_err(map_insert_error)?;

    Ok(conn.last_insert_rowid())
}

fn map_insert_error(err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            // SQLite reports the failing column as `users.<column>`.
            for field in [UniqueField::Username, UniqueField::Email] {
                if message.contains(&format!("users.{}", field.column())) {
                    return RepoError::Duplicate(field);
                }
            }
        }
    }
    err.into()
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    Ok(Account {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        email: row.get("email")?,
    })
}

fn count_to_u64(count: i64) -> RepoResult<u64> {
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
}

fn ensure_account_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "users")? {
        return Err(RepoError::MissingRequiredTable("users"));
    }

    for column in ["id", "username", "password_hash", "email"] {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
