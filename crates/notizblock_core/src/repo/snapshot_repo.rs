//! Snapshot slot repository contract with SQLite and in-memory backends.
//!
//! # Responsibility
//! - Read and overwrite one serialized board per slot key.
//! - Verify the slot table exists before handing out a SQLite repository.
//!
//! # Invariants
//! - `write_slot` is an upsert; at most one row exists per key.
//! - Repositories never interpret slot contents.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage failure for slot reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Serialization(serde_json::Error),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "snapshot serialization failed: {err}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::MissingRequiredTable(_) => None,
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

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durable key/value slot used to persist serialized boards.
pub trait SnapshotRepository {
    /// Returns the raw value stored under `key`, if any.
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()>;
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for &R {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).write_slot(key, value)
    }
}

/// SQLite-backed slot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Constructs a repository over a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when `kv_slots` does not exist.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'kv_slots'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable("kv_slots"));
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local slot repository for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotRepository {
    slots: RefCell<HashMap<String, String>>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a slot directly, bypassing any serialization.
    pub fn with_slot(key: impl Into<String>, value: impl Into<String>) -> Self {
        let repo = Self::default();
        repo.slots.borrow_mut().insert(key.into(), value.into());
        repo
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySnapshotRepository, RepoError, SnapshotRepository, SqliteSnapshotRepository};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn sqlite_write_slot_overwrites_previous_value() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

        assert_eq!(repo.read_slot("board").unwrap(), None);
        repo.write_slot("board", "first").unwrap();
        repo.write_slot("board", "second").unwrap();
        assert_eq!(repo.read_slot("board").unwrap().as_deref(), Some("second"));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_slots;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn sqlite_try_new_requires_slot_table() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteSnapshotRepository::try_new(&conn)
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(err, RepoError::MissingRequiredTable("kv_slots")));
    }

    #[test]
    fn memory_slots_are_independent_per_key() {
        let repo = MemorySnapshotRepository::with_slot("a", "1");
        repo.write_slot("b", "2").unwrap();
        assert_eq!(repo.read_slot("a").unwrap().as_deref(), Some("1"));
        assert_eq!(repo.read_slot("b").unwrap().as_deref(), Some("2"));
        assert_eq!(repo.read_slot("c").unwrap(), None);
    }
}
