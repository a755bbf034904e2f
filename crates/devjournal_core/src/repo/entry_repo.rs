//! Entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the synchronous CRUD and range primitives over `entries`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `put` is an upsert keyed by `id` and is a single statement.
//! - `put_many` issues one statement per row; earlier rows stay written when
//!   a later row fails.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::entry::{EntryId, JournalEntry};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    date,
    main_entry,
    sub_entries,
    timestamp,
    imported
FROM entries";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
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

/// Aggregated result of a best-effort multi-row write.
#[derive(Debug, Default)]
pub struct BatchWriteReport {
    /// Keys written successfully, in input order.
    pub written: Vec<EntryId>,
    /// Rows that failed, with the failure message.
    pub failures: Vec<(EntryId, String)>,
}

impl BatchWriteReport {
    pub fn written_count(&self) -> usize {
        self.written.len()
    }

    /// A batch counts as successful only when every row was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Repository interface for journal entry storage.
pub trait EntryRepository {
    fn put(&self, entry: &JournalEntry) -> RepoResult<EntryId>;
    fn put_many(&self, entries: &[JournalEntry]) -> BatchWriteReport;
    fn delete(&self, id: &EntryId) -> RepoResult<()>;
    fn get_by_id(&self, id: &EntryId) -> RepoResult<Option<JournalEntry>>;
    fn list_all(&self) -> RepoResult<Vec<JournalEntry>>;
    fn list_by_date_range(&self, start: &str, end: &str) -> RepoResult<Vec<JournalEntry>>;
    fn count(&self) -> RepoResult<u64>;
    fn clear_all(&self) -> RepoResult<()>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Wraps a connection that already went through `db::open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn put(&self, entry: &JournalEntry) -> RepoResult<EntryId> {
        let sub_entries = entry
            .sub_entries
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| RepoError::InvalidData(format!("sub_entries encoding: {err}")))?;

        self.conn.execute(
            "INSERT INTO entries (
                id,
                date,
                main_entry,
                sub_entries,
                timestamp,
                imported
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                date = excluded.date,
                main_entry = excluded.main_entry,
                sub_entries = excluded.sub_entries,
                timestamp = excluded.timestamp,
                imported = excluded.imported;",
            params![
                entry.id.as_str(),
                entry.date.as_str(),
                entry.main_entry.as_str(),
                sub_entries,
                entry.timestamp.as_str(),
                entry.imported,
            ],
        )?;

        Ok(entry.id.clone())
    }

    fn put_many(&self, entries: &[JournalEntry]) -> BatchWriteReport {
        let mut report = BatchWriteReport::default();
        for entry in entries {
            match self.put(entry) {
                Ok(id) => report.written.push(id),
                Err(err) => report.failures.push((entry.id.clone(), err.to_string())),
            }
        }
        report
    }

    fn delete(&self, id: &EntryId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM entries WHERE id = ?1;", [id.as_str()])?;
        Ok(())
    }

    fn get_by_id(&self, id: &EntryId) -> RepoResult<Option<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.as_str()], |row| Ok(parse_entry_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_all(&self) -> RepoResult<Vec<JournalEntry>> {
        self.query_entries(&format!("{ENTRY_SELECT_SQL};"), [])
    }

    fn list_by_date_range(&self, start: &str, end: &str) -> RepoResult<Vec<JournalEntry>> {
        if start > end {
            return Ok(Vec::new());
        }
        self.query_entries(
            &format!("{ENTRY_SELECT_SQL} WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, id ASC;"),
            params![start, end],
        )
    }

    fn count(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get::<_, i64>(0))?;
        u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("row count {count}")))
    }

    fn clear_all(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM entries;", [])?;
        Ok(())
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<JournalEntry> {
    let id: String = row.get("id")?;

    let sub_entries = match row.get::<_, Option<String>>("sub_entries")? {
        Some(raw) => Some(serde_json::from_str::<Vec<String>>(&raw).map_err(|_| {
            RepoError::InvalidData(format!("invalid sub_entries for entry `{id}`"))
        })?),
        None => None,
    };

    let imported = match row.get::<_, i64>("imported")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid imported value `{other}` for entry `{id}`"
            )));
        }
    };

    Ok(JournalEntry {
        id: EntryId::from(id),
        date: row.get("date")?,
        main_entry: row.get("main_entry")?,
        sub_entries,
        timestamp: row.get("timestamp")?,
        imported,
    })
}
