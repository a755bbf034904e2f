//! Async record store over the SQLite entry repository.
//!
//! # Responsibility
//! - Own the single connection handle for a journal database.
//! - Run every repository call on the blocking pool so async callers never
//!   block their executor thread.
//!
//! # Invariants
//! - `init` opens the connection at most once; later calls reuse it.
//! - Every operation initializes lazily, so `init` is optional for callers.
//! - The connection mutex is held for exactly one repository call.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::entry::{EntryId, JournalEntry};
use crate::repo::entry_repo::{BatchWriteReport, EntryRepository, RepoError, SqliteEntryRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    /// Engine could not be opened or the schema is unsupported.
    Unavailable(DbError),
    /// A statement failed or persisted data is invalid.
    Repo(RepoError),
    /// A previous operation panicked while holding the connection.
    Poisoned,
    /// The blocking task could not be joined.
    Task(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "journal store unavailable: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "journal store connection is poisoned"),
            Self::Task(message) => write!(f, "journal store task failed: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Poisoned | Self::Task(_) => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

type SharedConnection = Arc<Mutex<Connection>>;

/// Explicitly constructed journal store.
///
/// Dropping the store closes its connection.
pub struct JournalStore {
    location: StoreLocation,
    conn: OnceCell<SharedConnection>,
}

impl JournalStore {
    /// Store backed by a database file, created on first `init`.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::new(StoreLocation::File(path.as_ref().to_path_buf()))
    }

    /// Store backed by a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            conn: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Returns whether a connection is already open.
    pub fn is_initialized(&self) -> bool {
        self.conn.initialized()
    }

    /// Opens the database and applies the schema if needed.
    ///
    /// # Errors
    /// - `StoreError::Unavailable` when the file cannot be opened or the
    ///   schema version is newer than this binary supports.
    pub async fn init(&self) -> StoreResult<()> {
        self.connection().await.map(|_| ())
    }

    /// Returns every entry. Ordering is left to the caller.
    pub async fn get_all(&self) -> StoreResult<Vec<JournalEntry>> {
        self.run("get_all", |repo| repo.list_all()).await
    }

    /// Inserts or fully replaces the row keyed by `entry.id`.
    pub async fn put(&self, entry: &JournalEntry) -> StoreResult<EntryId> {
        let entry = entry.clone();
        self.run("put", move |repo| repo.put(&entry)).await
    }

    /// Writes every entry as its own atomic statement.
    ///
    /// A failed row does not roll back earlier rows; check
    /// [`BatchWriteReport::is_complete`].
    pub async fn put_many(&self, entries: &[JournalEntry]) -> StoreResult<BatchWriteReport> {
        if entries.is_empty() {
            return Ok(BatchWriteReport::default());
        }
        let entries = entries.to_vec();
        let total = entries.len();
        let report = self
            .run("put_many", move |repo| Ok(repo.put_many(&entries)))
            .await?;
        if !report.is_complete() {
            warn!(
                "event=store_put_many module=store status=partial total={} written={} failed={}",
                total,
                report.written_count(),
                report.failures.len()
            );
        }
        Ok(report)
    }

    /// Removes the row keyed by `id`; a missing row is not an error.
    pub async fn delete(&self, id: &EntryId) -> StoreResult<()> {
        let id = id.clone();
        self.run("delete", move |repo| repo.delete(&id)).await
    }

    pub async fn get_by_id(&self, id: &EntryId) -> StoreResult<Option<JournalEntry>> {
        let id = id.clone();
        self.run("get_by_id", move |repo| repo.get_by_id(&id)).await
    }

    /// Entries with `start <= date <= end`, ordered by date.
    pub async fn get_by_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> StoreResult<Vec<JournalEntry>> {
        let start = start.to_string();
        let end = end.to_string();
        self.run("get_by_date_range", move |repo| {
            repo.list_by_date_range(&start, &end)
        })
        .await
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.run("count", |repo| repo.count()).await
    }

    /// Empties the table. Destructive reset only.
    pub async fn clear_all(&self) -> StoreResult<()> {
        warn!("event=store_clear_all module=store status=start");
        self.run("clear_all", |repo| repo.clear_all()).await
    }

    async fn connection(&self) -> StoreResult<SharedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| open_connection(self.location.clone()))
            .await?;
        Ok(Arc::clone(conn))
    }

    async fn run<F, R>(&self, op: &'static str, f: F) -> StoreResult<R>
    where
        F: FnOnce(&SqliteEntryRepository<'_>) -> Result<R, RepoError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.connection().await?;
        let result = tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let repo = SqliteEntryRepository::new(&guard);
            f(&repo).map_err(StoreError::from)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?;

        match &result {
            Ok(_) => debug!("event=store_op module=store status=ok op={op}"),
            Err(err) => error!("event=store_op module=store status=error op={op} error={err}"),
        }
        result
    }
}

async fn open_connection(location: StoreLocation) -> StoreResult<SharedConnection> {
    let mode = location.mode();
    let opened = tokio::task::spawn_blocking(move || match &location {
        StoreLocation::File(path) => open_db(path),
        StoreLocation::Memory => open_db_in_memory(),
    })
    .await
    .map_err(|err| StoreError::Task(err.to_string()))?;

    match opened {
        Ok(conn) => {
            info!("event=store_init module=store status=ok mode={mode}");
            Ok(Arc::new(Mutex::new(conn)))
        }
        Err(err) => {
            error!("event=store_init module=store status=error mode={mode} error={err}");
            Err(StoreError::Unavailable(err))
        }
    }
}
