//! libsql access for the `notes` table
//!
//! `DatabaseService` opens the database file, creates the schema and runs the
//! raw SQL behind the note store. It deals only in strings: ids, timestamps
//! and row conversion are the business of `TursoStore`.
//!
//! # Storage
//!
//! - **Journal**: WAL, checkpointed on first creation and on close
//! - **Timestamps**: `created_at` is text in the fixed-width form
//!   `YYYY-MM-DDTHH:MM:SS.ffffffZ`, so `ORDER BY created_at` is time order
//! - **Scoping**: every statement filters on `owner_id`
//!
//! Async callers take connections from `connect_with_timeout()`; its busy
//! timeout makes concurrent writers queue on the write lock rather than fail
//! with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use notespace_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let notes_db = DatabaseService::new(PathBuf::from("/tmp/notespace/notes.db")).await?;
//! let latest = notes_db.db_latest_created_at().await?;
//! println!("newest note: {:?}", latest);
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{params::IntoParams, Builder, Connection, Database, Row, Rows};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const NOTE_COLUMNS: &str = "id, owner_id, title, content, created_at";

/// Milliseconds a connection waits on a locked database
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Handle to the note database file
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub db: Arc<Database>,
    pub db_path: PathBuf,
}

/// Column values for one `INSERT INTO notes`
pub struct DbInsertNoteParams<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub created_at: &'a str,
    pub idempotency_key: Option<&'a str>,
}

/// Owned copy of a `notes` row, still in storage form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

impl NoteRecord {
    /// Read a row selected with `NOTE_COLUMNS`
    fn from_row(row: &Row) -> Result<Self, DatabaseError> {
        let text = |idx: i32, name: &str| -> Result<String, DatabaseError> {
            row.get::<String>(idx)
                .map_err(|e| DatabaseError::corrupt_row(format!("column {}: {}", name, e)))
        };

        Ok(Self {
            id: text(0, "id")?,
            owner_id: text(1, "owner_id")?,
            title: text(2, "title")?,
            content: text(3, "content")?,
            created_at: text(4, "created_at")?,
        })
    }
}

/// Drain `rows` into records
async fn collect_records(mut rows: Rows, what: &str) -> Result<Vec<NoteRecord>, DatabaseError> {
    let mut records = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::query_failed(format!("{}: {}", what, e)))?
    {
        records.push(NoteRecord::from_row(&row)?);
    }
    Ok(records)
}

fn ensure_parent_dir(db_path: &Path) -> Result<(), DatabaseError> {
    let Some(parent) = db_path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    std::fs::create_dir_all(parent).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DatabaseError::permission_denied(db_path.into()),
        _ => DatabaseError::Io(e),
    })
}

impl DatabaseService {
    /// Open (or create) the database at `db_path` and make sure the schema exists
    ///
    /// Missing parent directories are created. Opening an existing database
    /// leaves its rows untouched.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let fresh = !db_path.exists();
        ensure_parent_dir(&db_path)?;

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::open_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };
        service.initialize_schema(fresh).await?;

        tracing::debug!(path = %service.db_path.display(), fresh, "Note database ready");
        Ok(service)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run a PRAGMA through `query()`; several of them answer with a row
    async fn pragma(&self, conn: &Connection, pragma: &str) -> Result<(), DatabaseError> {
        conn.query(pragma, ())
            .await
            .map_err(|e| DatabaseError::query_failed(format!("{}: {}", pragma, e)))?;
        Ok(())
    }

    async fn initialize_schema(&self, fresh: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        let statements = [
            (
                "notes table",
                "CREATE TABLE IF NOT EXISTS notes (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    idempotency_key TEXT
                )",
            ),
            (
                "idx_notes_owner_created",
                "CREATE INDEX IF NOT EXISTS idx_notes_owner_created
                 ON notes(owner_id, created_at)",
            ),
            // NULL keys never collide, so keyless creates are unaffected
            (
                "idx_notes_owner_idempotency",
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_notes_owner_idempotency
                 ON notes(owner_id, idempotency_key)",
            ),
        ];

        for (name, sql) in statements {
            conn.execute(sql, ())
                .await
                .map_err(|e| DatabaseError::schema_failed(format!("{}: {}", name, e)))?;
        }

        // Make the new schema visible to other processes opening the file
        if fresh {
            self.pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)").await?;
        }

        Ok(())
    }

    /// Plain connection without a busy timeout (tests and one-off tooling)
    pub fn connect(&self) -> Result<Connection, DatabaseError> {
        Ok(self.db.connect()?)
    }

    /// Connection that waits up to five seconds for the write lock
    pub async fn connect_with_timeout(&self) -> Result<Connection, DatabaseError> {
        let conn = self.connect()?;
        self.pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;
        Ok(conn)
    }

    async fn select_records(
        &self,
        conn: &Connection,
        sql: &str,
        params: impl IntoParams,
        what: &str,
    ) -> Result<Vec<NoteRecord>, DatabaseError> {
        let rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::query_failed(format!("{}: {}", what, e)))?;
        collect_records(rows, what).await
    }

    /// Insert one row
    ///
    /// A repeated id, or a repeated idempotency key for the same owner,
    /// fails with `DatabaseError::ConstraintViolation`.
    pub async fn db_insert_note(&self, params: DbInsertNoteParams<'_>) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO notes (id, owner_id, title, content, created_at, idempotency_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                params.id,
                params.owner_id,
                params.title,
                params.content,
                params.created_at,
                params.idempotency_key,
            ),
        )
        .await
        .map_err(|e| DatabaseError::from_write("insert note", e))?;

        Ok(())
    }

    pub async fn db_get_note(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<NoteRecord>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1 AND id = ?2");

        let records = self
            .select_records(&conn, &sql, (owner_id, id), "get note")
            .await?;
        Ok(records.into_iter().next())
    }

    /// The row an earlier create stored under `idempotency_key`
    pub async fn db_find_by_idempotency_key(
        &self,
        owner_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<NoteRecord>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1 AND idempotency_key = ?2"
        );

        let records = self
            .select_records(&conn, &sql, (owner_id, idempotency_key), "idempotency lookup")
            .await?;
        Ok(records.into_iter().next())
    }

    /// Delete one row, returning it; `Ok(None)` when no row matched
    ///
    /// Read and delete run in one transaction so the returned record is the
    /// row that was actually removed.
    pub async fn db_delete_note(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<NoteRecord>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::query_failed(format!("begin delete: {}", e)))?;

        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1 AND id = ?2");
        let rows = tx
            .query(&sql, (owner_id, id))
            .await
            .map_err(|e| DatabaseError::query_failed(format!("read before delete: {}", e)))?;
        let record = collect_records(rows, "read before delete")
            .await?
            .into_iter()
            .next();

        if record.is_some() {
            tx.execute(
                "DELETE FROM notes WHERE owner_id = ?1 AND id = ?2",
                (owner_id, id),
            )
            .await
            .map_err(|e| DatabaseError::from_write("delete note", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::query_failed(format!("commit delete: {}", e)))?;

        Ok(record)
    }

    /// Up to `limit` rows older than `cursor`, newest first
    ///
    /// Without a cursor the scan starts at the newest row. Equal
    /// `created_at` values fall back to `id` descending.
    pub async fn db_scan_notes(
        &self,
        owner_id: &str,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<Vec<NoteRecord>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let order = "ORDER BY created_at DESC, id DESC LIMIT";

        match cursor {
            Some(cursor) => {
                let sql = format!(
                    "SELECT {NOTE_COLUMNS} FROM notes
                     WHERE owner_id = ?1 AND created_at < ?2 {order} ?3"
                );
                self.select_records(&conn, &sql, (owner_id, cursor, limit), "scan notes")
                    .await
            }
            None => {
                let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = ?1 {order} ?2");
                self.select_records(&conn, &sql, (owner_id, limit), "scan notes")
                    .await
            }
        }
    }

    /// Newest `created_at` of any owner; seeds the store clock
    pub async fn db_latest_created_at(&self) -> Result<Option<String>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT MAX(created_at) FROM notes", ())
            .await
            .map_err(|e| DatabaseError::query_failed(format!("latest created_at: {}", e)))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::query_failed(format!("latest created_at: {}", e)))?
        else {
            return Ok(None);
        };

        row.get::<Option<String>>(0)
            .map_err(|e| DatabaseError::corrupt_row(format!("MAX(created_at): {}", e)))
    }

    /// Fold the WAL back into the main file before shutdown
    pub async fn db_close(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)").await?;
        tracing::debug!(path = %self.db_path.display(), "Note database checkpointed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp_db() -> (DatabaseService, TempDir) {
        let dir = TempDir::new().unwrap();
        let service = DatabaseService::new(dir.path().join("notes.db")).await.unwrap();
        (service, dir)
    }

    fn row<'a>(id: &'a str, created_at: &'a str) -> DbInsertNoteParams<'a> {
        DbInsertNoteParams {
            id,
            owner_id: "default",
            title: "title",
            content: "content",
            created_at,
            idempotency_key: None,
        }
    }

    async fn sqlite_names(service: &DatabaseService, kind: &str) -> Vec<String> {
        let conn = service.connect().unwrap();
        let mut rows = conn
            .query("SELECT name FROM sqlite_master WHERE type = ?1", [kind])
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(r) = rows.next().await.unwrap() {
            names.push(r.get::<String>(0).unwrap());
        }
        names
    }

    #[tokio::test]
    async fn test_new_creates_file_and_schema() {
        let (service, _dir) = open_temp_db().await;

        assert!(service.path().exists());
        assert!(sqlite_names(&service, "table").await.contains(&"notes".to_string()));

        let indexes = sqlite_names(&service, "index").await;
        assert!(indexes.contains(&"idx_notes_owner_created".to_string()));
        assert!(indexes.contains(&"idx_notes_owner_idempotency".to_string()));
    }

    #[tokio::test]
    async fn test_missing_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("notes.db");

        DatabaseService::new(path.clone()).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.db");

        let first = DatabaseService::new(path.clone()).await.unwrap();
        first
            .db_insert_note(row("a", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();

        let reopened = DatabaseService::new(path).await.unwrap();
        assert!(reopened.db_get_note("default", "a").await.unwrap().is_some());
        assert!(reopened.db_get_note("someone-else", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_constraint_violation() {
        let (service, _dir) = open_temp_db().await;

        service
            .db_insert_note(row("dup", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();
        let err = service
            .db_insert_note(row("dup", "2025-01-01T00:00:01.000000Z"))
            .await
            .unwrap_err();

        assert!(err.is_constraint_violation(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_is_constraint_violation() {
        let (service, _dir) = open_temp_db().await;
        let keyed = |id| DbInsertNoteParams {
            idempotency_key: Some("key"),
            ..row(id, "2025-01-01T00:00:00.000000Z")
        };

        service.db_insert_note(keyed("k1")).await.unwrap();
        let err = service.db_insert_note(keyed("k2")).await.unwrap_err();
        assert!(err.is_constraint_violation());

        let found = service
            .db_find_by_idempotency_key("default", "key")
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some("k1".to_string()));
    }

    #[tokio::test]
    async fn test_scan_is_newest_first_below_cursor() {
        let (service, _dir) = open_temp_db().await;
        for (id, ts) in [
            ("n1", "2025-01-01T00:00:01.000000Z"),
            ("n2", "2025-01-01T00:00:02.000000Z"),
            ("n3", "2025-01-01T00:00:03.000000Z"),
        ] {
            service.db_insert_note(row(id, ts)).await.unwrap();
        }

        let ids = |records: Vec<NoteRecord>| -> Vec<String> {
            records.into_iter().map(|r| r.id).collect()
        };

        let all = service.db_scan_notes("default", None, 10).await.unwrap();
        assert_eq!(ids(all), vec!["n3", "n2", "n1"]);

        let first_two = service.db_scan_notes("default", None, 2).await.unwrap();
        assert_eq!(ids(first_two), vec!["n3", "n2"]);

        let older = service
            .db_scan_notes("default", Some("2025-01-01T00:00:02.000000Z"), 10)
            .await
            .unwrap();
        assert_eq!(ids(older), vec!["n1"]);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row_once() {
        let (service, _dir) = open_temp_db().await;
        service
            .db_insert_note(row("gone", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();

        let removed = service.db_delete_note("default", "gone").await.unwrap();
        assert_eq!(removed.map(|r| r.id), Some("gone".to_string()));

        assert!(service
            .db_delete_note("default", "gone")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_latest_created_at_spans_owners() {
        let (service, _dir) = open_temp_db().await;
        assert_eq!(service.db_latest_created_at().await.unwrap(), None);

        service
            .db_insert_note(row("x", "2025-01-01T00:00:00.000000Z"))
            .await
            .unwrap();
        service
            .db_insert_note(DbInsertNoteParams {
                owner_id: "other",
                ..row("y", "2025-02-01T00:00:00.000000Z")
            })
            .await
            .unwrap();

        assert_eq!(
            service.db_latest_created_at().await.unwrap().as_deref(),
            Some("2025-02-01T00:00:00.000000Z")
        );
    }
}
