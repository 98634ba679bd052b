/// SQLite sink.
///
/// One transaction per batch, `INSERT OR IGNORE` against a primary key on
/// `(parent, name)`. The database runs in WAL mode with full fsync so a batch
/// is on disk before the checkpoint that covers it is written.
use super::RecordSink;
use crate::error::SinkError;
use crate::record::FileRecord;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default table. A custom schema must provide the same table and columns,
/// with a uniqueness constraint on `(parent, name)`.
const CREATE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    parent   TEXT NOT NULL,
    name     TEXT NOT NULL,
    suffix   TEXT NOT NULL,
    owner    TEXT NOT NULL,
    size     INTEGER NOT NULL,
    modified TEXT,                -- YYYY-MM-DD, local time
    created  TEXT,
    accessed TEXT,
    PRIMARY KEY (parent, name)
)
"#;

const INSERT_FILE: &str = "INSERT OR IGNORE INTO files \
    (parent, name, suffix, owner, size, modified, created, accessed) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const WRITE_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = FULL;
PRAGMA temp_store = MEMORY;
"#;

pub struct SqliteSink {
    conn: Connection,
    schema_sql: Option<String>,
}

impl SqliteSink {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        info!("Opening database: {}", path.display());
        Ok(Self {
            conn: Connection::open(path)?,
            schema_sql: None,
        })
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            schema_sql: None,
        })
    }

    /// Run the SQL in `path` on `init` instead of the built-in schema.
    pub fn with_schema_file(mut self, path: &Path) -> Result<Self, SinkError> {
        self.schema_sql = Some(fs::read_to_string(path)?);
        Ok(self)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<u64, SinkError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Underlying connection, for ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn date_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

impl RecordSink for SqliteSink {
    fn init(&mut self) -> Result<(), SinkError> {
        self.conn.execute_batch(WRITE_PRAGMAS)?;
        match &self.schema_sql {
            Some(sql) => self.conn.execute_batch(sql)?,
            None => self.conn.execute_batch(CREATE_FILES_TABLE)?,
        }
        debug!("Database schema ready");
        Ok(())
    }

    fn write_batch(&mut self, records: &[FileRecord]) -> Result<(), SinkError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_FILE)?;
            for r in records {
                stmt.execute(params![
                    r.parent,
                    r.name.as_str(),
                    r.suffix.as_str(),
                    r.owner.as_str(),
                    i64::try_from(r.size).unwrap_or(i64::MAX),
                    date_text(r.modified),
                    date_text(r.created),
                    date_text(r.accessed),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
