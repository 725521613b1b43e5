// SQLite-backed record store

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, params_from_iter, Connection};

use framefix_recon::consolidate::ConsolidatedRange;
use framefix_recon::error::ReconError;
use framefix_recon::model::{ScriptRunRecord, SourceTool, WorkOrderHeader};
use framefix_recon::store::{assemble, flatten, RecordKey, RecordStore, RunFilter, StoredRow};

use crate::STORE_SCHEMA_VERSION;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS frame_records (
    location TEXT NOT NULL,          -- canonical facility path
    file_date TEXT NOT NULL,         -- YYYY-MM-DD from the export filename
    file_user TEXT NOT NULL,
    display_location TEXT NOT NULL,  -- as written in the work order
    frames TEXT,                     -- NULL = no frame data
    sources TEXT NOT NULL,           -- JSON array of local paths
    tool TEXT NOT NULL,
    source_file TEXT NOT NULL,
    producer TEXT,
    operator TEXT,
    job TEXT,
    notes TEXT,
    submitted_by TEXT,
    submitted_at TEXT NOT NULL,      -- RFC 3339
    PRIMARY KEY (location, file_date, file_user)
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const UPSERT: &str = "INSERT INTO frame_records (location, file_date, file_user, display_location, frames, sources, tool, source_file, producer, operator, job, notes, submitted_by, submitted_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14) \
     ON CONFLICT (location, file_date, file_user) DO UPDATE SET \
     display_location = excluded.display_location, frames = excluded.frames, sources = excluded.sources, \
     tool = excluded.tool, source_file = excluded.source_file, producer = excluded.producer, \
     operator = excluded.operator, job = excluded.job, notes = excluded.notes, \
     submitted_by = excluded.submitted_by, submitted_at = excluded.submitted_at";

const SELECT: &str = "SELECT location, file_date, file_user, display_location, frames, sources, tool, source_file, producer, operator, job, notes, submitted_by, submitted_at FROM frame_records";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn store_err(e: impl std::fmt::Display) -> ReconError {
    ReconError::Store(e.to_string())
}

/// Default database location: `<data_dir>/framefix/records.db`.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("framefix")
        .join("records.db")
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store file. Parent directories are created.
    pub fn open(path: &Path) -> Result<Self, ReconError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, ReconError> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, ReconError> {
        conn.execute_batch(SCHEMA).map_err(store_err)?;

        let version: Option<String> = match conn.query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        ) {
            Ok(v) => Some(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(store_err(e)),
        };
        match version {
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES (?1, ?2)",
                    params!["schema_version", STORE_SCHEMA_VERSION.to_string()],
                )
                .map_err(store_err)?;
            }
            Some(v) if v.parse::<u32>().ok() > Some(STORE_SCHEMA_VERSION) => {
                return Err(ReconError::Store(format!(
                    "store schema version {v} is newer than supported version {STORE_SCHEMA_VERSION}"
                )));
            }
            Some(_) => {}
        }

        Ok(Self { conn })
    }

    /// Number of stored rows.
    pub fn count(&self) -> Result<usize, ReconError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM frame_records", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(n as usize)
    }
}

impl RecordStore for SqliteStore {
    fn upsert(&mut self, run: &ScriptRunRecord) -> Result<usize, ReconError> {
        let rows = flatten(run);
        let tx = self.conn.transaction().map_err(store_err)?;
        {
            let mut stmt = tx.prepare(UPSERT).map_err(store_err)?;
            for row in &rows {
                let frames = (!row.frames.is_no_data()).then(|| row.frames.render(""));
                let sources = serde_json::to_string(&row.sources).map_err(store_err)?;
                stmt.execute(params![
                    row.key.location,
                    row.key.date.format(DATE_FORMAT).to_string(),
                    row.key.user,
                    row.location,
                    frames,
                    sources,
                    row.tool.to_string(),
                    row.source_file,
                    row.header.producer,
                    row.header.operator,
                    row.header.job,
                    row.header.notes,
                    row.submitted_by,
                    row.submitted_at.to_rfc3339(),
                ])
                .map_err(store_err)?;
            }
        }
        tx.commit().map_err(store_err)?;
        log::debug!(
            "stored {} rows for {} ({} {})",
            rows.len(),
            run.source_file,
            run.user,
            run.date
        );
        Ok(rows.len())
    }

    fn query(&self, filter: &RunFilter) -> Result<Vec<ScriptRunRecord>, ReconError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(date) = filter.date {
            values.push(date.format(DATE_FORMAT).to_string());
            clauses.push("file_date = ?");
        }
        if let Some(ref user) = filter.user {
            values.push(user.clone());
            clauses.push("file_user = ?");
        }
        if let Some(ref location) = filter.location {
            values.push(location.clone());
            values.push(location.clone());
            clauses.push("(location = ? OR display_location = ?)");
        }

        let mut sql = SELECT.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let raw = stmt
            .query_map(params_from_iter(values.iter()), RawRow::from_row)
            .map_err(store_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)?;

        let rows = raw
            .into_iter()
            .map(RawRow::into_stored)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assemble(rows))
    }

    fn clear(&mut self) -> Result<usize, ReconError> {
        let removed = self.conn.execute("DELETE FROM frame_records", []).map_err(store_err)?;
        log::info!("cleared {removed} stored rows");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

/// Column values as stored, before domain parsing.
struct RawRow {
    location: String,
    file_date: String,
    file_user: String,
    display_location: String,
    frames: Option<String>,
    sources: String,
    tool: String,
    source_file: String,
    producer: Option<String>,
    operator: Option<String>,
    job: Option<String>,
    notes: Option<String>,
    submitted_by: Option<String>,
    submitted_at: String,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            location: row.get(0)?,
            file_date: row.get(1)?,
            file_user: row.get(2)?,
            display_location: row.get(3)?,
            frames: row.get(4)?,
            sources: row.get(5)?,
            tool: row.get(6)?,
            source_file: row.get(7)?,
            producer: row.get(8)?,
            operator: row.get(9)?,
            job: row.get(10)?,
            notes: row.get(11)?,
            submitted_by: row.get(12)?,
            submitted_at: row.get(13)?,
        })
    }

    fn into_stored(self) -> Result<StoredRow, ReconError> {
        let date = NaiveDate::parse_from_str(&self.file_date, DATE_FORMAT).map_err(store_err)?;
        let frames = match self.frames {
            Some(ref text) => ConsolidatedRange::parse(text)?,
            None => ConsolidatedRange::NoData,
        };
        let sources: Vec<String> = serde_json::from_str(&self.sources).map_err(store_err)?;
        let tool: SourceTool = self.tool.parse().map_err(ReconError::Store)?;
        let submitted_at = DateTime::parse_from_rfc3339(&self.submitted_at)
            .map_err(store_err)?
            .with_timezone(&Utc);

        Ok(StoredRow {
            key: RecordKey {
                location: self.location,
                date,
                user: self.file_user,
            },
            location: self.display_location,
            frames,
            sources,
            tool,
            source_file: self.source_file,
            header: WorkOrderHeader {
                producer: self.producer,
                operator: self.operator,
                job: self.job,
                notes: self.notes,
            },
            submitted_by: self.submitted_by,
            submitted_at,
        })
    }
}
