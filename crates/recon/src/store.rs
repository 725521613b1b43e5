//! Record store boundary.
//!
//! The engine hands [`ScriptRunRecord`]s across this trait and never touches
//! storage itself. Stores keep one row per (canonical location, date, user)
//! key; writing the same key again replaces it, so re-running an input is
//! idempotent and the last write wins.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::consolidate::ConsolidatedRange;
use crate::error::ReconError;
use crate::model::{ReportRow, ScriptRunRecord, SourceTool, WorkOrderHeader};

pub trait RecordStore {
    /// Write every row of `run`, replacing rows with the same key.
    /// Returns the number of rows written.
    fn upsert(&mut self, run: &ScriptRunRecord) -> Result<usize, ReconError>;

    /// Stored runs whose rows match `filter`. Each returned run carries only
    /// the matching rows.
    fn query(&self, filter: &RunFilter) -> Result<Vec<ScriptRunRecord>, ReconError>;

    /// Delete everything. Returns the number of rows removed.
    fn clear(&mut self) -> Result<usize, ReconError>;
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    pub date: Option<NaiveDate>,
    pub user: Option<String>,
    /// Matches either the displayed or the canonical location.
    pub location: Option<String>,
}

impl RunFilter {
    pub fn by_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn matches(&self, row: &StoredRow) -> bool {
        if let Some(date) = self.date {
            if row.key.date != date {
                return false;
            }
        }
        if let Some(ref user) = self.user {
            if &row.key.user != user {
                return false;
            }
        }
        if let Some(ref location) = self.location {
            if &row.key.location != location && &row.location != location {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Flattened rows
// ---------------------------------------------------------------------------

/// Upsert key. `location` is the canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub location: String,
    pub date: NaiveDate,
    pub user: String,
}

/// One stored row: a report row plus the run context it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub key: RecordKey,
    pub location: String,
    pub frames: ConsolidatedRange,
    pub sources: Vec<String>,
    pub tool: SourceTool,
    pub source_file: String,
    pub header: WorkOrderHeader,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Split a run into keyed rows.
pub fn flatten(run: &ScriptRunRecord) -> Vec<StoredRow> {
    run.rows
        .iter()
        .map(|row| StoredRow {
            key: RecordKey {
                location: row.canonical.clone(),
                date: run.date,
                user: run.user.clone(),
            },
            location: row.location.clone(),
            frames: row.frames.clone(),
            sources: row.sources.clone(),
            tool: run.tool,
            source_file: run.source_file.clone(),
            header: run.header.clone(),
            submitted_by: run.submitted_by.clone(),
            submitted_at: run.submitted_at,
        })
        .collect()
}

/// Regroup stored rows into runs, one per (date, user, source file).
/// Output is ordered by that triple; rows within a run by location.
pub fn assemble(rows: impl IntoIterator<Item = StoredRow>) -> Vec<ScriptRunRecord> {
    let mut groups: BTreeMap<(NaiveDate, String, String), Vec<StoredRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.key.date, row.key.user.clone(), row.source_file.clone()))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .filter_map(|((date, user, source_file), mut rows)| {
            rows.sort_by(|a, b| a.key.location.cmp(&b.key.location));
            let latest = rows.iter().max_by_key(|r| r.submitted_at)?.clone();
            Some(ScriptRunRecord {
                user,
                date,
                tool: latest.tool,
                source_file,
                header: latest.header,
                submitted_by: latest.submitted_by,
                submitted_at: latest.submitted_at,
                rows: rows
                    .into_iter()
                    .map(|r| ReportRow {
                        location: r.location,
                        canonical: r.key.location,
                        frames: r.frames,
                        sources: r.sources,
                    })
                    .collect(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Map-backed store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<RecordKey, StoredRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn upsert(&mut self, run: &ScriptRunRecord) -> Result<usize, ReconError> {
        let rows = flatten(run);
        let written = rows.len();
        for row in rows {
            self.rows.insert(row.key.clone(), row);
        }
        Ok(written)
    }

    fn query(&self, filter: &RunFilter) -> Result<Vec<ScriptRunRecord>, ReconError> {
        Ok(assemble(
            self.rows.values().filter(|r| filter.matches(r)).cloned(),
        ))
    }

    fn clear(&mut self) -> Result<usize, ReconError> {
        let removed = self.rows.len();
        self.rows.clear();
        Ok(removed)
    }
}
