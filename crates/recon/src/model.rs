use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::consolidate::ConsolidatedRange;
use crate::error::Diagnostics;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Tool family that produced an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTool {
    Baselight,
    Flame,
}

impl fmt::Display for SourceTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baselight => write!(f, "Baselight"),
            Self::Flame => write!(f, "Flame"),
        }
    }
}

impl FromStr for SourceTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baselight" => Ok(Self::Baselight),
            "flame" => Ok(Self::Flame),
            other => Err(format!("unknown source tool '{other}'")),
        }
    }
}

/// One export file handed to the pipeline, already read into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path or name as given by the caller. The basename drives attribution.
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// User and date recovered from a `<tool>_<user>_<YYYYMMDD>` filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceIdentity {
    pub user: String,
    pub date: NaiveDate,
    pub filename: String,
}

// ---------------------------------------------------------------------------
// Parsed entries
// ---------------------------------------------------------------------------

/// One parsed export line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocationEntry {
    pub local_path: String,
    pub frames: BTreeSet<u64>,
    /// Tokens that were not frame numbers (sentinels or junk).
    pub dropped_tokens: usize,
}

/// A local path after translation into facility form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CanonicalLocation {
    pub path: String,
    pub local_path: String,
}

/// Union of frames seen for one canonical path, across entries and files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFrameSet {
    pub frames: BTreeSet<u64>,
    /// Local paths that translated onto this location.
    pub sources: BTreeSet<String>,
}

impl LocationFrameSet {
    pub fn absorb(&mut self, location: &CanonicalLocation, frames: &BTreeSet<u64>) {
        self.frames.extend(frames.iter().copied());
        self.sources.insert(location.local_path.clone());
    }
}

/// Frame sets keyed by canonical path. Ordered so iteration is stable.
pub type LocationFrames = BTreeMap<String, LocationFrameSet>;

// ---------------------------------------------------------------------------
// Work order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkOrderHeader {
    pub producer: Option<String>,
    pub operator: Option<String>,
    pub job: Option<String>,
    pub notes: Option<String>,
}

impl WorkOrderHeader {
    pub fn is_empty(&self) -> bool {
        self.producer.is_none() && self.operator.is_none() && self.job.is_none() && self.notes.is_none()
    }
}

/// Parsed Xytech work order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkOrderMeta {
    pub header: WorkOrderHeader,
    /// Declared locations in file order, duplicates preserved.
    pub locations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Location as the work order writes it, or the canonical path for
    /// rows that never matched a declared location.
    pub location: String,
    pub canonical: String,
    pub frames: ConsolidatedRange,
    /// Local export paths that contributed frames.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl ReportRow {
    pub fn no_data(location: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            canonical: canonical.into(),
            frames: ConsolidatedRange::NoData,
            sources: Vec::new(),
        }
    }
}

/// Joined report: declared rows in work-order order plus drift.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub header: WorkOrderHeader,
    pub rows: Vec<ReportRow>,
    /// Ingested locations the work order never declares.
    pub unmatched: Vec<ReportRow>,
}

/// Everything one attributed export contributed, as handed to a record store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptRunRecord {
    pub user: String,
    pub date: NaiveDate,
    pub tool: SourceTool,
    pub source_file: String,
    pub header: WorkOrderHeader,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub sources: usize,
    pub parsed_sources: usize,
    pub locations: usize,
    pub declared: usize,
    pub matched: usize,
    pub no_data: usize,
    pub unmatched: usize,
    pub dropped_tokens: usize,
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub report: Report,
    pub runs: Vec<ScriptRunRecord>,
    pub summary: RunSummary,
    pub diagnostics: Diagnostics,
}

impl RunOutcome {
    /// First attributed run date, used to name output files.
    pub fn run_date(&self) -> Option<NaiveDate> {
        self.runs.first().map(|r| r.date)
    }
}

/// Per-file result of the parse stage.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub name: String,
    pub tool: SourceTool,
    pub identity: Option<SourceIdentity>,
    pub entries: Vec<RawLocationEntry>,
}

impl ParsedSource {
    pub fn dropped_tokens(&self) -> usize {
        self.entries.iter().map(|e| e.dropped_tokens).sum()
    }
}
