//! `framefix-recon` - frame-fix reconciliation engine.
//!
//! Pure engine crate: receives export and work-order text, returns joined
//! report rows, per-file run records and diagnostics. No CLI, file or
//! storage dependencies; persistence goes through [`store::RecordStore`].

pub mod config;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod join;
pub mod model;
pub mod parse;
pub mod report;
pub mod sanitize;
pub mod store;
pub mod timecode;
pub mod translate;

pub use config::FramefixConfig;
pub use consolidate::{consolidate, expand, ConsolidatedRange, FrameRange};
pub use engine::{run, RunInput};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, ReconError, Severity};
pub use model::{Report, ReportRow, RunOutcome, ScriptRunRecord, SourceFile, WorkOrderMeta};
pub use store::{MemoryStore, RecordStore, RunFilter};
