use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty anchors, relative facility root, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// No known root marker in any line of an export.
    #[error("{file}: unrecognized export format (no Baselight or Flame root marker found)")]
    UnrecognizedFormat { file: String },
    /// Filename does not follow `<tool>_<user>_<YYYYMMDD>.<ext>`.
    #[error("{file}: filename does not match <tool>_<user>_<YYYYMMDD>; frames kept but not attributed")]
    UnidentifiedSource { file: String },
    /// Input path could not be located.
    #[error("input not found: {path}")]
    MissingInput { path: String },
    /// Input exists but could not be read.
    #[error("cannot read {path}: {reason}")]
    UnreadableFile { path: String, reason: String },
    /// Output could not be written.
    #[error("IO error: cannot write {path}: {reason}")]
    Io { path: String, reason: String },
    /// A rendered range string such as `1001-1003` failed to parse.
    #[error("cannot parse frame range '{0}'")]
    RangeParse(String),
    #[error("frame rate must be positive, got {0}")]
    InvalidFps(f64),
    /// Record store failure, reported by the adapter.
    #[error("record store error: {0}")]
    Store(String),
}

// ---------------------------------------------------------------------------
// Per-file diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnrecognizedFormat,
    UnidentifiedSource,
    MissingInput,
    UnreadableFile,
    /// Ingested location that the work order never declares.
    UnmatchedLocation,
    /// Declared location with no frame data in any export.
    NoFrameData,
}

/// One per-file (or per-location) condition observed during a run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn from_error(err: &ReconError) -> Self {
        let (severity, kind, subject) = match err {
            ReconError::UnrecognizedFormat { file } => {
                (Severity::Error, DiagnosticKind::UnrecognizedFormat, file.clone())
            }
            ReconError::UnidentifiedSource { file } => {
                (Severity::Warning, DiagnosticKind::UnidentifiedSource, file.clone())
            }
            ReconError::MissingInput { path } => {
                (Severity::Error, DiagnosticKind::MissingInput, path.clone())
            }
            ReconError::UnreadableFile { path, .. } => {
                (Severity::Error, DiagnosticKind::UnreadableFile, path.clone())
            }
            other => (Severity::Error, DiagnosticKind::UnreadableFile, other.to_string()),
        };
        Self {
            severity,
            kind,
            subject,
            message: err.to_string(),
        }
    }

    pub fn warning(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Accumulator threaded through a run. Per-file failures land here instead
/// of aborting the run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{}", diagnostic.message),
            Severity::Error => log::error!("{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }

    pub fn record(&mut self, err: &ReconError) {
        self.push(Diagnostic::from_error(err));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, kind: &DiagnosticKind) -> usize {
        self.items.iter().filter(|d| &d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_error_kind() {
        let mut diags = Diagnostics::new();
        diags.record(&ReconError::UnidentifiedSource { file: "baselight.txt".into() });
        assert!(!diags.has_errors());

        diags.record(&ReconError::UnrecognizedFormat { file: "notes.txt".into() });
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.count(&DiagnosticKind::UnrecognizedFormat), 1);
    }

    #[test]
    fn display_includes_subject() {
        let d = Diagnostic::from_error(&ReconError::MissingInput { path: "Flame_x_20240101.txt".into() });
        assert_eq!(d.subject, "Flame_x_20240101.txt");
        assert!(d.to_string().starts_with("error: input not found"));
    }
}
