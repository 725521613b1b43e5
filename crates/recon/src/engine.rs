use std::collections::{BTreeMap, HashMap};
use std::thread;

use chrono::Utc;

use crate::config::FramefixConfig;
use crate::consolidate::consolidate;
use crate::error::{Diagnostic, DiagnosticKind, Diagnostics, ReconError};
use crate::join::{available_from_runs, consolidate_locations, join, rows_without_work_order, JoinOutcome};
use crate::model::{
    LocationFrameSet, LocationFrames, ParsedSource, Report, ReportRow, RunOutcome, RunSummary,
    ScriptRunRecord, SourceFile, WorkOrderHeader, WorkOrderMeta,
};
use crate::parse::parse_source;
use crate::translate::PathTranslator;

/// Everything one invocation works on.
#[derive(Debug, Default)]
pub struct RunInput {
    /// Exports in the order the caller listed them.
    pub sources: Vec<SourceFile>,
    pub work_order: Option<WorkOrderMeta>,
    /// Recorded on every run record.
    pub submitted_by: Option<String>,
    /// Conditions the caller hit before the run (missing or unreadable
    /// inputs). Carried into the outcome.
    pub diagnostics: Diagnostics,
}

/// Parse, translate, consolidate and join one batch of exports.
///
/// Never fails as a whole: a file that cannot be classified is recorded in
/// the outcome's diagnostics and the rest of the batch goes on.
pub fn run(config: &FramefixConfig, input: RunInput) -> RunOutcome {
    let RunInput {
        sources,
        work_order,
        submitted_by,
        mut diagnostics,
    } = input;
    let translator = PathTranslator::from_config(&config.translation);

    let parsed = parse_all(&sources, config, &mut diagnostics);
    let grouped = group_by_location(&parsed, &translator);
    let available = consolidate_locations(&grouped);

    let header = work_order.as_ref().map(|w| w.header.clone()).unwrap_or_default();
    let JoinOutcome { rows, unmatched } = match work_order {
        Some(ref order) => join(&order.locations, &available, &translator),
        None => JoinOutcome {
            rows: rows_without_work_order(&available),
            unmatched: Vec::new(),
        },
    };

    if work_order.is_some() {
        for row in &rows {
            if row.frames.is_no_data() {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::NoFrameData,
                    &row.location,
                    format!("{}: no frame data in any export", row.location),
                ));
            }
        }
        for row in &unmatched {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::UnmatchedLocation,
                &row.canonical,
                format!("{}: not declared in the work order", row.canonical),
            ));
        }
    }

    let summary = RunSummary {
        sources: sources.len(),
        parsed_sources: parsed.len(),
        locations: available.len(),
        declared: if work_order.is_some() { rows.len() } else { 0 },
        matched: if work_order.is_some() {
            rows.iter().filter(|r| !r.sources.is_empty()).count()
        } else {
            0
        },
        no_data: rows.iter().filter(|r| r.frames.is_no_data()).count(),
        unmatched: unmatched.len(),
        dropped_tokens: parsed.iter().map(ParsedSource::dropped_tokens).sum(),
    };

    let runs = build_runs(&parsed, &rows, &header, submitted_by.as_deref(), &translator);

    log::info!(
        "run: {} of {} sources parsed, {} locations, {} declared, {} unmatched",
        summary.parsed_sources,
        summary.sources,
        summary.locations,
        summary.declared,
        summary.unmatched
    );

    RunOutcome {
        report: Report {
            header,
            rows,
            unmatched,
        },
        runs,
        summary,
        diagnostics,
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Parse each source independently; results come back in input order.
fn parse_all(
    sources: &[SourceFile],
    config: &FramefixConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<ParsedSource> {
    let results: Vec<Result<(ParsedSource, Option<ReconError>), ReconError>> = if sources.len() > 1 {
        thread::scope(|scope| {
            let handles: Vec<_> = sources
                .iter()
                .map(|source| (source, scope.spawn(move || parse_source(source, &config.formats))))
                .collect();
            handles
                .into_iter()
                .map(|(source, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ReconError::UnreadableFile {
                            path: source.name.clone(),
                            reason: "parser thread panicked".into(),
                        })
                    })
                })
                .collect()
        })
    } else {
        sources.iter().map(|s| parse_source(s, &config.formats)).collect()
    };

    let mut parsed = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok((source, warning)) => {
                if let Some(warning) = warning {
                    diagnostics.record(&warning);
                }
                let dropped = source.dropped_tokens();
                if dropped > 0 {
                    log::debug!("{}: dropped {dropped} malformed frame tokens", source.name);
                }
                parsed.push(source);
            }
            Err(err) => diagnostics.record(&err),
        }
    }
    parsed
}

/// Union every entry's frames under its canonical path.
fn group_by_location(parsed: &[ParsedSource], translator: &PathTranslator) -> LocationFrames {
    let mut grouped = LocationFrames::new();
    for source in parsed {
        absorb_entries(&mut grouped, source, translator);
    }
    grouped
}

fn absorb_entries(grouped: &mut LocationFrames, source: &ParsedSource, translator: &PathTranslator) {
    for entry in &source.entries {
        let location = translator.canonicalize(&entry.local_path);
        grouped
            .entry(location.path.clone())
            .or_insert_with(LocationFrameSet::default)
            .absorb(&location, &entry.frames);
    }
}

/// One run record per attributed export, holding only the locations that
/// export touched. Declared locations keep their work-order spelling.
fn build_runs(
    parsed: &[ParsedSource],
    rows: &[ReportRow],
    header: &WorkOrderHeader,
    submitted_by: Option<&str>,
    translator: &PathTranslator,
) -> Vec<ScriptRunRecord> {
    let declared: HashMap<&str, &str> = rows
        .iter()
        .map(|r| (r.canonical.as_str(), r.location.as_str()))
        .collect();
    let submitted_at = Utc::now();

    parsed
        .iter()
        .filter_map(|source| {
            let identity = source.identity.as_ref()?;
            let mut own = LocationFrames::new();
            absorb_entries(&mut own, source, translator);

            let file_rows = own
                .into_iter()
                .map(|(canonical, set)| ReportRow {
                    location: declared
                        .get(canonical.as_str())
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| canonical.clone()),
                    frames: consolidate(&set.frames),
                    sources: set.sources.into_iter().collect(),
                    canonical,
                })
                .collect();

            Some(ScriptRunRecord {
                user: identity.user.clone(),
                date: identity.date,
                tool: source.tool,
                source_file: identity.filename.clone(),
                header: header.clone(),
                submitted_by: submitted_by.map(str::to_string),
                submitted_at,
                rows: file_rows,
            })
        })
        .collect()
}

/// Rebuild a report from stored runs, e.g. every run recorded for one date.
///
/// Ranges for the same canonical location are merged across runs. With a
/// work order the merged locations are joined against it; without one the
/// header comes from the most recent run and every location is listed.
pub fn rebuild_report(
    config: &FramefixConfig,
    runs: &[ScriptRunRecord],
    work_order: Option<&WorkOrderMeta>,
) -> Report {
    let translator = PathTranslator::from_config(&config.translation);
    let available = available_from_runs(runs);

    match work_order {
        Some(order) => {
            let JoinOutcome { rows, unmatched } = join(&order.locations, &available, &translator);
            Report {
                header: order.header.clone(),
                rows,
                unmatched,
            }
        }
        None => Report {
            header: runs
                .iter()
                .max_by_key(|r| r.submitted_at)
                .map(|r| r.header.clone())
                .unwrap_or_default(),
            rows: rows_without_work_order(&available),
            unmatched: Vec::new(),
        },
    }
}

/// Locations keyed by (user, date) across runs, for callers that want to
/// see which attributed files overlap before upserting.
pub fn overlapping_runs(runs: &[ScriptRunRecord]) -> BTreeMap<(String, chrono::NaiveDate), Vec<String>> {
    let mut by_key: BTreeMap<(String, chrono::NaiveDate), Vec<String>> = BTreeMap::new();
    for run in runs {
        by_key
            .entry((run.user.clone(), run.date))
            .or_default()
            .push(run.source_file.clone());
    }
    by_key.retain(|_, files| files.len() > 1);
    by_key
}
