//! `framefix run`: exports in, report and/or stored runs out.

use std::path::Path;

use framefix_io::csv::{default_output_path, write_report};
use framefix_io::discover::find_input;
use framefix_io::read::{load_source, read_file_as_utf8};
use framefix_recon::config::ReportLayout;
use framefix_recon::engine::{overlapping_runs, run, RunInput};
use framefix_recon::error::Severity;
use framefix_recon::model::{RunOutcome, WorkOrderMeta};
use framefix_recon::parse::parse_work_order;
use framefix_recon::report::render;
use framefix_recon::store::RecordStore;
use framefix_recon::Diagnostics;

use crate::exit_codes::EXIT_PARTIAL;
use crate::records::open_store;
use crate::{config, CliError, OutputMode, RunArgs};

pub fn cmd_run(args: RunArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let mut config = config::load(config_path)?;
    if args.split_ranges {
        config.report.layout = ReportLayout::PerRange;
    }

    // Missing and unreadable exports are per-file failures, not fatal.
    let mut diagnostics = Diagnostics::new();
    let mut sources = Vec::with_capacity(args.files.len());
    for name in &args.files {
        match find_input(name).and_then(|path| load_source(&path)) {
            Ok(source) => sources.push(source),
            Err(err) => diagnostics.record(&err),
        }
    }
    if sources.is_empty() {
        return Err(CliError::io("none of the export files could be read").with_hint(
            "bare names are searched in ., ./input, ./input/{baselight,flame,xytech}, Downloads, Desktop and Documents",
        ));
    }

    let work_order = match args.xytech {
        Some(ref name) => Some(load_work_order(name)?),
        None => None,
    };

    let submitted_by = args.submitted_by.clone().or_else(login_user);
    let outcome = run(
        &config,
        RunInput {
            sources,
            work_order,
            submitted_by,
            diagnostics,
        },
    );

    match args.output {
        OutputMode::Csv => {
            let table = render(&outcome.report, &config.report);
            let path = args
                .out
                .clone()
                .unwrap_or_else(|| default_output_path(outcome.run_date()));
            write_report(&table, &path)?;
            eprintln!("wrote {}", path.display());
        }
        OutputMode::Db => store_runs(&outcome, args.store.db.as_deref())?,
        OutputMode::None => {}
    }

    if args.json {
        let json = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    print_summary(&outcome);

    let failed = outcome
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if failed > 0 {
        return Err(CliError {
            code: EXIT_PARTIAL,
            message: format!("{failed} input file(s) failed; results cover the rest"),
            hint: None,
        });
    }
    Ok(())
}

/// Locate, read and parse a work order.
pub fn load_work_order(name: &str) -> Result<WorkOrderMeta, CliError> {
    let path = find_input(name)?;
    let content = read_file_as_utf8(&path)?;
    let work_order = parse_work_order(&content);
    if work_order.locations.is_empty() {
        log::warn!("{}: work order declares no locations", path.display());
    }
    Ok(work_order)
}

fn store_runs(outcome: &RunOutcome, db: Option<&Path>) -> Result<(), CliError> {
    if outcome.runs.is_empty() {
        log::warn!("no export could be attributed to a user and date; nothing stored");
        return Ok(());
    }
    for ((user, date), files) in overlapping_runs(&outcome.runs) {
        log::warn!(
            "{} exports for {user} on {date} ({}); shared locations keep the last one",
            files.len(),
            files.join(", ")
        );
    }

    let mut store = open_store(db)?;
    let mut written = 0;
    for record in &outcome.runs {
        written += store.upsert(record)?;
    }
    eprintln!("stored {written} rows from {} run(s)", outcome.runs.len());
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    let s = &outcome.summary;
    if s.declared > 0 {
        eprintln!(
            "{} of {} exports parsed: {} declared locations ({} with data, {} with no frames), {} not in work order",
            s.parsed_sources,
            s.sources,
            s.declared,
            s.declared - s.no_data,
            s.no_data,
            s.unmatched,
        );
    } else {
        eprintln!(
            "{} of {} exports parsed: {} locations",
            s.parsed_sources, s.sources, s.locations
        );
    }
    if s.dropped_tokens > 0 {
        eprintln!("{} malformed frame tokens dropped", s.dropped_tokens);
    }
}

fn login_user() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
}
