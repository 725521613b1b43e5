//! Store-backed commands: view, query, export, clear, ranges.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use framefix_io::csv::{default_output_path, write_report};
use framefix_io::discover::find_work_order;
use framefix_io::sqlite::{default_db_path, SqliteStore};
use framefix_recon::config::ReportLayout;
use framefix_recon::engine::rebuild_report;
use framefix_recon::model::ScriptRunRecord;
use framefix_recon::report::render;
use framefix_recon::store::{RecordStore, RunFilter};
use framefix_recon::timecode::ranges_within;

use crate::exit_codes::EXIT_ERROR;
use crate::run::load_work_order;
use crate::{config, CliError, StoreArgs};

pub fn open_store(db: Option<&Path>) -> Result<SqliteStore, CliError> {
    let path = db.map(Path::to_path_buf).unwrap_or_else(default_db_path);
    log::debug!("record store: {}", path.display());
    Ok(SqliteStore::open(&path)?)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// view / query
// ---------------------------------------------------------------------------

pub fn cmd_view(store: &StoreArgs, json: bool) -> Result<(), CliError> {
    let runs = open_store(store.db.as_deref())?.query(&RunFilter::default())?;
    print_runs(&runs, json)
}

pub fn cmd_query(
    date: Option<NaiveDate>,
    user: Option<String>,
    location: Option<String>,
    store: &StoreArgs,
    json: bool,
) -> Result<(), CliError> {
    let filter = RunFilter { date, user, location };
    let runs = open_store(store.db.as_deref())?.query(&filter)?;
    print_runs(&runs, json)
}

fn print_runs(runs: &[ScriptRunRecord], json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", to_json(&runs)?);
        return Ok(());
    }
    if runs.is_empty() {
        eprintln!("no stored runs");
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {}  {}  {}",
            run.date.format("%Y%m%d"),
            run.user,
            run.tool,
            run.source_file
        );
        let submitted = run.submitted_at.format("%Y-%m-%d %H:%M:%S UTC");
        match run.submitted_by {
            Some(ref by) => println!("  submitted by {by} at {submitted}"),
            None => println!("  submitted at {submitted}"),
        }
        if let Some(ref job) = run.header.job {
            println!("  job: {job}");
        }
        let width = run.rows.iter().map(|r| r.location.len()).max().unwrap_or(0);
        for row in &run.rows {
            println!("  {:<width$}  {}", row.location, row.frames);
        }
    }
    eprintln!("{} run(s)", runs.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

pub fn cmd_export(
    date: NaiveDate,
    xytech: Option<String>,
    out: Option<PathBuf>,
    split_ranges: bool,
    store: &StoreArgs,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let mut config = config::load(config_path)?;
    if split_ranges {
        config.report.layout = ReportLayout::PerRange;
    }

    let runs = open_store(store.db.as_deref())?.query(&RunFilter::by_date(date))?;
    if runs.is_empty() {
        return Err(CliError {
            code: EXIT_ERROR,
            message: format!("no stored runs for {}", date.format("%Y%m%d")),
            hint: Some("store runs first with `framefix run --output db`".to_string()),
        });
    }

    let work_order = match xytech {
        Some(ref name) => Some(load_work_order(name)?),
        None => match find_work_order(date) {
            Some(path) => Some(load_work_order(&path.display().to_string())?),
            None => {
                log::info!("no Xytech_{}.txt found; listing stored locations", date.format("%Y%m%d"));
                None
            }
        },
    };

    let report = rebuild_report(&config, &runs, work_order.as_ref());
    let table = render(&report, &config.report);
    let path = out.unwrap_or_else(|| default_output_path(Some(date)));
    write_report(&table, &path)?;
    eprintln!(
        "wrote {} ({} run(s), {} rows)",
        path.display(),
        runs.len(),
        table.rows.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

pub fn cmd_clear(yes: bool, store: &StoreArgs) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::usage("refusing to delete stored runs without confirmation")
            .with_hint("pass --yes to delete every stored run"));
    }
    let removed = open_store(store.db.as_deref())?.clear()?;
    eprintln!("deleted {removed} stored rows");
    Ok(())
}

// ---------------------------------------------------------------------------
// ranges
// ---------------------------------------------------------------------------

pub fn cmd_ranges(
    total_frames: u64,
    fps: f64,
    date: Option<NaiveDate>,
    store: &StoreArgs,
    json: bool,
) -> Result<(), CliError> {
    if total_frames == 0 {
        return Err(CliError::usage("--total-frames must be at least 1"));
    }
    if !(fps.is_finite() && fps > 0.0) {
        return Err(CliError::usage(format!("--fps must be positive, got {fps}")));
    }
    let filter = RunFilter {
        date,
        ..Default::default()
    };
    let runs = open_store(store.db.as_deref())?.query(&filter)?;
    let clipped = ranges_within(&runs, total_frames, fps)?;

    if json {
        println!("{}", to_json(&clipped)?);
        return Ok(());
    }

    for range in &clipped {
        println!(
            "{}  {}  {}-{}  {} - {}  (middle {} @ {})",
            range.location,
            range.user,
            range.start,
            range.end,
            range.start_timecode,
            range.end_timecode,
            range.middle,
            range.middle_timecode,
        );
    }
    eprintln!("{} range(s) within {total_frames} frames at {fps} fps", clipped.len());
    Ok(())
}
