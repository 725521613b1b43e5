// framefix CLI - reconcile frame-fix exports against Xytech work orders

mod config;
mod exit_codes;
mod records;
mod run;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use chrono::NaiveDate;
use framefix_recon::ReconError;
use tracing_subscriber::EnvFilter;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "framefix")]
#[command(about = "Consolidate Baselight/Flame frame-fix exports into Xytech work-order reports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (TOML). Defaults to <config dir>/framefix/config.toml when present
    #[arg(long, global = true, env = "FRAMEFIX_CONFIG")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). FRAMEFIX_LOG overrides the default
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse exports, join against a work order, write a CSV report or store the run
    #[command(after_help = "\
Examples:
  framefix run --files Baselight_TDanza_20230323.txt Flame_DFlowers_20230323.txt --xytech Xytech_20230323.txt
  framefix run --files Baselight_TDanza_20230323.txt --xytech Xytech_20230323.txt --output db
  framefix run --files Flame_DFlowers_20230323.txt --output none --json
  framefix run --files Baselight_TDanza_20230323.txt --split-ranges --out fixes.csv")]
    Run(RunArgs),

    /// List every stored run
    #[command(after_help = "\
Examples:
  framefix view
  framefix view --json --db records.db")]
    View {
        #[command(flatten)]
        store: StoreArgs,

        /// Output JSON to stdout instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// List stored runs matching a date, user and/or location
    #[command(after_help = "\
Examples:
  framefix query --date 20230323
  framefix query --user TDanza --json
  framefix query --location /hpsans13/production/Dune/reel1/partA/1920x1080")]
    Query {
        /// File date (YYYYMMDD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// User from the export filename
        #[arg(long)]
        user: Option<String>,

        /// Location, as written in the work order or in facility form
        #[arg(long)]
        location: Option<String>,

        #[command(flatten)]
        store: StoreArgs,

        /// Output JSON to stdout instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Rebuild a CSV report from every run stored for a date
    #[command(after_help = "\
Examples:
  framefix export --date 20230323
  framefix export --date 20230323 --xytech Xytech_20230323.txt --out report.csv")]
    Export {
        /// File date (YYYYMMDD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Work order to join against. Defaults to a discovered Xytech_<date>.txt
        #[arg(long)]
        xytech: Option<String>,

        /// CSV output path. Defaults to output/frame-fixes-<date>.csv
        #[arg(long)]
        out: Option<PathBuf>,

        /// One row per range instead of one row per location
        #[arg(long)]
        split_ranges: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete every stored run
    #[command(after_help = "\
Examples:
  framefix clear --yes")]
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List stored ranges clipped to a clip length, with timecodes
    #[command(after_help = "\
Examples:
  framefix ranges --total-frames 6000
  framefix ranges --total-frames 6000 --fps 25 --date 20230323 --json")]
    Ranges {
        /// Clip length in frames; ranges are clipped to 1..=N
        #[arg(long)]
        total_frames: u64,

        /// Frame rate used for timecodes
        #[arg(long, default_value_t = 24.0)]
        fps: f64,

        /// Only runs from this file date (YYYYMMDD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[command(flatten)]
        store: StoreArgs,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Baselight and/or Flame export files. Bare names are also searched in ./input and the usual user folders
    #[arg(long, num_args = 1.., required = true)]
    pub files: Vec<String>,

    /// Xytech work order. Without one, every location is listed
    #[arg(long)]
    pub xytech: Option<String>,

    /// Where results go
    #[arg(long, value_enum, default_value_t = OutputMode::Csv)]
    pub output: OutputMode,

    /// CSV output path. Defaults to output/frame-fixes-<date>.csv
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Print the full run outcome as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// One row per range instead of one row per location
    #[arg(long)]
    pub split_ranges: bool,

    /// Recorded on stored runs. Defaults to the login user
    #[arg(long, env = "FRAMEFIX_SUBMITTED_BY")]
    pub submitted_by: Option<String>,
}

#[derive(Args)]
pub struct StoreArgs {
    /// SQLite record store. Defaults to <data dir>/framefix/records.db
    #[arg(long, env = "FRAMEFIX_DB")]
    pub db: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Write the CSV report
    Csv,
    /// Upsert run records into the store
    Db,
    /// Report on stderr/stdout only
    None,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| format!("expected YYYYMMDD, got '{s}'"))
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("FRAMEFIX_GIT_HASH"), ")",
        "\nengine:  framefix-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("FRAMEFIX_TARGET"),
    )
}

/// Log to stderr. `-v` flags win over FRAMEFIX_LOG; without either only
/// warnings show.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("FRAMEFIX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args, config),
        Commands::View { store, json } => records::cmd_view(&store, json),
        Commands::Query {
            date,
            user,
            location,
            store,
            json,
        } => records::cmd_query(date, user, location, &store, json),
        Commands::Export {
            date,
            xytech,
            out,
            split_ranges,
            store,
        } => records::cmd_export(date, xytech, out, split_ranges, &store, config),
        Commands::Clear { yes, store } => records::cmd_clear(yes, &store),
        Commands::Ranges {
            total_frames,
            fps,
            date,
            store,
            json,
        } => records::cmd_ranges(total_frames, fps, date, &store, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingInput { .. } => Some(
                "bare names are searched in ., ./input, ./input/{baselight,flame,xytech}, Downloads, Desktop and Documents"
                    .to_string(),
            ),
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("check the file given by --config or FRAMEFIX_CONFIG".to_string())
            }
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}
