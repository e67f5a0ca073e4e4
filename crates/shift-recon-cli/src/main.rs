//! `shift-recon` CLI: reconcile facility service CSVs against an attendance CSV.
//!
//! ## Usage
//!
//! ```sh
//! # Check every CSV in a folder; writes result_<facility>.csv next to them
//! shift-recon check --input ./march
//!
//! # Explicit attendance file, separate output folder, JSON summary
//! shift-recon check -i ./march -o ./out --attendance-file 勤怠履歴.csv --summary-json
//!
//! # Flag the later facility on identical windows, join substitutes with ", "
//! shift-recon check -i ./march --identical-prefer later --alt-delim ", "
//!
//! # Show how names are matched
//! shift-recon normalize "〇大宮　浩子" "早﨑　友音"
//! ```

mod files;

use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shift_recon::{normalize_name, reconcile_raw, IdenticalPreference, ReconcileOptions, RunAudit};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::files::RESULT_PREFIX;

#[derive(Parser)]
#[command(
    name = "shift-recon",
    version,
    about = "Find double bookings and attendance gaps in facility service logs"
)]
struct Cli {
    /// Log per-pass debug events (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the CSVs in a folder and write annotated result files
    Check(CheckArgs),
    /// Print `raw<TAB>normalized` for each name (reads stdin lines if none given)
    Normalize {
        names: Vec<String>,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Folder holding the attendance CSV and one CSV per facility
    #[arg(short, long)]
    input: PathBuf,
    /// Folder for result files (defaults to the input folder)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Attendance file name inside the input folder (auto-detected if omitted)
    #[arg(long)]
    attendance_file: Option<String>,
    /// TOML file with reconcile options; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Which facility to flag when two windows are identical
    #[arg(long, value_name = "earlier|later")]
    identical_prefer: Option<IdenticalPreference>,
    /// Delimiter between substitute names
    #[arg(long)]
    alt_delim: Option<String>,
    /// Use planned start/end when a row has no first check-in
    #[arg(long)]
    use_schedule_when_missing: bool,
    /// Worker column of the facility CSVs
    #[arg(long)]
    service_staff_col: Option<String>,
    /// Worker column of the attendance CSV
    #[arg(long)]
    att_name_col: Option<String>,
    /// Print the run summary as JSON
    #[arg(long)]
    summary_json: bool,
}

#[derive(Serialize)]
struct FacilitySummary {
    facility: String,
    records: usize,
    flagged: usize,
    output: PathBuf,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    attendance: PathBuf,
    facilities: Vec<FacilitySummary>,
    conflicts: usize,
    flagged: usize,
    audit: &'a RunAudit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Normalize { names } => run_normalize(names),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Options from `--config`, then individual flags on top.
fn load_options(args: &CheckArgs) -> Result<ReconcileOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => ReconcileOptions::default(),
    };

    if let Some(preference) = args.identical_prefer {
        options.identical_preference = preference;
    }
    if let Some(delim) = &args.alt_delim {
        options.candidate_delimiter = delim.clone();
    }
    if args.use_schedule_when_missing {
        options.use_schedule_when_missing = true;
    }
    if let Some(col) = &args.service_staff_col {
        options.service_columns.worker = col.clone();
    }
    if let Some(col) = &args.att_name_col {
        options.attendance_columns.name = col.clone();
    }

    options.validate().context("Invalid options")?;
    Ok(options)
}

fn run_check(args: CheckArgs) -> Result<()> {
    let options = load_options(&args)?;
    let inputs = files::discover(&args.input, args.attendance_file.as_deref())?;
    info!(
        attendance = %inputs.attendance.display(),
        facilities = inputs.facilities.len(),
        "discovered input files"
    );

    let attendance = files::read_table(&inputs.attendance, &files::table_name(&inputs.attendance))?;
    let services = inputs
        .facilities
        .iter()
        .map(|path| files::read_table(path, &files::table_name(path)))
        .collect::<Result<Vec<_>>>()?;
    for (i, table) in services.iter().enumerate() {
        if services[..i].iter().any(|other| other.name == table.name) {
            bail!("Two input files share the facility name '{}'", table.name);
        }
    }

    let result = reconcile_raw(&attendance, &services, &options).context("Reconciliation failed")?;

    let out_dir = args.output.unwrap_or_else(|| args.input.clone());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create directory: {}", out_dir.display()))?;

    let mut facilities = Vec::with_capacity(result.tables.len());
    for table in &result.tables {
        let path = out_dir.join(format!("{RESULT_PREFIX}{}.csv", table.facility));
        files::write_table(&path, &table.render(&options.candidate_delimiter))?;
        facilities.push(FacilitySummary {
            facility: table.facility.clone(),
            records: table.records.len(),
            flagged: table.flagged_count(),
            output: path,
        });
    }

    let summary = RunSummary {
        attendance: inputs.attendance,
        facilities,
        conflicts: result.conflicts.len(),
        flagged: result.flagged_count(),
        audit: &result.audit,
    };
    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary<'_>) {
    println!("attendance: {}", summary.attendance.display());
    for f in &summary.facilities {
        println!(
            "{}: {} records, {} flagged -> {}",
            f.facility,
            f.records,
            f.flagged,
            f.output.display()
        );
    }
    println!("conflicts: {}", summary.conflicts);
    println!("flagged:   {}", summary.flagged);

    let audit = summary.audit;
    if audit.dropped_total() > 0 {
        println!(
            "dropped:   {} non-work rows, {} unnamed rows, {} shift slots, {} break slots, {} invalid service records",
            audit.skipped_non_work_rows,
            audit.skipped_unnamed_rows,
            audit.dropped_shift_slots,
            audit.dropped_break_slots,
            audit.invalid_service_records
        );
    }
    if !audit.unmatched_workers.is_empty() {
        let names: Vec<&str> = audit.unmatched_workers.iter().map(String::as_str).collect();
        println!("not in attendance: {}", names.join(", "));
    }
}

fn run_normalize(names: Vec<String>) -> Result<()> {
    if !names.is_empty() {
        for name in &names {
            println!("{name}\t{}", normalize_name(name));
        }
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        let raw = line.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }
        println!("{raw}\t{}", normalize_name(raw));
    }
    Ok(())
}
