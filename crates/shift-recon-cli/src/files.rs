//! Input discovery and CSV reading/writing.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use shift_recon::RawTable;
use tracing::{debug, warn};

/// Prefix of generated files. Files carrying it are never read as input.
pub const RESULT_PREFIX: &str = "result_";

const SKIPPED_PREFIXES: &[&str] = &[RESULT_PREFIX, "_result_"];
const ATTENDANCE_MARKERS: &[&str] = &["勤怠", "チェック"];
const UTF8_BOM: &str = "\u{FEFF}";

/// The attendance log and facility logs found in one input directory.
#[derive(Debug)]
pub struct Inputs {
    pub attendance: PathBuf,
    /// Sorted by path.
    pub facilities: Vec<PathBuf>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Table name for a CSV file: its stem.
pub fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

/// File names that mark an attendance export.
pub fn looks_like_attendance(name: &str) -> bool {
    ATTENDANCE_MARKERS.iter().any(|m| name.contains(m))
        || name.to_lowercase().contains("attendance")
}

/// Find the attendance file and facility files in `dir`.
///
/// With `attendance_file` set, that file (relative to `dir`) is the
/// attendance log and every other CSV is a facility log. Otherwise the first
/// CSV whose name looks like an attendance export is used.
pub fn discover(dir: &Path, attendance_file: Option<&str>) -> Result<Inputs> {
    if !dir.is_dir() {
        bail!("Input directory does not exist: {}", dir.display());
    }

    let mut attendance = match attendance_file {
        Some(name) => {
            let path = dir.join(name);
            if !path.is_file() {
                bail!("Attendance file not found: {}", path.display());
            }
            Some(path)
        }
        None => None,
    };

    let mut csvs = fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    csvs.retain(|p| p.is_file() && is_csv(p));
    csvs.sort();

    let mut facilities = Vec::new();
    for path in csvs {
        let name = file_name(&path);
        if SKIPPED_PREFIXES.iter().any(|p| name.starts_with(p)) {
            debug!(file = %name, "skipping generated file");
            continue;
        }
        match attendance_file {
            Some(given) if name == given => {}
            Some(_) => facilities.push(path),
            None if looks_like_attendance(&name) => {
                if let Some(first) = attendance.as_deref() {
                    warn!(
                        used = %file_name(first),
                        ignored = %name,
                        "several files look like attendance exports"
                    );
                } else {
                    attendance = Some(path);
                }
            }
            None => facilities.push(path),
        }
    }

    let Some(attendance) = attendance else {
        bail!(
            "No attendance CSV found in {} (name it with 勤怠, チェック or attendance, or pass --attendance-file)",
            dir.display()
        );
    };
    if facilities.is_empty() {
        bail!("No facility service CSVs found in {}", dir.display());
    }

    Ok(Inputs {
        attendance,
        facilities,
    })
}

/// Decode file bytes: UTF-8 (BOM stripped), else Shift_JIS.
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => match text.strip_prefix(UTF8_BOM) {
            Some(stripped) => stripped.to_string(),
            None => text,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&bytes);
            if had_errors {
                warn!("input is neither UTF-8 nor clean Shift_JIS; undecodable bytes replaced");
            }
            decoded.into_owned()
        }
    }
}

/// Read a CSV file with a header row into a [`RawTable`] named `name`.
pub fn read_table(path: &Path, name: &str) -> Result<RawTable> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let text = decode(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()
        .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

    debug!(file = %path.display(), rows = rows.len(), "loaded table");
    Ok(RawTable::new(name, headers, rows))
}

/// Write `table` as UTF-8 CSV with a BOM so spreadsheet tools detect the encoding.
pub fn write_table(path: &Path, table: &RawTable) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    file.write_all(UTF8_BOM.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
    writer
        .write_record(&table.headers)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}
