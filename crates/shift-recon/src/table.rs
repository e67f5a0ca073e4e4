//! Typed input tables.
//!
//! The loading collaborator hands the engine a [`RawTable`] of string cells.
//! Headers are validated once here; after that every pass works on typed
//! rows. Per-cell problems never fail the load: a bad time token is an absent
//! slot and a bad service row keeps `interval = None`.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::config::{AttendanceColumns, ServiceColumns};
use crate::error::{ReconError, Result};
use crate::interval::{at_minute, TimeInterval};
use crate::normalize::{normalize_name, parse_date, parse_minute_of_day};

/// A parsed CSV-like table: a header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Used in error messages and, for service tables, as the facility name.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.position(column).ok_or_else(|| ReconError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == column)
    }
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// One `(start, end)` pair of minute-of-day offsets; either side may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftSlot {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl ShiftSlot {
    pub fn new(start: Option<u32>, end: Option<u32>) -> Self {
        Self { start, end }
    }

    fn parse(start: &str, end: &str) -> Self {
        Self::new(parse_minute_of_day(start), parse_minute_of_day(end))
    }

    /// True when neither endpoint is present.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Anchor to `date`; `None` for an incomplete or non-positive pair.
    pub fn to_interval(&self, date: NaiveDate) -> Option<TimeInterval> {
        TimeInterval::from_minutes(date, self.start?, self.end?)
    }
}

/// One attendance row: a worker's punches for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    /// 1-based data row number.
    pub row: usize,
    pub date: NaiveDate,
    pub worker_label: String,
    pub shifts: Vec<ShiftSlot>,
    pub breaks: Vec<ShiftSlot>,
    /// Scheduled start/end, used only when punches are missing.
    pub planned: ShiftSlot,
}

/// The authoritative attendance log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceTable {
    pub rows: Vec<AttendanceRow>,
}

impl AttendanceTable {
    /// Validate headers and type every row.
    ///
    /// # Errors
    /// `MissingColumn` when the date or name column is absent, `InvalidDate`
    /// when any non-blank row carries an unparseable date.
    pub fn from_raw(raw: &RawTable, columns: &AttendanceColumns) -> Result<Self> {
        let date_idx = raw.require(&columns.date)?;
        let name_idx = raw.require(&columns.name)?;

        let numbered = |prefix: &str| -> Vec<Option<usize>> {
            (1..=columns.slots)
                .map(|n| raw.position(&format!("{prefix}{n}")))
                .collect()
        };
        let shift_in = numbered(&columns.shift_in_prefix);
        let shift_out = numbered(&columns.shift_out_prefix);
        let break_start = numbered(&columns.break_start_prefix);
        let break_end = numbered(&columns.break_end_prefix);
        let planned_in = raw.position(&columns.planned_in);
        let planned_out = raw.position(&columns.planned_out);

        let mut rows = Vec::with_capacity(raw.rows.len());
        for (i, cells) in raw.rows.iter().enumerate() {
            if is_blank(cells) {
                continue;
            }
            let row = i + 1;
            let date_str = cell(cells, Some(date_idx));
            let date = parse_date(date_str).ok_or_else(|| ReconError::InvalidDate {
                table: raw.name.clone(),
                row,
                value: date_str.to_string(),
            })?;

            let slots = |starts: &[Option<usize>], ends: &[Option<usize>]| -> Vec<ShiftSlot> {
                starts
                    .iter()
                    .zip(ends)
                    .map(|(&s, &e)| ShiftSlot::parse(cell(cells, s), cell(cells, e)))
                    .collect()
            };

            rows.push(AttendanceRow {
                row,
                date,
                worker_label: cell(cells, Some(name_idx)).trim().to_string(),
                shifts: slots(&shift_in, &shift_out),
                breaks: slots(&break_start, &break_end),
                planned: ShiftSlot::parse(cell(cells, planned_in), cell(cells, planned_out)),
            });
        }

        Ok(Self { rows })
    }
}

/// One scheduled service window from a facility log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    pub facility: String,
    /// 0-based position in the facility table.
    pub row: usize,
    pub worker_label: String,
    /// Normalized identity; empty when the label carries nothing identifying.
    pub worker: String,
    pub date: Option<NaiveDate>,
    /// `None` when the date or a time token could not be parsed.
    pub interval: Option<TimeInterval>,
    /// The original row, cell for cell, aligned with the table headers.
    pub payload: Vec<String>,
}

impl ServiceRecord {
    /// Anchor a service window to `date`. An end earlier than the start
    /// crosses midnight; an end equal to the start yields no interval.
    pub fn window(date: NaiveDate, start_minute: u32, end_minute: u32) -> Option<TimeInterval> {
        let start = at_minute(date, start_minute);
        let mut end = at_minute(date, end_minute);
        if end < start {
            end += Duration::days(1);
        }
        TimeInterval::new(start, end)
    }
}

/// A facility's service log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTable {
    pub facility: String,
    pub headers: Vec<String>,
    pub records: Vec<ServiceRecord>,
}

impl ServiceTable {
    /// Validate headers and type every row. The table name is the facility.
    ///
    /// # Errors
    /// `MissingColumn` when the date, start, end or worker column is absent.
    pub fn from_raw(raw: &RawTable, columns: &ServiceColumns) -> Result<Self> {
        let date_idx = raw.require(&columns.date)?;
        let start_idx = raw.require(&columns.start)?;
        let end_idx = raw.require(&columns.end)?;
        let worker_idx = raw.require(&columns.worker)?;

        let records = raw
            .rows
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                let date = parse_date(cell(cells, Some(date_idx)));
                let start = parse_minute_of_day(cell(cells, Some(start_idx)));
                let end = parse_minute_of_day(cell(cells, Some(end_idx)));
                let interval = match (date, start, end) {
                    (Some(d), Some(s), Some(e)) => ServiceRecord::window(d, s, e),
                    _ => None,
                };
                let worker_label = cell(cells, Some(worker_idx)).trim().to_string();
                ServiceRecord {
                    facility: raw.name.clone(),
                    row,
                    worker: normalize_name(&worker_label),
                    worker_label,
                    date,
                    interval,
                    payload: cells.clone(),
                }
            })
            .collect();

        Ok(Self {
            facility: raw.name.clone(),
            headers: raw.headers.clone(),
            records,
        })
    }
}
