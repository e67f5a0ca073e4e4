//! Input-quality counters for one run.
//!
//! Value-level problems never fail a run; they are dropped and counted here so
//! the caller can show how much of the input was ignored.

use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunAudit {
    /// Attendance rows read.
    pub attendance_rows: usize,
    /// Rows without a first check-in (and no usable planned shift).
    pub skipped_non_work_rows: usize,
    /// Rows whose worker label normalizes to nothing.
    pub skipped_unnamed_rows: usize,
    /// Shift slots with one endpoint present but unusable as an interval.
    pub dropped_shift_slots: usize,
    /// Break slots with one endpoint present but unusable as an interval.
    pub dropped_break_slots: usize,
    /// Service records read across all facilities.
    pub service_records: usize,
    /// Service records without a usable date/start/end.
    pub invalid_service_records: usize,
    /// Normalized identities that appear in service logs but never in attendance.
    pub unmatched_workers: BTreeSet<String>,
}

impl RunAudit {
    /// Total rows and slots silently dropped.
    pub fn dropped_total(&self) -> usize {
        self.skipped_non_work_rows
            + self.skipped_unnamed_rows
            + self.dropped_shift_slots
            + self.dropped_break_slots
            + self.invalid_service_records
    }
}
