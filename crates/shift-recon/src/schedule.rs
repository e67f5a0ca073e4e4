//! Build each worker's actual worked time from attendance rows.
//!
//! Shifts minus breaks, merged per worker into sorted disjoint intervals.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::audit::RunAudit;
use crate::interval::{merge, subtract_many, TimeInterval};
use crate::normalize::normalize_name;
use crate::table::{AttendanceRow, AttendanceTable, ShiftSlot};

/// One worker's merged worked time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSchedule {
    /// First raw label seen for this identity.
    pub display_name: String,
    /// Sorted, disjoint, non-adjacent.
    pub intervals: Vec<TimeInterval>,
}

/// Normalized identity → worked time. Iterates in identity order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerScheduleIndex {
    workers: BTreeMap<String, WorkerSchedule>,
}

impl WorkerScheduleIndex {
    pub fn get(&self, worker: &str) -> Option<&WorkerSchedule> {
        self.workers.get(worker)
    }

    /// Worked intervals for `worker`, empty when unknown.
    pub fn intervals(&self, worker: &str) -> &[TimeInterval] {
        self.workers
            .get(worker)
            .map(|s| s.intervals.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, worker: &str) -> bool {
        self.workers.contains_key(worker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkerSchedule)> {
        self.workers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

/// Build the worker schedule index.
///
/// Rows whose first shift slot has no check-in are non-work days, unless
/// `use_schedule_when_missing` is set and the planned start/end form a valid
/// interval. Incomplete or reversed shift/break pairs are dropped and counted
/// in `audit`.
pub fn build_schedule_index(
    attendance: &AttendanceTable,
    use_schedule_when_missing: bool,
    audit: &mut RunAudit,
) -> WorkerScheduleIndex {
    let mut fragments: BTreeMap<String, WorkerSchedule> = BTreeMap::new();
    audit.attendance_rows += attendance.rows.len();

    for row in &attendance.rows {
        let worker = normalize_name(&row.worker_label);
        if worker.is_empty() {
            audit.skipped_unnamed_rows += 1;
            continue;
        }

        // The display name is the first label seen, work day or not.
        let entry = fragments
            .entry(worker)
            .or_insert_with(|| WorkerSchedule {
                display_name: row.worker_label.clone(),
                intervals: Vec::new(),
            });

        let Some(shifts) = shift_intervals(row, use_schedule_when_missing, audit) else {
            audit.skipped_non_work_rows += 1;
            continue;
        };
        let breaks = valid_intervals(row, &row.breaks, &mut audit.dropped_break_slots);

        for shift in &shifts {
            entry.intervals.extend(subtract_many(shift, &breaks));
        }
    }

    for schedule in fragments.values_mut() {
        schedule.intervals = merge(std::mem::take(&mut schedule.intervals));
    }
    fragments.retain(|_, s| !s.intervals.is_empty());

    if audit.dropped_shift_slots + audit.dropped_break_slots > 0 {
        warn!(
            shifts = audit.dropped_shift_slots,
            breaks = audit.dropped_break_slots,
            "dropped incomplete or reversed attendance slots"
        );
    }
    debug!(workers = fragments.len(), "built worker schedule index");

    WorkerScheduleIndex { workers: fragments }
}

/// The shift intervals of one row, or `None` for a non-work day.
fn shift_intervals(
    row: &AttendanceRow,
    use_schedule_when_missing: bool,
    audit: &mut RunAudit,
) -> Option<Vec<TimeInterval>> {
    let first_in = row.shifts.first().and_then(|s| s.start);
    if first_in.is_none() {
        if !use_schedule_when_missing {
            return None;
        }
        let planned = row.planned.to_interval(row.date)?;
        debug!(row = row.row, "using planned shift for missing punches");
        return Some(vec![planned]);
    }

    let shifts = valid_intervals(row, &row.shifts, &mut audit.dropped_shift_slots);
    (!shifts.is_empty()).then_some(shifts)
}

fn valid_intervals(row: &AttendanceRow, slots: &[ShiftSlot], dropped: &mut usize) -> Vec<TimeInterval> {
    slots
        .iter()
        .filter(|slot| !slot.is_empty())
        .filter_map(|slot| {
            let interval = slot.to_interval(row.date);
            if interval.is_none() {
                *dropped += 1;
            }
            interval
        })
        .collect()
}
