//! Busy index and substitute-candidate search.
//!
//! A worker is a candidate for a window when their attendance fully contains
//! it and no service commitment in any facility overlaps it.

use std::collections::{BTreeMap, HashSet};

use crate::interval::{merge, TimeInterval};
use crate::schedule::WorkerScheduleIndex;
use crate::table::ServiceTable;

/// Normalized identity → merged service commitments across every facility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyIndex {
    busy: BTreeMap<String, Vec<TimeInterval>>,
}

impl BusyIndex {
    /// Collect every valid service record, then merge per worker.
    pub fn build(tables: &[ServiceTable]) -> Self {
        let mut busy: BTreeMap<String, Vec<TimeInterval>> = BTreeMap::new();
        for record in tables.iter().flat_map(|t| &t.records) {
            if let Some(interval) = record.interval {
                busy.entry(record.worker.clone()).or_default().push(interval);
            }
        }
        for intervals in busy.values_mut() {
            *intervals = merge(std::mem::take(intervals));
        }
        Self { busy }
    }

    pub fn intervals(&self, worker: &str) -> &[TimeInterval] {
        self.busy.get(worker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when any commitment of `worker` overlaps `target`.
    pub fn is_busy(&self, worker: &str, target: &TimeInterval) -> bool {
        self.intervals(worker).iter().any(|b| b.overlaps(target))
    }
}

/// Workers other than `exclude` who can take over `target`.
///
/// Containment is strict (no tolerance). Candidates are reported by display
/// name in identity order, duplicates removed.
pub fn find_substitutes(
    target: &TimeInterval,
    exclude: &str,
    schedules: &WorkerScheduleIndex,
    busy: &BusyIndex,
) -> Vec<String> {
    let candidates = schedules
        .iter()
        .filter(|(worker, _)| *worker != exclude)
        .filter(|(_, schedule)| schedule.intervals.iter().any(|w| w.contains(target)))
        .filter(|(worker, _)| !busy.is_busy(worker, target))
        .map(|(_, schedule)| schedule.display_name.clone());

    let mut seen = HashSet::new();
    candidates.filter(|name| seen.insert(name.clone())).collect()
}

/// Append `additional` names not already present, keeping existing order.
pub fn union_candidates(existing: &mut Vec<String>, additional: Vec<String>) {
    for name in additional {
        if !existing.contains(&name) {
            existing.push(name);
        }
    }
}
