//! Detect double-booked workers across and within facility logs.
//!
//! Performs pairwise comparison between the records of one worker in two
//! service tables (or one table against itself). Adjacent records (one ends
//! exactly when another starts) are NOT conflicts.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::IdenticalPreference;
use crate::interval::TimeInterval;
use crate::table::ServiceTable;

/// How two conflicting intervals relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapKind {
    /// Identical start and end.
    Exact,
    Partial,
}

impl fmt::Display for OverlapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// Which side of a conflicting pair is charged with the conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlagSide {
    First,
    Second,
}

/// Position of a record: table index and row index within that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordRef {
    pub table: usize,
    pub row: usize,
}

/// A detected conflict between two records of the same worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapConflict {
    pub first: RecordRef,
    pub second: RecordRef,
    pub overlap: TimeInterval,
    pub kind: OverlapKind,
    pub flagged: FlagSide,
}

impl OverlapConflict {
    pub fn overlap_minutes(&self) -> i64 {
        self.overlap.duration_minutes()
    }

    /// The record charged with the conflict.
    pub fn flagged_ref(&self) -> RecordRef {
        match self.flagged {
            FlagSide::First => self.first,
            FlagSide::Second => self.second,
        }
    }

    /// The other record of the pair.
    pub fn partner_ref(&self) -> RecordRef {
        match self.flagged {
            FlagSide::First => self.second,
            FlagSide::Second => self.first,
        }
    }

    /// Both records come from the same facility table.
    pub fn is_internal(&self) -> bool {
        self.first.table == self.second.table
    }
}

/// Decide which of two overlapping records is flagged.
///
/// 1. Identical intervals: the facility sorting first (`Earlier`) or last
///    (`Later`) is flagged.
/// 2. Otherwise the shorter record is flagged.
/// 3. Equal durations: the facility sorting first is flagged.
///
/// Equal facility names (a table against itself) always flag the second side.
pub fn decide_flag_target(
    first: &TimeInterval,
    first_facility: &str,
    second: &TimeInterval,
    second_facility: &str,
    preference: IdenticalPreference,
) -> FlagSide {
    let by_facility = |wanted: Ordering| {
        if first_facility.cmp(second_facility) == wanted {
            FlagSide::First
        } else {
            FlagSide::Second
        }
    };

    if first == second {
        return match preference {
            IdenticalPreference::Earlier => by_facility(Ordering::Less),
            IdenticalPreference::Later => by_facility(Ordering::Greater),
        };
    }

    let (d1, d2) = (first.duration_minutes(), second.duration_minutes());
    if d1 != d2 {
        return if d1 < d2 {
            FlagSide::First
        } else {
            FlagSide::Second
        };
    }
    by_facility(Ordering::Less)
}

/// Group a table's valid records by normalized worker identity.
fn group_by_worker(table: &ServiceTable) -> BTreeMap<&str, Vec<(usize, TimeInterval)>> {
    let mut groups: BTreeMap<&str, Vec<(usize, TimeInterval)>> = BTreeMap::new();
    for (row, record) in table.records.iter().enumerate() {
        if record.worker.is_empty() {
            continue;
        }
        if let Some(interval) = record.interval {
            groups
                .entry(record.worker.as_str())
                .or_default()
                .push((row, interval));
        }
    }
    groups
}

/// Find all conflicts between the records of table `left` and table `right`.
///
/// When `left == right` each unordered pair of distinct rows is reported
/// once. Records with no interval or no worker identity never conflict.
pub fn find_overlaps(
    tables: &[ServiceTable],
    left: usize,
    right: usize,
    preference: IdenticalPreference,
) -> Vec<OverlapConflict> {
    let (Some(left_table), Some(right_table)) = (tables.get(left), tables.get(right)) else {
        return Vec::new();
    };
    let internal = left == right;
    let left_groups = group_by_worker(left_table);
    let right_groups = if internal {
        left_groups.clone()
    } else {
        group_by_worker(right_table)
    };

    let mut conflicts = Vec::new();
    for (worker, left_records) in &left_groups {
        let Some(right_records) = right_groups.get(worker) else {
            continue;
        };

        for (i, (left_row, a)) in left_records.iter().enumerate() {
            // A table against itself: only pairs after `i`.
            let candidates = if internal {
                &right_records[i + 1..]
            } else {
                &right_records[..]
            };

            for (right_row, b) in candidates {
                let Some(overlap) = a.intersection(b) else {
                    continue;
                };
                let kind = if a == b {
                    OverlapKind::Exact
                } else {
                    OverlapKind::Partial
                };
                conflicts.push(OverlapConflict {
                    first: RecordRef {
                        table: left,
                        row: *left_row,
                    },
                    second: RecordRef {
                        table: right,
                        row: *right_row,
                    },
                    overlap,
                    kind,
                    flagged: decide_flag_target(
                        a,
                        &left_table.facility,
                        b,
                        &right_table.facility,
                        preference,
                    ),
                });
            }
        }
    }

    conflicts
}
