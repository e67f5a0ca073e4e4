//! Check each service window against the worker's actual worked time.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::interval::{subtract_many, TimeInterval};

/// Uncovered time at or below this many seconds still counts as covered.
pub const COVERAGE_TOLERANCE_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Full,
    Partial,
    None,
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Partial => write!(f, "partial"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageResult {
    pub status: CoverageStatus,
    pub total_minutes: i64,
    pub covered_minutes: i64,
    pub uncovered_minutes: i64,
    /// Worked intervals relevant to the record's calendar date.
    pub work_intervals: Vec<TimeInterval>,
    pub covered_intervals: Vec<TimeInterval>,
    /// Empty when `status` is `Full`.
    pub uncovered_intervals: Vec<TimeInterval>,
}

impl CoverageResult {
    pub fn is_full(&self) -> bool {
        self.status == CoverageStatus::Full
    }
}

/// Worked intervals that start on, end on, or span `date`.
///
/// An interval ending exactly at midnight counts for the following day too.
pub fn relevant_to_date(worked: &[TimeInterval], date: NaiveDate) -> Vec<TimeInterval> {
    worked
        .iter()
        .filter(|iv| {
            let (start_date, end_date) = (iv.start().date(), iv.end().date());
            start_date == date || end_date == date || (start_date < date && date < end_date)
        })
        .copied()
        .collect()
}

/// Analyse how much of `target` is covered by `worked`.
///
/// Only worked intervals relevant to the target's start date are considered.
pub fn analyze_coverage(target: &TimeInterval, worked: &[TimeInterval]) -> CoverageResult {
    let relevant = relevant_to_date(worked, target.start().date());

    let covered_intervals: Vec<TimeInterval> = relevant
        .iter()
        .filter_map(|w| target.intersection(w))
        .collect();
    let total_seconds = target.duration_seconds();
    let covered_seconds: i64 = covered_intervals
        .iter()
        .map(TimeInterval::duration_seconds)
        .sum();
    let uncovered_seconds = (total_seconds - covered_seconds).max(0);

    let (status, uncovered_intervals) = if uncovered_seconds <= COVERAGE_TOLERANCE_SECONDS {
        (CoverageStatus::Full, Vec::new())
    } else if covered_seconds > 0 {
        (CoverageStatus::Partial, subtract_many(target, &relevant))
    } else {
        (CoverageStatus::None, vec![*target])
    };

    CoverageResult {
        status,
        total_minutes: total_seconds / 60,
        covered_minutes: covered_seconds / 60,
        uncovered_minutes: uncovered_seconds / 60,
        work_intervals: relevant,
        covered_intervals,
        uncovered_intervals,
    }
}
