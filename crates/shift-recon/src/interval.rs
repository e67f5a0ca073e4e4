//! Interval algebra over absolute wall-clock instants.
//!
//! All reconciliation passes are expressed in terms of a handful of operations
//! on [`TimeInterval`]: the open overlap test, subtraction of one interval from
//! another, and merging a list into sorted disjoint spans.
//! Adjacent intervals (one ends exactly when the other starts) do NOT overlap,
//! but they ARE coalesced by [`merge`].

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const MINUTES_PER_DAY: u32 = 1440;

/// A closed time span `[start, end]` with `start < end`.
///
/// The invariant is enforced by [`TimeInterval::new`], the only constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeInterval {
    /// Build an interval, or `None` when `start >= end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Build an interval from two minute-of-day offsets against a day anchor.
    ///
    /// Offsets of 1440 or more land on the following day(s).
    pub fn from_minutes(date: NaiveDate, start_minute: u32, end_minute: u32) -> Option<Self> {
        Self::new(at_minute(date, start_minute), at_minute(date, end_minute))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// `self.start < other.end && other.start < self.end`.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        overlaps(self, other)
    }

    /// True when `other` lies entirely within `self` (endpoints inclusive).
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// The shared sub-interval, if the two overlap.
    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        if !self.overlaps(other) {
            return None;
        }
        TimeInterval::new(self.start.max(other.start), self.end.min(other.end))
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// The instant `minute` minutes after midnight of `date`.
pub fn at_minute(date: NaiveDate, minute: u32) -> NaiveDateTime {
    let days = i64::from(minute / MINUTES_PER_DAY);
    let rem = i64::from(minute % MINUTES_PER_DAY);
    date.and_time(NaiveTime::MIN) + Duration::days(days) + Duration::minutes(rem)
}

/// Two intervals overlap iff `a.start < b.end && b.start < a.end`.
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start < b.end && b.start < a.end
}

/// `base` minus `cut`: zero, one or two residual intervals.
///
/// Returns `[base]` unchanged when the two do not overlap.
pub fn subtract(base: &TimeInterval, cut: &TimeInterval) -> Vec<TimeInterval> {
    if !base.overlaps(cut) {
        return vec![*base];
    }

    let mut parts = Vec::with_capacity(2);
    if base.start < cut.start {
        parts.extend(TimeInterval::new(base.start, base.end.min(cut.start)));
    }
    if cut.end < base.end {
        parts.extend(TimeInterval::new(base.start.max(cut.end), base.end));
    }
    parts
}

/// Subtract every cut from `base`, in order.
///
/// Stops early once nothing of `base` is left.
pub fn subtract_many<'a, I>(base: &TimeInterval, cuts: I) -> Vec<TimeInterval>
where
    I: IntoIterator<Item = &'a TimeInterval>,
{
    let mut segments = vec![*base];
    for cut in cuts {
        segments = segments
            .iter()
            .flat_map(|segment| subtract(segment, cut))
            .collect();
        if segments.is_empty() {
            break;
        }
    }
    segments
}

/// Merge overlapping or adjacent intervals.
///
/// Returns a sorted, non-overlapping list. Gapped intervals stay separate.
/// Merging an already-merged list returns it unchanged.
pub fn merge<I>(intervals: I) -> Vec<TimeInterval>
where
    I: IntoIterator<Item = TimeInterval>,
{
    let mut sorted: Vec<TimeInterval> = intervals.into_iter().collect();
    sorted.sort_by_key(|iv| (iv.start, iv.end));

    let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        if let Some(last) = merged.last_mut() {
            if iv.start <= last.end {
                // Overlapping or adjacent: extend the current interval.
                last.end = last.end.max(iv.end);
                continue;
            }
        }
        merged.push(iv);
    }
    merged
}

/// Join interval strings with `sep`, e.g. `09:00-12:00 | 13:00-18:00`.
pub fn join_intervals(intervals: &[TimeInterval], sep: &str) -> String {
    intervals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}
