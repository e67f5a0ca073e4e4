//! Flatten annotated tables back into string rows.
//!
//! Annotation columns come first, followed by the original columns untouched.

use crate::annotate::{AnnotatedRecord, AnnotatedTable};
use crate::interval::{join_intervals, TimeInterval};
use crate::table::RawTable;

/// Marker written in the flag column of a flagged record.
pub const FLAG_MARK: &str = "◯";

/// Written instead of an empty candidate list.
pub const NO_CANDIDATES: &str = "none available";

/// Written instead of an empty worked-hours list.
pub const NO_WORKED_HOURS: &str = "no hours that day";

const LIST_SEP: &str = ", ";
const INTERVAL_SEP: &str = " | ";

pub const ANNOTATION_HEADERS: &[&str] = &[
    "flag",
    "categories",
    "substitutes",
    "overlap_minutes",
    "exceeded_minutes",
    "overlap_facilities",
    "overlap_workers",
    "overlap_kind",
    "overlap_windows",
    "coverage",
    "work_interval_count",
    "work_intervals",
    "covered_intervals",
    "uncovered_intervals",
    "worker_hours",
    "substitute_hours",
];

/// Render a candidate list: joined names, the sentinel for an empty search,
/// or nothing when no search ran.
pub fn candidates_label(candidates: Option<&[String]>, delimiter: &str) -> String {
    match candidates {
        None => String::new(),
        Some([]) => NO_CANDIDATES.to_string(),
        Some(names) => names.join(delimiter),
    }
}

fn hours_label(intervals: &[TimeInterval]) -> String {
    if intervals.is_empty() {
        NO_WORKED_HOURS.to_string()
    } else {
        join_intervals(intervals, LIST_SEP)
    }
}

/// `01(name): 08:00-12:00 | 02(name): no hours that day`
fn substitute_hours_label(annotated: &AnnotatedRecord) -> String {
    annotated
        .substitute_hours
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{:02}({}): {}", i + 1, s.name, hours_label(&s.intervals)))
        .collect::<Vec<_>>()
        .join(INTERVAL_SEP)
}

fn join_set<'a, I: IntoIterator<Item = &'a String>>(items: I) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEP)
}

/// The annotation cells of one record, in [`ANNOTATION_HEADERS`] order.
pub fn annotation_cells(annotated: &AnnotatedRecord, delimiter: &str) -> Vec<String> {
    let overlap = &annotated.overlap;
    let has_overlap = !overlap.is_empty();
    let coverage = annotated.coverage.as_ref();

    let categories = annotated
        .categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(LIST_SEP);
    let kinds = overlap
        .kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(LIST_SEP);

    vec![
        if annotated.flagged { FLAG_MARK.to_string() } else { String::new() },
        categories,
        candidates_label(annotated.candidates.as_deref(), delimiter),
        if has_overlap { overlap.minutes.to_string() } else { String::new() },
        coverage
            .filter(|c| !c.is_full())
            .map(|c| c.uncovered_minutes.to_string())
            .unwrap_or_default(),
        join_set(&overlap.partner_facilities),
        join_set(&overlap.partner_workers),
        kinds,
        join_intervals(&overlap.windows, INTERVAL_SEP),
        coverage.map(|c| c.status.to_string()).unwrap_or_default(),
        coverage
            .map(|c| c.work_intervals.len().to_string())
            .unwrap_or_default(),
        coverage
            .map(|c| join_intervals(&c.work_intervals, INTERVAL_SEP))
            .unwrap_or_default(),
        coverage
            .map(|c| join_intervals(&c.covered_intervals, INTERVAL_SEP))
            .unwrap_or_default(),
        coverage
            .map(|c| join_intervals(&c.uncovered_intervals, INTERVAL_SEP))
            .unwrap_or_default(),
        coverage
            .map(|c| format!("{}: {}", annotated.record.worker_label, hours_label(&c.work_intervals)))
            .unwrap_or_default(),
        substitute_hours_label(annotated),
    ]
}

impl AnnotatedTable {
    /// Annotation columns followed by the original headers and cells.
    pub fn render(&self, delimiter: &str) -> RawTable {
        let headers = ANNOTATION_HEADERS
            .iter()
            .map(|h| h.to_string())
            .chain(self.headers.iter().cloned())
            .collect();
        let rows = self
            .records
            .iter()
            .map(|annotated| {
                let mut cells = annotation_cells(annotated, delimiter);
                cells.extend(annotated.record.payload.iter().cloned());
                cells
            })
            .collect();
        RawTable::new(self.facility.clone(), headers, rows)
    }
}
