//! Run the reconciliation passes and collect annotations per record.
//!
//! Passes run in a fixed order, each consuming the annotated tables and
//! returning them:
//!
//! 1. cross-facility overlaps
//! 2. same-facility overlaps
//! 3. substitutes for overlap-categorized records
//! 4. attendance coverage
//! 5. substitutes for coverage failures, merged into step 3's lists
//!
//! Each proposed substitute's worked time on the record's date is attached
//! last.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::audit::RunAudit;
use crate::availability::{find_substitutes, union_candidates, BusyIndex};
use crate::config::{IdenticalPreference, ReconcileOptions};
use crate::conflict::{find_overlaps, OverlapConflict, OverlapKind};
use crate::coverage::{analyze_coverage, relevant_to_date, CoverageResult};
use crate::error::Result;
use crate::interval::TimeInterval;
use crate::normalize::normalize_name;
use crate::schedule::{build_schedule_index, WorkerScheduleIndex};
use crate::table::{AttendanceTable, RawTable, ServiceRecord, ServiceTable};

/// A conflict type attached to a record. A record may carry several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    FacilityOverlap,
    InternalOverlap,
    ExceedsAttendance,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FacilityOverlap => "facility overlap",
            Self::InternalOverlap => "internal overlap",
            Self::ExceedsAttendance => "exceeds attendance",
        }
    }

    pub fn is_overlap(&self) -> bool {
        matches!(self, Self::FacilityOverlap | Self::InternalOverlap)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Overlap details accumulated on the flagged side of each conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlapDetail {
    pub minutes: i64,
    pub partner_facilities: BTreeSet<String>,
    pub partner_workers: BTreeSet<String>,
    pub kinds: BTreeSet<OverlapKind>,
    /// Overlapping sub-intervals in the order they were charged.
    pub windows: Vec<TimeInterval>,
}

impl OverlapDetail {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// A proposed substitute and their worked intervals on the record's date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstituteHours {
    pub name: String,
    /// Empty when the substitute has no worked time that day.
    pub intervals: Vec<TimeInterval>,
}

/// A service record and everything the passes found about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedRecord {
    pub record: ServiceRecord,
    pub flagged: bool,
    pub categories: BTreeSet<Category>,
    pub overlap: OverlapDetail,
    pub coverage: Option<CoverageResult>,
    /// `None` until a substitute search ran for this record.
    pub candidates: Option<Vec<String>>,
    /// One entry per candidate, in candidate order.
    pub substitute_hours: Vec<SubstituteHours>,
}

impl AnnotatedRecord {
    pub fn new(record: ServiceRecord) -> Self {
        Self {
            record,
            flagged: false,
            categories: BTreeSet::new(),
            overlap: OverlapDetail::default(),
            coverage: None,
            candidates: None,
            substitute_hours: Vec::new(),
        }
    }

    pub fn has_overlap(&self) -> bool {
        self.categories.iter().any(Category::is_overlap)
    }

    pub fn exceeds_attendance(&self) -> bool {
        self.categories.contains(&Category::ExceedsAttendance)
    }

    fn mark(&mut self, category: Category) {
        self.flagged = true;
        self.categories.insert(category);
    }
}

/// One facility's records after annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTable {
    pub facility: String,
    pub headers: Vec<String>,
    pub records: Vec<AnnotatedRecord>,
}

impl AnnotatedTable {
    fn from_service(table: ServiceTable) -> Self {
        Self {
            facility: table.facility,
            headers: table.headers,
            records: table.records.into_iter().map(AnnotatedRecord::new).collect(),
        }
    }

    pub fn flagged_count(&self) -> usize {
        self.records.iter().filter(|r| r.flagged).count()
    }
}

/// Result of one reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub tables: Vec<AnnotatedTable>,
    pub schedules: WorkerScheduleIndex,
    pub conflicts: Vec<OverlapConflict>,
    pub audit: RunAudit,
}

impl Reconciliation {
    pub fn flagged_count(&self) -> usize {
        self.tables.iter().map(AnnotatedTable::flagged_count).sum()
    }
}

/// Load raw tables and reconcile them.
///
/// # Errors
/// Fails when a table lacks a required column, when the attendance table has
/// an unparseable date, or when `options` are invalid.
pub fn reconcile_raw(
    attendance: &RawTable,
    services: &[RawTable],
    options: &ReconcileOptions,
) -> Result<Reconciliation> {
    options.validate()?;
    let attendance = AttendanceTable::from_raw(attendance, &options.attendance_columns)?;
    let services = services
        .iter()
        .map(|raw| ServiceTable::from_raw(raw, &options.service_columns))
        .collect::<Result<Vec<_>>>()?;
    Ok(reconcile(&attendance, services, options))
}

/// Reconcile typed tables.
pub fn reconcile(
    attendance: &AttendanceTable,
    services: Vec<ServiceTable>,
    options: &ReconcileOptions,
) -> Reconciliation {
    let mut audit = RunAudit::default();
    let schedules = build_schedule_index(attendance, options.use_schedule_when_missing, &mut audit);
    audit_services(&services, &schedules, &mut audit);

    let busy = BusyIndex::build(&services);
    let (tables, mut conflicts) =
        cross_facility_pass(&services, AnnotatedTables::new(&services), options.identical_preference);
    let (tables, internal) = internal_pass(&services, tables, options.identical_preference);
    conflicts.extend(internal);

    let tables = overlap_substitute_pass(tables, &schedules, &busy);
    let tables = coverage_pass(tables, &schedules);
    let tables = coverage_substitute_pass(tables, &schedules, &busy);
    let tables = substitute_hours_pass(tables, &schedules);

    let result = Reconciliation {
        tables: tables.0,
        schedules,
        conflicts,
        audit,
    };
    info!(
        facilities = result.tables.len(),
        conflicts = result.conflicts.len(),
        flagged = result.flagged_count(),
        dropped = result.audit.dropped_total(),
        "reconciliation finished"
    );
    result
}

/// The annotated collection threaded through the passes.
struct AnnotatedTables(Vec<AnnotatedTable>);

impl AnnotatedTables {
    fn new(services: &[ServiceTable]) -> Self {
        Self(
            services
                .iter()
                .cloned()
                .map(AnnotatedTable::from_service)
                .collect(),
        )
    }

    fn records_mut(&mut self) -> impl Iterator<Item = &mut AnnotatedRecord> + '_ {
        self.0.iter_mut().flat_map(|t| t.records.iter_mut())
    }

    /// Charge `conflict` to its flagged record.
    fn charge(&mut self, services: &[ServiceTable], conflict: &OverlapConflict) {
        let flagged = conflict.flagged_ref();
        let partner_ref = conflict.partner_ref();
        let partner = &services[partner_ref.table].records[partner_ref.row];
        let category = if conflict.is_internal() {
            Category::InternalOverlap
        } else {
            Category::FacilityOverlap
        };

        let annotated = &mut self.0[flagged.table].records[flagged.row];
        annotated.mark(category);
        let detail = &mut annotated.overlap;
        detail.minutes += conflict.overlap_minutes();
        detail.partner_facilities.insert(partner.facility.clone());
        detail.partner_workers.insert(partner.worker_label.clone());
        detail.kinds.insert(conflict.kind);
        detail.windows.push(conflict.overlap);
    }
}

fn audit_services(services: &[ServiceTable], schedules: &WorkerScheduleIndex, audit: &mut RunAudit) {
    for record in services.iter().flat_map(|t| &t.records) {
        audit.service_records += 1;
        if record.interval.is_none() {
            audit.invalid_service_records += 1;
        }
        if !record.worker.is_empty() && !schedules.contains(&record.worker) {
            audit.unmatched_workers.insert(record.worker.clone());
        }
    }
}

/// Facility indices in lexical facility order.
fn facility_order(services: &[ServiceTable]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..services.len()).collect();
    order.sort_by(|&a, &b| services[a].facility.cmp(&services[b].facility));
    order
}

fn cross_facility_pass(
    services: &[ServiceTable],
    mut tables: AnnotatedTables,
    preference: IdenticalPreference,
) -> (AnnotatedTables, Vec<OverlapConflict>) {
    let order = facility_order(services);
    let mut conflicts = Vec::new();
    for (i, &left) in order.iter().enumerate() {
        for &right in &order[i + 1..] {
            let found = find_overlaps(services, left, right, preference);
            debug!(
                left = %services[left].facility,
                right = %services[right].facility,
                conflicts = found.len(),
                "cross-facility pass"
            );
            for conflict in &found {
                tables.charge(services, conflict);
            }
            conflicts.extend(found);
        }
    }
    (tables, conflicts)
}

fn internal_pass(
    services: &[ServiceTable],
    mut tables: AnnotatedTables,
    preference: IdenticalPreference,
) -> (AnnotatedTables, Vec<OverlapConflict>) {
    let mut conflicts = Vec::new();
    for idx in 0..services.len() {
        let found = find_overlaps(services, idx, idx, preference);
        debug!(facility = %services[idx].facility, conflicts = found.len(), "internal pass");
        for conflict in &found {
            tables.charge(services, conflict);
        }
        conflicts.extend(found);
    }
    (tables, conflicts)
}

fn overlap_substitute_pass(
    mut tables: AnnotatedTables,
    schedules: &WorkerScheduleIndex,
    busy: &BusyIndex,
) -> AnnotatedTables {
    for annotated in tables.records_mut().filter(|r| r.has_overlap()) {
        if let Some(target) = annotated.record.interval {
            let found = find_substitutes(&target, &annotated.record.worker, schedules, busy);
            annotated.candidates = Some(found);
        }
    }
    tables
}

fn coverage_pass(mut tables: AnnotatedTables, schedules: &WorkerScheduleIndex) -> AnnotatedTables {
    for annotated in tables.records_mut() {
        let Some(target) = annotated.record.interval else {
            continue;
        };
        let result = analyze_coverage(&target, schedules.intervals(&annotated.record.worker));
        if !result.is_full() {
            annotated.mark(Category::ExceedsAttendance);
        }
        annotated.coverage = Some(result);
    }
    tables
}

fn coverage_substitute_pass(
    mut tables: AnnotatedTables,
    schedules: &WorkerScheduleIndex,
    busy: &BusyIndex,
) -> AnnotatedTables {
    for annotated in tables.records_mut().filter(|r| r.exceeds_attendance()) {
        if let Some(target) = annotated.record.interval {
            let found = find_substitutes(&target, &annotated.record.worker, schedules, busy);
            let list = annotated.candidates.get_or_insert_with(Vec::new);
            union_candidates(list, found);
        }
    }
    tables
}

fn substitute_hours_pass(mut tables: AnnotatedTables, schedules: &WorkerScheduleIndex) -> AnnotatedTables {
    for annotated in tables.records_mut() {
        let (Some(names), Some(target)) = (&annotated.candidates, annotated.record.interval) else {
            continue;
        };
        let date = target.start().date();
        annotated.substitute_hours = names
            .iter()
            .map(|name| SubstituteHours {
                name: name.clone(),
                intervals: relevant_to_date(schedules.intervals(&normalize_name(name)), date),
            })
            .collect();
    }
    tables
}
