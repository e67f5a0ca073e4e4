//! # shift-recon
//!
//! Reconcile facility service logs against an attendance log.
//!
//! Given each worker's actual worked time and the service windows they were
//! booked for across one or more facilities, the engine finds workers booked
//! twice at once (across facilities or within one), service windows their
//! attendance does not cover, and for each finding the other workers who are
//! attendance-covered and free for that window.
//!
//! The engine is a pure batch computation over already-parsed tables: no file
//! I/O, no shared state between runs.
//!
//! ## Modules
//!
//! - [`interval`] — interval type, overlap test, subtraction, merge
//! - [`normalize`] — worker-name canonicalization, time and date tokens
//! - [`table`] — typed attendance/service tables validated at load time
//! - [`schedule`] — attendance rows → merged worked time per worker
//! - [`conflict`] — pairwise overlap detection with tie-break
//! - [`coverage`] — service window vs. worked time
//! - [`availability`] — busy index and substitute search
//! - [`annotate`] — the ordered passes producing annotated records
//! - [`output`] — annotated records → string rows
//! - [`audit`] — counters for silently dropped input
//! - [`config`] — run options
//! - [`error`] — error types

pub mod annotate;
pub mod audit;
pub mod availability;
pub mod config;
pub mod conflict;
pub mod coverage;
pub mod error;
pub mod interval;
pub mod normalize;
pub mod output;
pub mod schedule;
pub mod table;

pub use annotate::{
    reconcile, reconcile_raw, AnnotatedRecord, AnnotatedTable, Category, Reconciliation, SubstituteHours,
};
pub use audit::RunAudit;
pub use availability::{find_substitutes, BusyIndex};
pub use config::{IdenticalPreference, ReconcileOptions};
pub use conflict::{decide_flag_target, find_overlaps, OverlapConflict, OverlapKind};
pub use coverage::{analyze_coverage, CoverageResult, CoverageStatus};
pub use error::ReconError;
pub use interval::{merge, overlaps, subtract, subtract_many, TimeInterval};
pub use normalize::{normalize_name, parse_minute_of_day};
pub use schedule::{build_schedule_index, WorkerScheduleIndex};
pub use table::{AttendanceTable, RawTable, ServiceRecord, ServiceTable};
