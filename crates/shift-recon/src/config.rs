//! Run configuration.
//!
//! Everything the engine needs is passed explicitly through
//! [`ReconcileOptions`]; there is no global state. All structs deserialize
//! with defaults so a partial TOML/JSON document is enough.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Default join delimiter for the candidate-substitute list.
pub const DEFAULT_CANDIDATE_DELIMITER: &str = "/";

/// Which facility is charged when two records have identical intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdenticalPreference {
    /// Flag the facility whose name sorts first.
    #[default]
    Earlier,
    /// Flag the facility whose name sorts last.
    Later,
}

impl FromStr for IdenticalPreference {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earlier" => Ok(Self::Earlier),
            "later" => Ok(Self::Later),
            other => Err(ReconError::InvalidConfig(format!(
                "identical preference must be 'earlier' or 'later', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for IdenticalPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earlier => write!(f, "earlier"),
            Self::Later => write!(f, "later"),
        }
    }
}

/// Column names of the attendance table.
///
/// Shift, break and planned columns are optional in the input; a missing one
/// reads as an absent slot. `date` and `name` are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceColumns {
    pub date: String,
    pub name: String,
    /// Prefix of the numbered check-in columns (`出勤1`..`出勤10`).
    pub shift_in_prefix: String,
    pub shift_out_prefix: String,
    pub break_start_prefix: String,
    pub break_end_prefix: String,
    pub planned_in: String,
    pub planned_out: String,
    /// Number of numbered shift/break column pairs.
    pub slots: usize,
}

impl Default for AttendanceColumns {
    fn default() -> Self {
        Self {
            date: "*年月日".to_string(),
            name: "名前".to_string(),
            shift_in_prefix: "出勤".to_string(),
            shift_out_prefix: "退勤".to_string(),
            break_start_prefix: "休憩".to_string(),
            break_end_prefix: "復帰".to_string(),
            planned_in: "出勤予定時刻".to_string(),
            planned_out: "退勤予定時刻".to_string(),
            slots: 10,
        }
    }
}

/// Column names of a facility service table. All four are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceColumns {
    pub date: String,
    pub start: String,
    pub end: String,
    pub worker: String,
}

impl Default for ServiceColumns {
    fn default() -> Self {
        Self {
            date: "西暦日付".to_string(),
            start: "開始時間".to_string(),
            end: "終了時間".to_string(),
            worker: "担当所員".to_string(),
        }
    }
}

/// Options for one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    pub identical_preference: IdenticalPreference,
    /// Fall back to the planned start/end when a row has no first check-in.
    pub use_schedule_when_missing: bool,
    pub candidate_delimiter: String,
    pub attendance_columns: AttendanceColumns,
    pub service_columns: ServiceColumns,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            identical_preference: IdenticalPreference::default(),
            use_schedule_when_missing: false,
            candidate_delimiter: DEFAULT_CANDIDATE_DELIMITER.to_string(),
            attendance_columns: AttendanceColumns::default(),
            service_columns: ServiceColumns::default(),
        }
    }
}

impl ReconcileOptions {
    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.candidate_delimiter.is_empty() {
            return Err(ReconError::InvalidConfig(
                "candidate delimiter must not be empty".to_string(),
            ));
        }
        if self.attendance_columns.slots == 0 {
            return Err(ReconError::InvalidConfig(
                "attendance slot count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
