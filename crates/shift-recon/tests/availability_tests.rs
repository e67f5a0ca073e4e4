//! Tests for the busy index and substitute-candidate search.

use chrono::NaiveDate;
use shift_recon::audit::RunAudit;
use shift_recon::availability::{find_substitutes, union_candidates, BusyIndex};
use shift_recon::config::{AttendanceColumns, ServiceColumns};
use shift_recon::interval::TimeInterval;
use shift_recon::schedule::{build_schedule_index, WorkerScheduleIndex};
use shift_recon::table::{AttendanceTable, RawTable, ServiceTable};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn schedules(rows: &[(&str, &str, &str)]) -> WorkerScheduleIndex {
    let raw = RawTable::new(
        "attendance",
        vec!["*年月日".into(), "名前".into(), "出勤1".into(), "退勤1".into()],
        rows.iter()
            .map(|(name, start, end)| {
                vec!["2026/03/01".into(), name.to_string(), start.to_string(), end.to_string()]
            })
            .collect(),
    );
    let table = AttendanceTable::from_raw(&raw, &AttendanceColumns::default()).unwrap();
    build_schedule_index(&table, false, &mut RunAudit::default())
}

fn facility(name: &str, rows: &[(&str, &str, &str)]) -> ServiceTable {
    let raw = RawTable::new(
        name,
        vec!["西暦日付".into(), "担当所員".into(), "開始時間".into(), "終了時間".into()],
        rows.iter()
            .map(|(worker, start, end)| {
                vec!["2026/03/01".into(), worker.to_string(), start.to_string(), end.to_string()]
            })
            .collect(),
    );
    ServiceTable::from_raw(&raw, &ServiceColumns::default()).unwrap()
}

fn iv(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> TimeInterval {
    let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    TimeInterval::from_minutes(date, start_hour * 60 + start_min, end_hour * 60 + end_min).unwrap()
}

// ── BusyIndex ───────────────────────────────────────────────────────────────

#[test]
fn busy_index_merges_commitments_across_facilities() {
    let tables = vec![
        facility("A", &[("山田", "9:00", "10:00"), ("山田", "13:00", "14:00")]),
        facility("B", &[("山田", "9:30", "11:00")]),
    ];
    let busy = BusyIndex::build(&tables);

    assert_eq!(busy.intervals("山田"), &[iv(9, 0, 11, 0), iv(13, 0, 14, 0)]);
    assert!(busy.is_busy("山田", &iv(10, 30, 10, 45)));
    assert!(!busy.is_busy("山田", &iv(11, 0, 13, 0)));
    assert!(busy.intervals("佐藤").is_empty());
}

// ── find_substitutes ────────────────────────────────────────────────────────

#[test]
fn free_and_covered_worker_is_candidate_busy_one_is_not() {
    let index = schedules(&[
        ("X", "8:00", "12:00"),
        ("Y", "8:00", "12:00"),
        ("Z", "8:00", "12:00"),
    ]);
    let busy = BusyIndex::build(&[facility("A", &[("X", "9:00", "10:00"), ("Z", "9:30", "9:45")])]);

    let found = find_substitutes(&iv(9, 0, 10, 0), "X", &index, &busy);

    assert_eq!(found, vec!["Y".to_string()]);
}

#[test]
fn containment_is_strict() {
    let index = schedules(&[("X", "8:00", "12:00"), ("Y", "9:01", "12:00")]);
    let busy = BusyIndex::default();

    assert!(find_substitutes(&iv(9, 0, 10, 0), "X", &index, &busy).is_empty());
}

#[test]
fn adjacent_commitment_does_not_block() {
    let index = schedules(&[("Y", "8:00", "12:00")]);
    let busy = BusyIndex::build(&[facility("A", &[("Y", "10:00", "11:00")])]);

    assert_eq!(
        find_substitutes(&iv(9, 0, 10, 0), "X", &index, &busy),
        vec!["Y".to_string()]
    );
}

#[test]
fn candidates_use_display_name_in_identity_order() {
    let index = schedules(&[
        ("〇佐藤　花子", "8:00", "12:00"),
        ("ＡＢＥ", "8:00", "12:00"),
    ]);
    let busy = BusyIndex::default();

    let found = find_substitutes(&iv(9, 0, 10, 0), "nobody", &index, &busy);

    // "ABE" sorts before "佐藤 花子".
    assert_eq!(found, vec!["ＡＢＥ".to_string(), "〇佐藤　花子".to_string()]);
}

#[test]
fn union_keeps_existing_order_and_appends_new_names() {
    let mut list = vec!["B".to_string(), "A".to_string()];
    union_candidates(&mut list, vec!["A".into(), "C".into(), "B".into()]);
    assert_eq!(list, vec!["B", "A", "C"]);
}
