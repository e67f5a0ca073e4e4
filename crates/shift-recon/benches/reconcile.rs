use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shift_recon::interval::{merge, TimeInterval};
use shift_recon::{normalize_name, reconcile_raw, RawTable, ReconcileOptions};

const WORKERS: usize = 40;

fn attendance(days: u32) -> RawTable {
    let headers = ["*年月日", "名前", "出勤1", "退勤1", "休憩1", "復帰1"];
    let mut rows = Vec::new();
    for day in 1..=days {
        for w in 0..WORKERS {
            let start = 7 + (w % 4);
            rows.push(vec![
                format!("2026/03/{day:02}"),
                format!("職員{w:02}"),
                format!("{start}:00"),
                format!("{}:00", start + 9),
                "12:00".to_string(),
                "13:00".to_string(),
            ]);
        }
    }
    RawTable::new("勤怠", headers.iter().map(|h| h.to_string()).collect(), rows)
}

fn facility(name: &str, days: u32, offset: usize) -> RawTable {
    let headers = ["西暦日付", "担当所員", "開始時間", "終了時間"];
    let mut rows = Vec::new();
    for day in 1..=days {
        for slot in 0..60 {
            let w = (slot * 7 + offset) % WORKERS;
            let hour = 8 + (slot % 10);
            rows.push(vec![
                format!("2026/03/{day:02}"),
                format!("職員{w:02}"),
                format!("{hour}:{:02}", (slot * 15) % 60),
                format!("{}:{:02}", hour + 1, (slot * 15) % 60),
            ]);
        }
    }
    RawTable::new(name, headers.iter().map(|h| h.to_string()).collect(), rows)
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let options = ReconcileOptions::default();

    for days in [1u32, 7, 28] {
        let attendance = attendance(days);
        let services = vec![
            facility("A", days, 0),
            facility("B", days, 3),
            facility("C", days, 11),
        ];
        group.bench_with_input(BenchmarkId::new("three_facilities", days), &days, |b, _| {
            b.iter(|| reconcile_raw(black_box(&attendance), black_box(&services), &options));
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let intervals: Vec<TimeInterval> = (0..500u32)
        .filter_map(|i| TimeInterval::from_minutes(date, (i * 37) % 1400, (i * 37) % 1400 + 30))
        .collect();

    c.bench_function("merge_500", |b| {
        b.iter(|| merge(black_box(intervals.clone())));
    });
}

fn bench_normalize(c: &mut Criterion) {
    let labels = ["〇大宮　浩子", "★山田・太郎（非常勤）", "ＳＴＡＦＦ０１", "早﨑　友音"];
    c.bench_function("normalize_name", |b| {
        b.iter(|| {
            for label in labels {
                black_box(normalize_name(black_box(label)));
            }
        });
    });
}

criterion_group!(benches, bench_reconcile, bench_merge, bench_normalize);
criterion_main!(benches);
