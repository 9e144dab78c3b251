use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use tallyboard::recompute::RecomputeContext;
use tallyboard::storage::InMemoryStores;
use tallyboard::{aggregate, aggregate_all, ChartSpec, ChartType, Field, Granularity, Record, VersionedStore};

const SEXES: [&str; 2] = ["M", "F"];
const BLOOD: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const JOBS: [&str; 6] = ["Engineer", "Pilot", "Cook", "Nurse", "Teacher", "Clerk"];

// 10k people spread over a century of birthdates.
fn people(n: i64) -> Vec<Record> {
    let epoch = NaiveDate::from_ymd_opt(1920, 1, 1).unwrap();
    (1..=n)
        .map(|i| {
            let idx = usize::try_from(i).unwrap();
            let birthdate = epoch + chrono::Duration::days((i * 37) % 36_500);
            Record::new(
                i,
                birthdate,
                SEXES[idx % SEXES.len()],
                BLOOD[idx % BLOOD.len()],
                JOBS[idx % JOBS.len()],
                "Acme",
            )
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let records = people(10_000);
    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(records.len() as u64));

    let simple = ChartSpec::new("Blood", ChartType::Pie, vec![Field::BloodGroup]).with_id(1);
    group.bench_function("simple_blood_group", |b| {
        b.iter(|| black_box(aggregate(black_box(&records), &simple)));
    });

    let decades = ChartSpec::new("Decades", ChartType::Spline, vec![Field::Birthdate, Field::BloodGroup])
        .with_id(2)
        .with_count_by(Granularity::Decades);
    group.bench_function("cross_tab_decades", |b| {
        b.iter(|| black_box(aggregate(black_box(&records), &decades)));
    });

    let years = decades.clone().with_count_by(Granularity::Years);
    group.bench_function("cross_tab_years", |b| {
        b.iter(|| black_box(aggregate(black_box(&records), &years)));
    });

    let defaults = ChartSpec::defaults();
    group.bench_function("default_board", |b| {
        b.iter(|| black_box(aggregate_all(black_box(&records), &defaults)));
    });

    group.finish();
}

fn bench_recompute_pass(c: &mut Criterion) {
    let stores = InMemoryStores::new();
    stores.records.replace_all(people(10_000)).unwrap();
    stores.charts.replace_all(ChartSpec::defaults()).unwrap();

    let mut ctx = RecomputeContext::new();
    ctx.refresh(&stores.records, &stores.charts).unwrap();

    c.bench_function("recompute/pass_cached_snapshot", |b| {
        b.iter(|| black_box(ctx.recompute()));
    });
}

criterion_group!(aggregate_benches, bench_aggregate, bench_recompute_pass);
criterion_main!(aggregate_benches);
