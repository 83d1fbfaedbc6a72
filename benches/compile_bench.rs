//! Criterion benchmarks for sheet parsing and payload compilation

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::path::PathBuf;

use floorcalc::services::normalizer::{norm_category, norm_service};
use floorcalc::services::{compile, parse_rows};

const HEADER: &str = "Category,Tier,Min,Max,Grit 200,Grit 400,Grit 800,Grit 1800,Base,Single,Metallic,Quartz,Flake,Service";

fn load_fixture() -> String {
    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("pricing-sample.csv");

    std::fs::read_to_string(&fixture).unwrap_or_default()
}

/// A sheet far larger than any real one, cycling through every category
fn synthetic_sheet(rows: usize) -> String {
    let mut sheet = String::from(HEADER);
    sheet.push('\n');
    for i in 0..rows {
        let min = i * 100;
        let max = min + 99;
        let line = match i % 5 {
            0 => format!("Polished,Tier {i},{min},{max},3,4,5,8,,,,,,"),
            1 => format!("Sealed,Tier {i},{min},{max},,,,,2.25,,,,,"),
            2 => format!("Epoxy Floors,Tier {i},{min},{max},,,,,,4,7.5,6,5,"),
            3 => format!("Other,Tier {i},{min},{max},6.5,,,,,,,,,Driveway / Patio"),
            _ => format!("Stamped,Tier {i},{min},{max},,,,,,,,,,"),
        };
        sheet.push_str(&line);
        sheet.push('\n');
    }
    sheet
}

fn bench_parse_rows(c: &mut Criterion) {
    let text = load_fixture();
    if text.is_empty() {
        eprintln!("Warning: pricing fixture is empty or not found");
        return;
    }

    let mut group = c.benchmark_group("sheet");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("parse_rows (fixture)", |b| {
        b.iter(|| parse_rows(black_box(&text)));
    });
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("sheet");

    for rows in [10usize, 1_000, 10_000] {
        let text = synthetic_sheet(rows);
        let parsed = parse_rows(&text);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("compile", rows), &parsed, |b, parsed| {
            b.iter(|| compile(black_box(parsed)));
        });
        group.bench_with_input(BenchmarkId::new("parse_and_compile", rows), &text, |b, text| {
            b.iter(|| compile(&parse_rows(black_box(text))));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalizer");
    group.bench_function("norm_category", |b| {
        b.iter(|| norm_category(black_box("  Polished   Concrete ")));
    });
    group.bench_function("norm_service", |b| {
        b.iter(|| norm_service(black_box("Driveway / Patio")));
    });
    group.finish();
}

criterion_group!(benches, bench_parse_rows, bench_compile, bench_normalize);
criterion_main!(benches);
