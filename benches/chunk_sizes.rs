use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use csv_insight::profile::profile_path;
use encoding_rs::UTF_8;
use tempfile::TempDir;

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "order_date,status,amount").expect("header");
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        let day = (i % 28) + 1;
        writeln!(file, "2024-01-{day:02},{status},{}", (i % 500) as f64 / 4.0).expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let (_temp_dir, csv_path) = generate_orders(50_000);
    let mut group = c.benchmark_group("profile_chunk_sizes");
    for chunk_rows in [100usize, 1_000, 10_000, 50_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_rows),
            &chunk_rows,
            |b, &chunk_rows| {
                b.iter(|| {
                    profile_path(&csv_path, b',', UTF_8, chunk_rows, None).expect("profile")
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_chunk_sizes);
criterion_main!(benches);
