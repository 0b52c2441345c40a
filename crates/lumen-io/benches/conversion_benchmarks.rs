//! Performance benchmarks for photometric conversion
//!
//! This benchmark suite measures the performance of:
//! - Format detection over every registered codec
//! - Parsing IES files of various grid sizes
//! - Full conversions, including CIE grid resampling
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p lumen-io
//!
//! # Run specific benchmark
//! cargo bench -p lumen-io -- convert
//! ```
//!
//! ## Performance Targets
//!
//! | Operation | 19 x 5 | 37 x 25 | 181 x 73 | Target |
//! |-----------|--------|---------|----------|--------|
//! | Detect | <50us | <200us | <2ms | <5ms for any |
//! | Convert | <100us | <500us | <5ms | <10ms for any |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lumen_core::PhotometricRecord;
use lumen_io::{Codec, ConversionManager, Format, IesCodec, WriteOptions};

/// Synthetic grids with different sizes
struct TestCase {
    name: &'static str,
    vertical: usize,
    horizontal: usize,
}

impl TestCase {
    const fn new(name: &'static str, vertical: usize, horizontal: usize) -> Self {
        Self {
            name,
            vertical,
            horizontal,
        }
    }
}

const TEST_CASES: &[TestCase] = &[
    TestCase::new("19x5", 19, 5),
    TestCase::new("37x25", 37, 25),
    TestCase::new("181x73", 181, 73),
];

/// Cosine-shaped Type C distribution over a half circle, written as IES.
fn ies_fixture(case: &TestCase) -> Vec<u8> {
    let mut record = PhotometricRecord::new();
    record.metadata.manufacturer = "Bench".into();
    record.metadata.catalog_number = case.name.into();
    record.photometry.luminous_flux = 1000.0;
    record.photometry.vertical_angles = (0..case.vertical)
        .map(|i| i as f64 * 180.0 / (case.vertical - 1) as f64)
        .collect();
    record.photometry.horizontal_angles = (0..case.horizontal)
        .map(|i| i as f64 * 180.0 / (case.horizontal - 1) as f64)
        .collect();
    record.photometry.candela_values = record
        .photometry
        .vertical_angles
        .iter()
        .map(|gamma| {
            let cd = (gamma.to_radians().cos() * 300.0).max(0.0);
            vec![cd; case.horizontal]
        })
        .collect();
    IesCodec
        .write(&record, &WriteOptions::default())
        .unwrap()
        .bytes
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    let manager = ConversionManager::new();

    for case in TEST_CASES {
        let bytes = ies_fixture(case);
        group.bench_with_input(BenchmarkId::new("ies", case.name), &bytes, |b, bytes| {
            b.iter(|| black_box(manager.detect_format(bytes).unwrap()))
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let manager = ConversionManager::new();

    for case in TEST_CASES {
        let bytes = ies_fixture(case);
        group.bench_with_input(BenchmarkId::new("ies", case.name), &bytes, |b, bytes| {
            b.iter(|| black_box(manager.parse(bytes, Format::Ies).unwrap().record))
        });
    }

    group.finish();
}

/// Every target, so LDT layout and CIE resampling are both covered.
fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let manager = ConversionManager::new();

    for case in TEST_CASES {
        let bytes = ies_fixture(case);
        for target in Format::ALL {
            group.bench_with_input(
                BenchmarkId::new(format!("ies_to_{}", target.id()), case.name),
                &bytes,
                |b, bytes| {
                    b.iter(|| black_box(manager.convert(bytes, Format::Ies, *target).unwrap().bytes))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_detect, bench_parse, bench_convert);
criterion_main!(benches);
