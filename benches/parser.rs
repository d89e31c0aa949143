// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for parsing and reporting.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Decimal parsing and expression evaluation
//! - Buffered and streaming parsing of in-memory ledgers
//! - Include fan-out, parallel against sequential
//! - Balance aggregation and period grouping

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ledger_rs::{
    FixedDecimal, LedgerParser, ParseOptions, Period, RangeType, balances, balances_by_period,
    expr, parse_ledger, parse_ledger_streaming,
};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn make_ledger(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                "2024/{:02}/{:02} Payee {i}\n    Expenses:Cat{}:Sub{}  ({}.{:02} * 2)\n    Assets:Bank\n\n",
                i % 12 + 1,
                i % 28 + 1,
                i % 7,
                i % 3,
                i % 500,
                i % 100,
            )
        })
        .collect()
}

fn make_include_tree(files: usize, per_file: usize) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("parts")).unwrap();
    for f in 0..files {
        fs::write(dir.path().join(format!("parts/{f}.ledger")), make_ledger(per_file)).unwrap();
    }
    let main = dir.path().join("main.ledger");
    fs::write(&main, "include parts/*.ledger\n").unwrap();
    (dir, main)
}

// =============================================================================
// Primitive Benchmarks
// =============================================================================

fn bench_decimal_parse(c: &mut Criterion) {
    c.bench_function("decimal_parse", |b| {
        b.iter(|| FixedDecimal::from_string(black_box("-123456.789")).unwrap())
    });
}

fn bench_expression(c: &mut Criterion) {
    c.bench_function("expression", |b| {
        b.iter(|| expr::evaluate(black_box("(12.5 + 7.25) * 3 / (2 - 0.5)")).unwrap())
    });
}

// =============================================================================
// Parsing Benchmarks
// =============================================================================

fn bench_buffered_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered_parse");

    for count in [100usize, 1_000, 10_000].iter() {
        let ledger = make_ledger(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &ledger, |b, ledger| {
            b.iter(|| parse_ledger("bench", black_box(ledger.as_bytes())).unwrap())
        });
    }

    group.finish();
}

fn bench_streaming_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming_parse");

    for count in [1_000usize, 10_000].iter() {
        let ledger = make_ledger(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &ledger, |b, ledger| {
            b.iter(|| {
                let bytes = ledger.clone().into_bytes();
                parse_ledger_streaming("bench", Cursor::new(bytes)).count()
            })
        });
    }

    group.finish();
}

fn bench_include_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("include_fan_out");
    let (_dir, main) = make_include_tree(16, 1_000);
    group.throughput(Throughput::Elements(16_000));

    for parallel in [true, false] {
        let options = ParseOptions {
            parallel_includes: parallel,
            ..ParseOptions::default()
        };
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| LedgerParser::with_options(options).parse_file(&main).unwrap())
        });
    }

    group.finish();
}

// =============================================================================
// Reporting Benchmarks
// =============================================================================

fn bench_balances(c: &mut Criterion) {
    let transactions = parse_ledger("bench", make_ledger(10_000).as_bytes()).unwrap();

    c.bench_function("balances_unfiltered", |b| {
        b.iter(|| balances::<&str>(black_box(&transactions), &[]))
    });
    c.bench_function("balances_filtered", |b| {
        b.iter(|| balances(black_box(&transactions), &["Cat3"]))
    });
}

fn bench_periods(c: &mut Criterion) {
    let transactions = parse_ledger("bench", make_ledger(10_000).as_bytes()).unwrap();
    let mut group = c.benchmark_group("balances_by_period");

    for period in [Period::Week, Period::Month, Period::Quarter] {
        group.bench_function(period.name(), |b| {
            b.iter(|| balances_by_period(black_box(&transactions), period, RangeType::Snapshot))
        });
    }

    group.finish();
}

criterion_group!(primitives, bench_decimal_parse, bench_expression,);

criterion_group!(
    parsing,
    bench_buffered_parse,
    bench_streaming_parse,
    bench_include_fan_out,
);

criterion_group!(reporting, bench_balances, bench_periods,);

criterion_main!(primitives, parsing, reporting);
