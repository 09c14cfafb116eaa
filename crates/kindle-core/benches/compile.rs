//! Benchmark suite for the Kindle compiler
//!
//! Measures scanning, compilation, and compile-plus-execute throughput on
//! generated expressions of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use kindle_core::bytecode::{Chunk, Heap};
use kindle_core::compiler::compile;
use kindle_core::lexer::Scanner;
use kindle_core::vm::interpret;

/// Generate a left-leaning arithmetic expression with `terms` operands
fn generate_expression(terms: usize) -> String {
    let operators = [" + ", " * ", " - ", " / "];
    let mut source = String::from("1");
    for i in 1..terms {
        source.push_str(operators[i % operators.len()]);
        if i % 7 == 0 {
            source.push_str("(2 - -3)");
        } else {
            source.push_str(&(i % 100).to_string());
        }
    }
    source
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for terms in [10, 100, 1_000] {
        let source = generate_expression(terms);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(terms), &source, |b, source| {
            b.iter(|| black_box(Scanner::tokenize(source).len()));
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for terms in [10, 100, 1_000] {
        let source = generate_expression(terms);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(terms), &source, |b, source| {
            b.iter(|| {
                let mut chunk = Chunk::new();
                let mut heap = Heap::new();
                compile(black_box(source), &mut chunk, &mut heap).ok();
                black_box(chunk.len())
            });
        });
    }

    group.finish();
}

fn bench_interpret(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpret");

    for terms in [10, 100, 1_000] {
        let source = generate_expression(terms);
        group.throughput(Throughput::Elements(terms as u64));
        group.bench_with_input(BenchmarkId::from_parameter(terms), &source, |b, source| {
            b.iter(|| {
                let mut heap = Heap::new();
                black_box(interpret(black_box(source), &mut heap).ok())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_compile, bench_interpret);
criterion_main!(benches);
