//! Benchmarks for mention-template resolution
//!
//! This benchmark measures:
//! - Resolution of templates with and without mentions
//! - Stringification of large structured predecessor results

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use ai_flow_rust::template::{parse_mentions, resolve};
use ai_flow_rust::types::{Block, BlockResult};

fn blocks_with_text() -> Vec<Block> {
    vec![
        Block::input("seed", "The quick brown fox jumps over the lazy dog"),
        Block::generate("writer", ""),
    ]
}

fn blocks_with_array(len: usize) -> Vec<Block> {
    let items: Vec<_> = (0..len)
        .map(|i| json!({"title": format!("item {i}"), "score": i}))
        .collect();
    vec![
        Block::generate("items", "list").with_result(BlockResult::Structured(json!(items))),
        Block::generate("writer", ""),
    ]
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_resolution");

    let plain = "Write a haiku about autumn leaves falling on a quiet river.".repeat(8);
    let single = "Expand on: @[seed](block-1) and keep it short.";
    let repeated = "@[seed](block-1) / ".repeat(32);
    let text_blocks = blocks_with_text();

    group.throughput(Throughput::Bytes(plain.len() as u64));
    group.bench_function("no_mentions", |b| {
        b.iter(|| resolve(black_box(&plain), &text_blocks, 1))
    });
    group.bench_function("single_mention", |b| {
        b.iter(|| resolve(black_box(single), &text_blocks, 1))
    });
    group.bench_function("repeated_mentions", |b| {
        b.iter(|| resolve(black_box(&repeated), &text_blocks, 1))
    });

    for len in [10usize, 100, 1000] {
        let blocks = blocks_with_array(len);
        group.bench_with_input(
            BenchmarkId::new("array_result", len),
            &blocks,
            |b, blocks| b.iter(|| resolve(black_box("Rank: @[items](b)"), blocks, 1)),
        );
    }

    group.finish();
}

fn bench_parsing(c: &mut Criterion) {
    let template = "Compare @[left](block-1) with @[right](block-2), ignoring @[broken](".repeat(16);
    c.bench_function("parse_mentions", |b| {
        b.iter(|| parse_mentions(black_box(&template)))
    });
}

criterion_group!(benches, bench_resolution, bench_parsing);
criterion_main!(benches);
