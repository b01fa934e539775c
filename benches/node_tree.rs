//! Node tree benchmarks: rebuilds, cached rendering and hit-testing.
//!
//! Run with: cargo bench --bench node_tree

#![allow(missing_docs)] // criterion macros generate undocumented items

use chatweave::model::Message;
use chatweave::view_state::hit_test::hit_test;
use chatweave::view_state::NodeTree;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ratatui::layout::Rect;

fn conversation(len: usize) -> Vec<Message> {
    (0..len)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(format!("question {i}"))
            } else {
                Message::assistant(format!(
                    "<think>reasoning for {i}</think>{}",
                    "answer text ".repeat(40)
                ))
            }
        })
        .collect()
}

fn bench_set_messages(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_messages");
    for len in [100usize, 1_000] {
        let messages = conversation(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &messages, |b, msgs| {
            b.iter_batched(
                || msgs.clone(),
                |msgs| {
                    let mut tree = NodeTree::new();
                    tree.set_messages(msgs);
                    black_box(tree.node_count())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_total_height(c: &mut Criterion) {
    let mut tree = NodeTree::new();
    tree.set_messages(conversation(1_000));
    // Warm the render caches.
    tree.calculate_total_height(120);

    c.bench_function("calculate_total_height_cached", |b| {
        b.iter(|| black_box(tree.calculate_total_height(black_box(120))));
    });
    c.bench_function("calculate_total_height_resize", |b| {
        let mut width = 80;
        b.iter(|| {
            width = if width == 80 { 81 } else { 80 };
            black_box(tree.calculate_total_height(width))
        });
    });
}

fn bench_hit_test(c: &mut Criterion) {
    let mut tree = NodeTree::new();
    tree.set_messages(conversation(1_000));
    let ids: Vec<_> = tree.nodes().iter().map(|n| n.id()).collect();
    for (row, id) in ids.into_iter().enumerate() {
        let y = u16::try_from(row * 2).unwrap_or(u16::MAX);
        tree.update_node_bounds(id, Rect::new(0, y, 120, 1)).unwrap();
    }

    c.bench_function("hit_test_last_node", |b| {
        b.iter(|| black_box(hit_test(tree.nodes(), black_box(10), black_box(1_998))));
    });
}

criterion_group!(benches, bench_set_messages, bench_total_height, bench_hit_test);
criterion_main!(benches);
