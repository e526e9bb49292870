//! Benchmarks comparing nexus-containers against the std collections.
//!
//! Run with: cargo bench

use std::collections::{BinaryHeap, LinkedList, VecDeque};

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_containers::{Deque, List, PriorityQueue};

const SIZE: usize = 10_000;

/// Deterministic scramble so heap inputs are not pre-sorted.
fn scrambled(i: usize) -> u64 {
    ((i * 7919 + 13) % SIZE) as u64
}

// ============================================================================
// PriorityQueue
// ============================================================================

fn bench_heap_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_push_pop");
    group.throughput(Throughput::Elements(SIZE as u64));

    let mut queue = PriorityQueue::with_capacity(SIZE, |a: &u64, b: &u64| a < b);
    group.bench_function("nexus/priority_queue", |b| {
        b.iter(|| {
            for i in 0..SIZE {
                black_box(queue.push(scrambled(i)));
            }
            while let Some(v) = queue.pop() {
                black_box(v);
            }
        });
    });

    let mut heap = BinaryHeap::with_capacity(SIZE);
    group.bench_function("std/binary_heap", |b| {
        b.iter(|| {
            for i in 0..SIZE {
                heap.push(std::cmp::Reverse(scrambled(i)));
            }
            while let Some(v) = heap.pop() {
                black_box(v);
            }
        });
    });

    group.finish();
}

fn bench_heap_remove_by_handle(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap_remove_by_handle");
    group.throughput(Throughput::Elements(SIZE as u64 / 2));

    group.bench_function("nexus/priority_queue", |b| {
        b.iter_batched(
            || {
                let mut queue = PriorityQueue::with_capacity(SIZE, |a: &u64, b: &u64| a < b);
                let handles: Vec<_> = (0..SIZE).map(|i| queue.push(scrambled(i))).collect();
                (queue, handles)
            },
            |(mut queue, handles)| {
                for h in handles.iter().step_by(2) {
                    black_box(queue.remove(*h));
                }
                queue
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

// ============================================================================
// Deque
// ============================================================================

fn bench_deque_fifo(c: &mut Criterion) {
    let mut group = c.benchmark_group("deque_fifo");
    group.throughput(Throughput::Elements(SIZE as u64));

    let mut deque = Deque::with_capacity(SIZE);
    group.bench_function("nexus/deque", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                deque.push_back(black_box(i));
            }
            while let Some(v) = deque.pop_front() {
                black_box(v);
            }
        });
    });

    let mut std_deque = VecDeque::with_capacity(SIZE);
    group.bench_function("std/vec_deque", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                std_deque.push_back(black_box(i));
            }
            while let Some(v) = std_deque.pop_front() {
                black_box(v);
            }
        });
    });

    group.finish();
}

// ============================================================================
// List
// ============================================================================

fn bench_list_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_push_pop");
    group.throughput(Throughput::Elements(SIZE as u64));

    let mut list = List::with_capacity(SIZE);
    group.bench_function("nexus/list", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                black_box(list.push_back(i));
            }
            while let Some(v) = list.pop_front() {
                black_box(v);
            }
        });
    });

    let mut std_list = LinkedList::new();
    group.bench_function("std/linked_list", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                std_list.push_back(black_box(i));
            }
            while let Some(v) = std_list.pop_front() {
                black_box(v);
            }
        });
    });

    group.finish();
}

fn bench_list_move_to_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_move_to_front");
    group.throughput(Throughput::Elements(SIZE as u64));

    let mut list = List::with_capacity(SIZE);
    let handles: Vec<_> = (0..SIZE as u64).map(|i| list.push_back(i)).collect();

    group.bench_function("nexus/list", |b| {
        b.iter(|| {
            for i in 0..SIZE {
                list.move_to_front(handles[scrambled(i) as usize]);
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_heap_push_pop,
    bench_heap_remove_by_handle,
    bench_deque_fifo,
    bench_list_push_pop,
    bench_list_move_to_front,
);
criterion_main!(benches);
