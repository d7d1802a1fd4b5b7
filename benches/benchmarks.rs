use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::time::Duration;

use stately::{create_list, create_patch_store, EventLoop, Memo, Merge, Signal, Throttled};

fn signal_creation_benchmark(c: &mut Criterion) {
    c.bench_function("signal_creation", |b| {
        b.iter(|| {
            let signal: Signal<i32> = Signal::new(black_box(42));
            signal
        });
    });
}

fn signal_read_benchmark(c: &mut Criterion) {
    let signal: Signal<i32> = Signal::new(42);

    c.bench_function("signal_read", |b| {
        b.iter(|| {
            black_box(signal.get());
        });
    });
}

fn signal_write_benchmark(c: &mut Criterion) {
    let signal: Signal<i32> = Signal::new(0);

    c.bench_function("signal_write", |b| {
        let mut i = 0;
        b.iter(|| {
            signal.set(black_box(i));
            i += 1;
        });
    });
}

fn memo_computation_benchmark(c: &mut Criterion) {
    let a: Signal<i32> = Signal::new(5);
    let b: Signal<i32> = Signal::new(10);

    let sum = Memo::new({
        let a = a.clone();
        let b = b.clone();
        move || a.get() + b.get()
    });

    c.bench_function("memo_computation", |b| {
        b.iter(|| {
            black_box(sum.get());
        });
    });
}

fn patch_store_benchmark(c: &mut Criterion) {
    #[derive(Clone)]
    struct State {
        counter: usize,
        name: String,
    }

    struct Patch {
        counter: Option<usize>,
    }

    impl Merge for State {
        type Patch = Patch;

        fn merge(&self, patch: Patch) -> Self {
            State {
                counter: patch.counter.unwrap_or(self.counter),
                name: self.name.clone(),
            }
        }
    }

    let (_state, store) = create_patch_store(State {
        counter: 0,
        name: "test".to_string(),
    });

    c.bench_function("patch_store", |b| {
        let mut i = 0;
        b.iter(|| {
            store.patch(Patch {
                counter: Some(black_box(i)),
            });
            i += 1;
        });
    });
}

fn signal_watch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_watch");

    for subscriber_count in [1, 10, 100].iter() {
        let signal = Signal::new(0usize);
        let guards: Vec<_> = (0..*subscriber_count)
            .map(|_| {
                signal.watch(|_| {
                    // Empty subscriber
                })
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(subscriber_count),
            subscriber_count,
            |b, _| {
                let mut i = 0;
                b.iter(|| {
                    signal.set(black_box(i));
                    i += 1;
                });
            },
        );
        drop(guards);
    }
    group.finish();
}

fn list_push_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_push");

    for len in [10usize, 1_000].iter() {
        let (_list, actions) = create_list((0..*len).collect::<Vec<_>>());
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| {
                actions.push([black_box(1)]);
                actions.reset();
            });
        });
    }
    group.finish();
}

fn throttle_burst_benchmark(c: &mut Criterion) {
    let event_loop = EventLoop::new();
    let signal = Signal::new(0);
    let throttled = Throttled::signal(
        event_loop.clone(),
        Duration::from_millis(16),
        signal.write_only(),
    );

    c.bench_function("throttle_burst", |b| {
        b.iter(|| {
            for n in 0..100 {
                throttled.set(black_box(n));
            }
            event_loop.run_until_idle();
        });
    });
}

criterion_group!(
    benches,
    signal_creation_benchmark,
    signal_read_benchmark,
    signal_write_benchmark,
    memo_computation_benchmark,
    patch_store_benchmark,
    signal_watch_benchmark,
    list_push_benchmark,
    throttle_burst_benchmark,
);
criterion_main!(benches);
