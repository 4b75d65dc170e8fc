use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use scalar_maps::{LinkedHashMap, MapCore, OpenHashMap};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// 10k indices in 0..n, drawn with a second LCG so they differ from the keys.
fn picks(n: usize) -> Vec<usize> {
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..10_000)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            (s as usize) % n
        })
        .collect()
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("open::insert_fresh_100k", |b| {
        b.iter_batched(
            OpenHashMap::<u64, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(x, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("linked::insert_fresh_100k", |b| {
        b.iter_batched(
            LinkedHashMap::<u64, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(x, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("open::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut m = OpenHashMap::<u64, u64>::new();
                m.reserve(100_000);
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    m.put(x, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_10k(c: &mut Criterion) {
    c.bench_function("open::get_hit_10k_on_100k", |b| {
        let keys: Vec<u64> = lcg(7).take(100_000).collect();
        let m: OpenHashMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        let queries: Vec<u64> = picks(keys.len()).into_iter().map(|i| keys[i]).collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.get(k));
            }
        })
    });

    c.bench_function("linked::get_hit_10k_on_100k", |b| {
        let keys: Vec<u64> = lcg(7).take(100_000).collect();
        let m: LinkedHashMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        let queries: Vec<u64> = picks(keys.len()).into_iter().map(|i| keys[i]).collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.get(k));
            }
        })
    });
}

fn bench_get_miss_10k(c: &mut Criterion) {
    c.bench_function("open::get_miss_10k_on_100k", |b| {
        let m: OpenHashMap<u64, u64> = lcg(11).take(100_000).map(|k| (k, k)).collect();
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                if let Some(k) = miss.next() {
                    black_box(m.get(&k));
                }
            }
        })
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("open::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let keys: Vec<u64> = lcg(5).take(110_000).collect();
                let m: OpenHashMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
                let doomed: Vec<u64> = picks(keys.len()).into_iter().map(|i| keys[i]).collect();
                (m, doomed)
            },
            |(mut m, doomed)| {
                for k in &doomed {
                    m.remove(k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("linked::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let keys: Vec<u64> = lcg(5).take(110_000).collect();
                let m: LinkedHashMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
                let doomed: Vec<u64> = picks(keys.len()).into_iter().map(|i| keys[i]).collect();
                (m, doomed)
            },
            |(mut m, doomed)| {
                for k in &doomed {
                    m.remove(k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_add_to_10k(c: &mut Criterion) {
    c.bench_function("open::add_to_10k_on_1k_keys", |b| {
        let keys: Vec<u64> = lcg(17).take(1_000).collect();
        let ops: Vec<u64> = picks(keys.len()).into_iter().map(|i| keys[i]).collect();
        b.iter_batched(
            OpenHashMap::<u64, u64>::new,
            |mut m| {
                for &k in &ops {
                    m.add_to(k, 1);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_linked_reorder(c: &mut Criterion) {
    c.bench_function("linked::get_and_move_to_first_10k_on_100k", |b| {
        b.iter_batched(
            || {
                let keys: Vec<u64> = lcg(23).take(100_000).collect();
                let m: LinkedHashMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
                let touched: Vec<u64> = picks(keys.len()).into_iter().map(|i| keys[i]).collect();
                (m, touched)
            },
            |(mut m, touched)| {
                for k in &touched {
                    black_box(m.get_and_move_to_first(k));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("linked::poll_last_all_100k", |b| {
        b.iter_batched(
            || lcg(29).take(100_000).map(|k| (k, k)).collect::<LinkedHashMap<u64, u64>>(),
            |mut m| {
                while let Some(k) = m.poll_last_key() {
                    black_box(k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter_100k(c: &mut Criterion) {
    c.bench_function("open::iter_all_100k", |b| {
        let m: OpenHashMap<u64, u64> = lcg(999).take(100_000).map(|k| (k, k)).collect();
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("linked::iter_all_100k", |b| {
        let m: LinkedHashMap<u64, u64> = lcg(999).take(100_000).map(|k| (k, k)).collect();
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_reserved_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_get_hit_10k,
              bench_get_miss_10k,
              bench_remove_random_10k,
              bench_add_to_10k,
              bench_linked_reorder,
              bench_iter_100k
}
criterion_main!(benches_insert, benches_ops);
