use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use cursor_hashmap::CursorHashMap;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("cursor_hashmap_insert_10k", |b| {
        b.iter_batched(
            CursorHashMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("cursor_hashmap_get_hit", |b| {
        let mut m = CursorHashMap::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k.as_str()));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("cursor_hashmap_get_miss", |b| {
        let mut m = CursorHashMap::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.get(k.as_str()));
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("cursor_hashmap_iter_10k", |b| {
        let mut m = CursorHashMap::new();
        for (i, x) in lcg(23).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_churn(c: &mut Criterion) {
    // Insert/remove cycles against a warm map: exercises the index entry
    // path, chain splicing and the quiescent fast path that frees slots
    // without tombstoning.
    c.bench_function("cursor_hashmap_churn", |b| {
        let mut m = CursorHashMap::new();
        let keys: Vec<_> = lcg(31).take(4_096).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let v = m.remove(k.as_str()).unwrap();
            m.insert(k.clone(), v);
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_miss, bench_iterate, bench_churn
}
criterion_main!(benches);
