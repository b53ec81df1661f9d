use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use chain_contention::{Coordinator, OrderedChain, SharedPools, SimConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn shuffled(n: u32) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(42);
    SharedPools::shuffled(n, &mut rng).snapshot().available
}

fn benchmark_chain_insert(c: &mut Criterion) {
    let items = shuffled(1_000);
    c.bench_function("chain_insert_1k_shuffled", |b| {
        b.iter_batched(
            OrderedChain::new,
            |chain| {
                for &v in &items {
                    chain.insert(v);
                }
                chain
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_chain_search(c: &mut Criterion) {
    let chain = OrderedChain::new();
    for v in shuffled(1_000) {
        chain.insert(v);
    }
    c.bench_function("chain_search_miss_1k", |b| b.iter(|| chain.search(5_000)));
}

fn benchmark_full_run(c: &mut Criterion) {
    let coordinator = Coordinator::new(SimConfig {
        worker_count: 8,
        universe_size: 2_000,
        seed: Some(42),
        ..SimConfig::default()
    })
    .expect("valid config");
    c.bench_function("run_2k_items_8_workers", |b| {
        b.iter(|| coordinator.run().expect("run succeeds"))
    });
}

criterion_group!(benches, benchmark_chain_insert, benchmark_chain_search, benchmark_full_run);
criterion_main!(benches);
