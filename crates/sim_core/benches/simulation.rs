//! Simulation benchmarks for sim_core.
//!
//! Run with: `cargo bench -p sim_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::attack_table::{AttackTable, AttackerProfile, SwingKind};
use sim_core::character::Simulator;
use sim_core::stats::TargetStats;
use sim_test_utils::fixtures;

/// One full 60 s iteration per class.
pub fn iteration_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration_60s");
    for spec in fixtures::all_characters() {
        let Ok(sim) = Simulator::from_spec(&spec) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(&spec.name), &sim, |b, sim| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(sim.simulate(&mut rng)));
        });
    }
    group.finish();
}

/// Building and sampling an attack table.
pub fn attack_table_benchmark(c: &mut Criterion) {
    let attacker = AttackerProfile {
        level: 60,
        weapon_skill: 305,
        hit: 0.06,
        crit: 0.25,
    };
    let target = TargetStats::default();

    c.bench_function("attack_table_build", |b| {
        b.iter(|| AttackTable::new(black_box(&attacker), black_box(&target), SwingKind::White, true));
    });

    let table = AttackTable::new(&attacker, &target, SwingKind::White, true);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    c.bench_function("attack_table_roll", |b| {
        b.iter(|| black_box(table.roll(&mut rng)));
    });
}

criterion_group!(benches, iteration_benchmark, attack_table_benchmark);
criterion_main!(benches);
