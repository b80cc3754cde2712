//! Benchmarks for plugin dispatch and the synthesis pass.
//!
//! Run with: cargo bench -p arvak-hls

use arvak_hls::synthesis::token_swapper::synth_permutation_token_swapper;
use arvak_hls::{
    BasisGates, CouplingMap, HighLevelSynthesis, PluginRegistry, PropertySet, ResourceContext,
};
use arvak_ir::{Circuit, HighLevelOperation, Modifier};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn shuffled(n: usize, seed: u64) -> Vec<usize> {
    let mut pattern: Vec<usize> = (0..n).collect();
    pattern.shuffle(&mut SmallRng::seed_from_u64(seed));
    pattern
}

fn bench_mcx_variants(c: &mut Criterion) {
    let registry = PluginRegistry::standard();
    let mut group = c.benchmark_group("mcx_default");
    for (clean, dirty) in [(0, 0), (1, 0), (0, 12), (12, 0)] {
        let ctx = ResourceContext::new().with_ancillas(clean, dirty);
        let op = HighLevelOperation::mcx(12);
        group.bench_with_input(
            BenchmarkId::new("k12", format!("c{clean}_d{dirty}")),
            &op,
            |b, op| {
                b.iter(|| registry.run_method("mcx.default", black_box(op), &ctx).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_token_swapper(c: &mut Criterion) {
    let mut group = c.benchmark_group("permutation_token_swapper");
    for n in [8, 32, 64] {
        let pattern = shuffled(n, 7);
        let coupling = CouplingMap::linear(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &pattern, |b, pattern| {
            b.iter(|| {
                synth_permutation_token_swapper(black_box(pattern), Some(&coupling), 5, 0, 50)
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_pass(c: &mut Criterion) {
    let mut circuit = Circuit::with_size("bench", 10, 0);
    circuit
        .high_level(HighLevelOperation::mcx(6), arvak_ir::qubits(0..7))
        .unwrap()
        .high_level(HighLevelOperation::qft(5), arvak_ir::qubits(3..8))
        .unwrap()
        .high_level(
            HighLevelOperation::annotated(HighLevelOperation::qft(3), vec![Modifier::control(2)]),
            arvak_ir::qubits(5..10),
        )
        .unwrap();
    let properties = PropertySet::new().with_basis_gates(BasisGates::minimal());
    let pass = HighLevelSynthesis::default();

    c.bench_function("hls_pass_mixed", |b| {
        b.iter(|| pass.run_on_circuit(black_box(&circuit), &properties).unwrap());
    });
}

criterion_group!(benches, bench_mcx_variants, bench_token_swapper, bench_pass);
criterion_main!(benches);
