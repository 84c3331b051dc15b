use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use mesh_decomp::prelude::*;

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    group.sample_size(10);
    let mesh = hex_grid(16, 16, 16, &MeshGenOptions::default()).expect("mesh");
    let mut rng = SmallRng::seed_from_u64(42);
    for &n_parts in &[2usize, 8, 32] {
        // random labelling: worst case for communication maps
        let parts = (0..mesh.num_elements())
            .map(|_| rng.gen_range(0..n_parts))
            .collect();
        let asg = PartitionAssignment::new(parts, n_parts).expect("assignment");
        group.bench_with_input(BenchmarkId::new("random", n_parts), &asg, |b, asg| {
            b.iter(|| decompose(&mesh, asg).expect("decompose"))
        });

        let config = DecompositionConfig::with_parts(n_parts);
        let native = partition_mesh(&mesh, &NativePartitioner::default(), &config).expect("partition");
        group.bench_with_input(BenchmarkId::new("native", n_parts), &native, |b, asg| {
            b.iter(|| decompose(&mesh, asg).expect("decompose"))
        });
    }
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mesh = hex_grid(16, 16, 16, &MeshGenOptions::default()).expect("mesh");
    let graph = AdjacencyGraph::from_mesh(&mesh).expect("graph");
    let mut group = c.benchmark_group("native_partitioner");
    for &n_parts in &[4usize, 16] {
        let config = DecompositionConfig::with_parts(n_parts);
        group.bench_with_input(BenchmarkId::from_parameter(n_parts), &config, |b, config| {
            b.iter(|| {
                mesh_decomp::partitioning::partition_graph(&graph, &NativePartitioner::default(), config)
                    .expect("partition")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decompose, bench_partition);
criterion_main!(benches);
