use mesh_decomp::algs::check_symmetry;
use mesh_decomp::prelude::*;
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn random_assignment(n_elements: usize, n_parts: usize, seed: u64) -> PartitionAssignment {
    let mut rng = SmallRng::seed_from_u64(seed);
    let parts = (0..n_elements).map(|_| rng.gen_range(0..n_parts)).collect();
    PartitionAssignment::new(parts, n_parts).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decomposition_properties(
        nx in 1usize..6,
        ny in 1usize..6,
        n_parts in 1usize..5,
        seed in any::<u64>(),
    ) {
        let mesh = quad_grid(nx, ny, &MeshGenOptions::default()).unwrap();
        let asg = random_assignment(mesh.num_elements(), n_parts, seed);
        let d = decompose(&mesh, &asg).unwrap();

        // local node count splits into internal + boundary
        for b in &d.bundles {
            let lb = &b.load_balance;
            prop_assert_eq!(lb.internal_count() + lb.boundary_count(), b.num_nodes());
        }

        // every element owned exactly once
        let mut owners = vec![0usize; mesh.num_elements()];
        for b in &d.bundles {
            for &e in b.element_map.local_to_global() {
                owners[e] += 1;
            }
        }
        prop_assert!(owners.iter().all(|&c| c == 1));
        let total: usize = d.bundles.iter().map(|b| b.load_balance.element_count).sum();
        prop_assert_eq!(total, mesh.num_elements());

        // round trip through the final numbering
        for b in &d.bundles {
            for (l, &g) in b.node_map.local_to_global().iter().enumerate() {
                prop_assert_eq!(b.node_map.to_local(g), Some(l));
            }
        }

        // containment: every node somewhere; single-partition nodes are internal
        let mut containing = vec![Vec::new(); mesh.num_nodes()];
        for b in &d.bundles {
            for &g in b.node_map.local_to_global() {
                containing[g].push(b.partition);
            }
        }
        for (g, parts) in containing.iter().enumerate() {
            prop_assert!(!parts.is_empty(), "node {} in no partition", g);
            if let [only] = parts.as_slice() {
                let b = &d.bundles[*only];
                let l = b.node_map.to_local(g).unwrap();
                prop_assert!(b.load_balance.comm.internal_nodes().contains(&l));
            }
        }

        // symmetry of shared-node lists
        let comms: Vec<_> = d.bundles.iter().map(|b| b.load_balance.comm.clone()).collect();
        let maps: Vec<_> = d.bundles.iter().map(|b| b.node_map.clone()).collect();
        prop_assert!(check_symmetry(&comms, &maps).is_ok());
        for b in &d.bundles {
            for nb in &b.load_balance.comm.neighbors {
                let other = &d.bundles[nb.partition];
                let back = other.load_balance.comm.neighbor(b.partition).unwrap();
                let mine: Vec<usize> = nb.local_nodes.iter()
                    .map(|&l| b.node_map.to_global(l).unwrap()).collect();
                let theirs: Vec<usize> = back.local_nodes.iter()
                    .map(|&l| other.node_map.to_global(l).unwrap()).collect();
                prop_assert_eq!(mine, theirs);
            }
        }

        // side-set distance factors: one per face node
        for b in &d.bundles {
            for i in 0..b.side_sets.len() {
                let set = b.side_sets.restricted(i).unwrap();
                let expected: usize = set.entries.iter().zip(&set.sides)
                    .map(|(&le, &side)| {
                        let g = b.element_map.to_global(le).unwrap();
                        mesh.side_node_count(g, side).unwrap()
                    })
                    .sum();
                prop_assert_eq!(set.dist_factor_count(), expected);
            }
        }
    }

    #[test]
    fn native_partitions_are_complete(
        nx in 1usize..8,
        ny in 1usize..8,
        n_parts in 1usize..12,
        kway in any::<bool>(),
    ) {
        let mesh = quad_grid(nx, ny, &MeshGenOptions::default()).unwrap();
        prop_assume!(n_parts <= mesh.num_elements());
        let config = DecompositionConfig {
            n_parts,
            mode: if kway { DecompositionMode::ForceKway } else { DecompositionMode::ForceRecursive },
            contiguous: false,
            ..DecompositionConfig::default()
        };
        let asg = partition_mesh(&mesh, &NativePartitioner::default(), &config).unwrap();
        let sizes = asg.part_sizes();
        prop_assert_eq!(sizes.len(), n_parts);
        prop_assert!(sizes.iter().all(|&s| s > 0));
    }
}
