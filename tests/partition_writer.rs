use mesh_decomp::io::partitioned::read_partition;
use mesh_decomp::prelude::*;
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mesh-decomp-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn writes_every_partition_for_every_base() {
    let dir = scratch_dir("writer");
    let mesh = quad_grid(4, 3, &MeshGenOptions::default()).unwrap();
    let d = decompose_mesh(
        &mesh,
        &NativePartitioner::default(),
        &DecompositionConfig::with_parts(3),
    )
    .unwrap();

    let bases = [dir.join("mesh.exoII"), dir.join("restart.exoII")];
    let written = write_decomposition(&JsonPartitionWriter::default(), &d, &bases).unwrap();
    assert_eq!(written.len(), 6);
    assert!(written[0].ends_with("mesh.exoII.3.0"));
    assert!(written[5].ends_with("restart.exoII.3.2"));

    let rec = read_partition(&written[1]).unwrap();
    let b = &d.bundles[1];
    assert_eq!(rec.init_info.n_parts, 3);
    assert_eq!(rec.init_info.file_type, "p");
    assert_eq!(rec.global.num_elements, 12);
    assert_eq!(rec.node_map.len(), b.num_nodes());
    assert!(rec.node_map.iter().all(|&g| (1..=mesh.num_nodes()).contains(&g)));
    assert_eq!(rec.load_balance.internal_nodes, b.load_balance.internal_count());
    assert_eq!(rec.load_balance.neighbor_ids, b.load_balance.neighbor_ids());
    assert_eq!(
        rec.load_balance.node_counts.iter().sum::<usize>(),
        rec.load_balance.node_ids.len()
    );
    assert_eq!(rec.qa.version, env!("CARGO_PKG_VERSION"));

    fs::remove_dir_all(&dir).unwrap();
}

struct FailingWriter;

impl PartitionWriter for FailingWriter {
    fn write_partition(
        &self,
        path: &std::path::Path,
        _bundle: &PartitionBundle,
    ) -> Result<(), MeshDecompError> {
        Err(MeshDecompError::Writer {
            path: path.display().to_string(),
            message: "disk full".into(),
        })
    }
}

#[test]
fn writer_failure_aborts_run() {
    let mesh = quad_grid(2, 2, &MeshGenOptions::default()).unwrap();
    let d = decompose(&mesh, &PartitionAssignment::new(vec![0, 0, 1, 1], 2).unwrap()).unwrap();
    let err = write_decomposition(&FailingWriter, &d, &["out"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert_eq!(
        err,
        MeshDecompError::Writer {
            path: "out.2.0".into(),
            message: "disk full".into()
        }
    );
}
