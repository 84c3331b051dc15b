//! Writer boundary for decomposed meshes.
//!
//! A [`PartitionWriter`] persists one [`PartitionBundle`] per file. File
//! names follow the parallel-file convention `base.P.pp`, where `P` is the
//! partition count and `pp` the partition id zero-padded to the width of `P`.

pub mod partitioned;

use crate::algs::distribute::{Decomposition, PartitionBundle};
use crate::mesh_error::MeshDecompError;
use std::path::{Path, PathBuf};

pub use self::partitioned::JsonPartitionWriter;

/// Trait for writers that persist one partition of a decomposition.
pub trait PartitionWriter {
    /// Write `bundle` to `path`, replacing any existing file.
    fn write_partition(&self, path: &Path, bundle: &PartitionBundle) -> Result<(), MeshDecompError>;
}

/// Name of partition `partition` of `n_parts` derived from `base`.
///
/// ```
/// use mesh_decomp::io::multiname;
/// assert_eq!(multiname("mesh.exoII", 3, 12), "mesh.exoII.12.03");
/// assert_eq!(multiname("mesh.exoII", 0, 1), "mesh.exoII.1.0");
/// ```
pub fn multiname(base: &str, partition: usize, n_parts: usize) -> String {
    let width = n_parts.to_string().len();
    format!("{base}.{n_parts}.{partition:0width$}")
}

fn partition_path(base: &Path, partition: usize, n_parts: usize) -> PathBuf {
    PathBuf::from(multiname(&base.to_string_lossy(), partition, n_parts))
}

/// Write every partition of `decomposition` once for each base name.
///
/// Returns the written paths, grouped by base name in partition order. The
/// first failure aborts the run; files already written are left in place.
pub fn write_decomposition<W, B>(
    writer: &W,
    decomposition: &Decomposition,
    base_names: &[B],
) -> Result<Vec<PathBuf>, MeshDecompError>
where
    W: PartitionWriter + ?Sized,
    B: AsRef<Path>,
{
    let n_parts = decomposition.n_parts();
    let mut written = Vec::with_capacity(base_names.len() * n_parts);
    for base in base_names {
        for bundle in &decomposition.bundles {
            let path = partition_path(base.as_ref(), bundle.partition, n_parts);
            writer.write_partition(&path, bundle)?;
            written.push(path);
        }
        log::info!(
            "wrote {n_parts} partitions for {}",
            base.as_ref().display()
        );
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_pad_to_partition_count_width() {
        assert_eq!(multiname("a", 7, 8), "a.8.7");
        assert_eq!(multiname("a", 7, 10), "a.10.07");
        assert_eq!(multiname("dir/a.exo", 42, 128), "dir/a.exo.128.042");
    }
}
