//! Dense local numbering of the nodes or elements contained in one partition.
//!
//! [`LocalIndexMap::from_mask`] numbers the marked global ids in ascending
//! order. Node maps are then reordered so that internal nodes precede
//! boundary nodes (see [`crate::algs::communication`]); the reorder takes the
//! full global ordering as an override.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshDecompError;
use serde::{Deserialize, Serialize};

/// Bijection between the marked global ids and `[0, len)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIndexMap {
    global_to_local: Vec<Option<usize>>,
    local_to_global: Vec<usize>,
}

impl LocalIndexMap {
    /// Number every `true` entry of `mask` in ascending global order.
    pub fn from_mask(mask: &[bool]) -> Self {
        let mut global_to_local = vec![None; mask.len()];
        let mut local_to_global = Vec::with_capacity(mask.iter().filter(|&&m| m).count());
        for (g, _) in mask.iter().enumerate().filter(|&(_, &m)| m) {
            global_to_local[g] = Some(local_to_global.len());
            local_to_global.push(g);
        }
        let map = Self {
            global_to_local,
            local_to_global,
        };
        map.debug_assert_invariants();
        map
    }

    /// Replace the numbering: `order[l]` becomes the global id of local `l`.
    ///
    /// `order` must be a permutation of the currently mapped global ids.
    pub fn reorder(&mut self, order: &[usize]) -> Result<(), MeshDecompError> {
        if order.len() != self.local_to_global.len() {
            return Err(MeshDecompError::InvalidOrdering(format!(
                "{} ids given for {} mapped entries",
                order.len(),
                self.local_to_global.len()
            )));
        }
        let mut seen = vec![false; self.local_to_global.len()];
        for &g in order {
            let Some(Some(old)) = self.global_to_local.get(g).copied() else {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "global id {g} is not part of this map"
                )));
            };
            if std::mem::replace(&mut seen[old], true) {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "global id {g} listed twice"
                )));
            }
        }
        for (l, &g) in order.iter().enumerate() {
            self.global_to_local[g] = Some(l);
        }
        self.local_to_global.clear();
        self.local_to_global.extend_from_slice(order);
        self.debug_assert_invariants();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.local_to_global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_to_global.is_empty()
    }

    /// Size of the global range this map was built over.
    pub fn global_len(&self) -> usize {
        self.global_to_local.len()
    }

    pub fn to_local(&self, global: usize) -> Option<usize> {
        self.global_to_local.get(global).copied().flatten()
    }

    pub fn to_global(&self, local: usize) -> Option<usize> {
        self.local_to_global.get(local).copied()
    }

    pub fn local_to_global(&self) -> &[usize] {
        &self.local_to_global
    }

    pub fn global_to_local(&self) -> &[Option<usize>] {
        &self.global_to_local
    }
}

impl DebugInvariants for LocalIndexMap {
    fn validate_invariants(&self) -> Result<(), MeshDecompError> {
        let mapped = self.global_to_local.iter().filter(|l| l.is_some()).count();
        if mapped != self.local_to_global.len() {
            return Err(MeshDecompError::InvalidOrdering(format!(
                "{mapped} mapped globals but {} locals",
                self.local_to_global.len()
            )));
        }
        for (l, &g) in self.local_to_global.iter().enumerate() {
            if self.global_to_local.get(g).copied().flatten() != Some(l) {
                return Err(MeshDecompError::InvalidOrdering(format!(
                    "local {l} → global {g} does not round-trip"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_numbering() {
        let map = LocalIndexMap::from_mask(&[false, true, true, false, true]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.global_len(), 5);
        assert_eq!(map.local_to_global(), &[1, 2, 4]);
        assert_eq!(map.global_to_local(), &[None, Some(0), Some(1), None, Some(2)]);
        for &g in map.local_to_global() {
            assert_eq!(map.to_global(map.to_local(g).unwrap()), Some(g));
        }
        assert_eq!(map.to_local(7), None);
    }

    #[test]
    fn reorder_applies_override() {
        let mut map = LocalIndexMap::from_mask(&[true, true, true, true]);
        map.reorder(&[2, 0, 3, 1]).unwrap();
        assert_eq!(map.to_local(2), Some(0));
        assert_eq!(map.to_local(1), Some(3));
        assert!(map.validate_invariants().is_ok());
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let mut map = LocalIndexMap::from_mask(&[true, false, true]);
        assert!(map.reorder(&[0]).is_err());
        assert!(map.reorder(&[0, 1]).is_err());
        assert!(map.reorder(&[2, 2]).is_err());
        // failed reorders leave the map untouched
        assert_eq!(map.local_to_global(), &[0, 2]);
    }
}
