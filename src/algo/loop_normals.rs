//! Working per-loop normals with an affected-loop mask.

use std::marker::PhantomData;

use nalgebra::Vector3;

use crate::mesh::{LoopId, MeshIndex, MeshSource};

/// Loop normals produced by an adjustment.
///
/// Every loop has a working normal, initially the mesh's current loop normal.
/// Loops written by the rotation or smoothing pass are marked affected; only
/// those are handed back to the host as overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopNormals<I: MeshIndex = u32> {
    normals: Vec<Vector3<f64>>,
    affected: Vec<bool>,
    _index: PhantomData<I>,
}

impl<I: MeshIndex> LoopNormals<I> {
    /// Snapshot the current loop normals of a mesh, with nothing affected.
    pub fn from_source<M: MeshSource<I> + ?Sized>(mesh: &M) -> Self {
        let normals = (0..mesh.num_loops())
            .map(|l| mesh.loop_normal(LoopId::new(l)))
            .collect();
        Self::from_normals(normals)
    }

    /// Wrap an existing normal array, with nothing affected.
    pub fn from_normals(normals: Vec<Vector3<f64>>) -> Self {
        let affected = vec![false; normals.len()];
        Self {
            normals,
            affected,
            _index: PhantomData,
        }
    }

    /// Number of loops.
    #[inline]
    pub fn len(&self) -> usize {
        self.normals.len()
    }

    /// Check whether there are no loops.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    /// Working normal of a loop.
    #[inline]
    pub fn normal(&self, l: LoopId<I>) -> Vector3<f64> {
        self.normals[l.index()]
    }

    /// All working normals, indexed by loop.
    #[inline]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Check whether a loop was written by the adjustment.
    #[inline]
    pub fn is_affected(&self, l: LoopId<I>) -> bool {
        self.affected[l.index()]
    }

    /// Write a loop normal and mark the loop affected.
    #[inline]
    pub fn set(&mut self, l: LoopId<I>, normal: Vector3<f64>) {
        self.normals[l.index()] = normal;
        self.affected[l.index()] = true;
    }

    /// Number of affected loops.
    pub fn affected_count(&self) -> usize {
        self.affected.iter().filter(|&&a| a).count()
    }

    /// Iterate over affected loops and their normals.
    pub fn affected_loops(&self) -> impl Iterator<Item = (LoopId<I>, Vector3<f64>)> + '_ {
        self.affected
            .iter()
            .enumerate()
            .filter(|(_, &a)| a)
            .map(|(i, _)| (LoopId::new(i), self.normals[i]))
    }

    /// Per-loop overrides: `Some` for affected loops, `None` for loops that
    /// should keep the host default.
    pub fn overrides(&self) -> Vec<Option<Vector3<f64>>> {
        self.normals
            .iter()
            .zip(&self.affected)
            .map(|(n, &a)| a.then_some(*n))
            .collect()
    }

    /// The array handed to a [`MeshSink`](crate::mesh::MeshSink): affected
    /// normals, and the zero vector for loops that keep the host default.
    pub fn to_host_array(&self) -> Vec<Vector3<f64>> {
        self.normals
            .iter()
            .zip(&self.affected)
            .map(|(n, &a)| if a { *n } else { Vector3::zeros() })
            .collect()
    }
}
