//! Working seam set and influence resolution.
//!
//! [`AdjustState`] answers the questions the rotation and smoothing passes
//! ask about the mesh: which edges form the working seam set, which vertices
//! are affected by it, and which neighboring polygons influence a given loop.

use std::collections::{BTreeSet, HashSet};

use super::adjacency::AdjacencyIndex;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, MeshIndex, MeshSource, PolygonId, VertexId};

/// Per-invocation state of a normal adjustment.
#[derive(Debug, Clone)]
pub struct AdjustState<I: MeshIndex = u32> {
    adjacency: AdjacencyIndex<I>,
    selected_edges: HashSet<EdgeId<I>>,
    affected_vertices: BTreeSet<VertexId<I>>,
}

impl<I: MeshIndex> AdjustState<I> {
    /// Build the state from a mesh and its working seam set.
    ///
    /// Every vertex touched by a selected edge becomes affected.
    pub fn new<M, E>(mesh: &M, selected_edges: E) -> Result<Self>
    where
        M: MeshSource<I> + ?Sized,
        E: IntoIterator<Item = EdgeId<I>>,
    {
        let adjacency = AdjacencyIndex::build(mesh)?;

        let selected_edges: HashSet<EdgeId<I>> = selected_edges.into_iter().collect();
        let mut affected_vertices = BTreeSet::new();
        for &e in &selected_edges {
            if e.index() >= mesh.num_edges() {
                return Err(MeshError::InvalidState(format!(
                    "selected edge {} does not exist",
                    e.index()
                )));
            }
            affected_vertices.extend(mesh.edge_vertices(e));
        }

        Ok(Self {
            adjacency,
            selected_edges,
            affected_vertices,
        })
    }

    /// The adjacency index of the mesh.
    #[inline]
    pub fn adjacency(&self) -> &AdjacencyIndex<I> {
        &self.adjacency
    }

    /// The working seam set.
    #[inline]
    pub fn selected_edges(&self) -> &HashSet<EdgeId<I>> {
        &self.selected_edges
    }

    /// Check whether an edge is in the working seam set.
    #[inline]
    pub fn is_selected(&self, e: EdgeId<I>) -> bool {
        self.selected_edges.contains(&e)
    }

    /// Endpoints of all selected edges, in index order.
    #[inline]
    pub fn affected_vertices(&self) -> &BTreeSet<VertexId<I>> {
        &self.affected_vertices
    }

    /// Check whether loops at `v` are eligible for adjustment.
    #[inline]
    pub fn should_affect(&self, v: VertexId<I>) -> bool {
        self.affected_vertices.contains(&v)
    }

    /// Check whether two polygons share an edge in the working seam set.
    pub fn shares_selected_edge(&self, a: PolygonId<I>, b: PolygonId<I>) -> bool {
        self.adjacency
            .shared_edges(a, b)
            .into_iter()
            .any(|e| self.is_selected(e))
    }

    /// The first shared edge of two polygons that is in the working seam set.
    pub fn selected_shared_edge(&self, a: PolygonId<I>, b: PolygonId<I>) -> Option<EdgeId<I>> {
        self.adjacency
            .shared_edges(a, b)
            .into_iter()
            .find(|&e| self.is_selected(e))
    }

    /// Polygons that influence the normal of `poly`'s corner at `vertex`.
    ///
    /// These are the other polygons around `vertex` that meet `poly` across
    /// a selected edge, in polygon order.
    pub fn influential_polygons(
        &self,
        poly: PolygonId<I>,
        vertex: VertexId<I>,
    ) -> impl Iterator<Item = PolygonId<I>> + '_ {
        self.adjacency
            .connected_polygons(vertex)
            .iter()
            .copied()
            .filter(move |&other| other != poly && self.shares_selected_edge(poly, other))
    }
}
