//! Vertex and polygon adjacency derived from a [`MeshSource`].
//!
//! The index is built once per adjustment and never changes afterwards. It
//! also validates the topology it reads, so that malformed input is rejected
//! before anything is written back to the mesh.

use std::collections::HashSet;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, LoopId, MeshIndex, MeshSource, PolygonId, VertexId};

/// Immutable adjacency relations over a polygon mesh.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex<I: MeshIndex = u32> {
    /// Polygons around each vertex, in polygon order, without repeats.
    vertex_polygons: Vec<Vec<PolygonId<I>>>,

    /// Loop edges of each polygon, in winding order.
    polygon_edges: Vec<Vec<EdgeId<I>>>,

    /// Owning polygon of each loop.
    loop_polygons: Vec<PolygonId<I>>,
}

impl<I: MeshIndex> AdjacencyIndex<I> {
    /// Build the index, validating the mesh topology.
    ///
    /// Fails if polygon loop ranges do not tile the loop array, or if a loop
    /// or edge references an element that does not exist.
    pub fn build<M: MeshSource<I> + ?Sized>(mesh: &M) -> Result<Self> {
        let num_vertices = mesh.num_vertices();
        let num_edges = mesh.num_edges();
        let num_loops = mesh.num_loops();

        for e in (0..num_edges).map(EdgeId::<I>::new) {
            for v in mesh.edge_vertices(e) {
                if v.index() >= num_vertices {
                    return Err(MeshError::InvalidState(format!(
                        "edge {} references invalid vertex index {}",
                        e.index(),
                        v.index()
                    )));
                }
            }
        }

        let mut vertex_polygons: Vec<Vec<PolygonId<I>>> = vec![Vec::new(); num_vertices];
        let mut polygon_edges = Vec::with_capacity(mesh.num_polygons());
        let mut loop_polygons = vec![PolygonId::invalid(); num_loops];
        let mut expected_start = 0;

        for p in (0..mesh.num_polygons()).map(PolygonId::<I>::new) {
            let range = mesh.polygon_loop_range(p);
            if range.start != expected_start || range.end > num_loops || range.is_empty() {
                return Err(MeshError::LoopCountMismatch {
                    expected: range.end.max(expected_start),
                    actual: num_loops,
                });
            }
            expected_start = range.end;

            let mut edges = Vec::with_capacity(range.len());
            for li in range {
                let l = LoopId::<I>::new(li);
                let v = mesh.loop_vertex(l);
                let e = mesh.loop_edge(l);
                if v.index() >= num_vertices {
                    return Err(MeshError::InvalidVertexIndex {
                        polygon: p.index(),
                        vertex: v.index(),
                    });
                }
                if e.index() >= num_edges {
                    return Err(MeshError::InvalidEdgeIndex {
                        loop_index: li,
                        edge: e.index(),
                    });
                }

                // Polygons are visited in order, so checking the tail is enough
                let around = &mut vertex_polygons[v.index()];
                if around.last() != Some(&p) {
                    around.push(p);
                }
                edges.push(e);
                loop_polygons[li] = p;
            }
            polygon_edges.push(edges);
        }

        if expected_start != num_loops {
            return Err(MeshError::LoopCountMismatch {
                expected: expected_start,
                actual: num_loops,
            });
        }

        Ok(Self {
            vertex_polygons,
            polygon_edges,
            loop_polygons,
        })
    }

    /// Number of polygons covered by the index.
    #[inline]
    pub fn num_polygons(&self) -> usize {
        self.polygon_edges.len()
    }

    /// All polygons having `v` as a corner, in polygon order.
    #[inline]
    pub fn connected_polygons(&self, v: VertexId<I>) -> &[PolygonId<I>] {
        &self.vertex_polygons[v.index()]
    }

    /// The loop edges of a polygon, in winding order.
    #[inline]
    pub fn polygon_edges(&self, p: PolygonId<I>) -> &[EdgeId<I>] {
        &self.polygon_edges[p.index()]
    }

    /// The polygon owning a loop.
    #[inline]
    pub fn loop_polygon(&self, l: LoopId<I>) -> PolygonId<I> {
        self.loop_polygons[l.index()]
    }

    /// Edges that appear in both polygons, in `b`'s winding order.
    ///
    /// The content is the same for either argument order. Two polygons
    /// normally share at most one edge; callers that need a single edge use
    /// the first one.
    pub fn shared_edges(&self, a: PolygonId<I>, b: PolygonId<I>) -> Vec<EdgeId<I>> {
        let a_edges: HashSet<EdgeId<I>> = self.polygon_edges(a).iter().copied().collect();
        self.polygon_edges(b)
            .iter()
            .copied()
            .filter(|e| a_edges.contains(e))
            .collect()
    }

    /// The first edge of `b` (in winding order) that `a` also uses.
    pub fn first_shared_edge(&self, a: PolygonId<I>, b: PolygonId<I>) -> Option<EdgeId<I>> {
        let a_edges = self.polygon_edges(a);
        self.polygon_edges(b)
            .iter()
            .copied()
            .find(|e| a_edges.contains(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, PolyMesh};
    use nalgebra::{Point3, Vector3};
    use std::ops::Range;

    /// A 3x1 strip of unit quads along x.
    fn strip() -> PolyMesh {
        let mut positions = Vec::new();
        for y in 0..2 {
            for x in 0..4 {
                positions.push(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        let polygons = vec![[0, 1, 5, 4], [1, 2, 6, 5], [2, 3, 7, 6]];
        build_from_polygons(&positions, &polygons).unwrap()
    }

    #[test]
    fn test_connected_polygons() {
        let mesh = strip();
        let adjacency: AdjacencyIndex = AdjacencyIndex::build(&mesh).unwrap();

        let p = |i| PolygonId::<u32>::new(i);
        assert_eq!(adjacency.connected_polygons(VertexId::new(0)), &[p(0)]);
        assert_eq!(adjacency.connected_polygons(VertexId::new(1)), &[p(0), p(1)]);
        assert_eq!(adjacency.connected_polygons(VertexId::new(6)), &[p(1), p(2)]);
        assert_eq!(adjacency.loop_polygon(LoopId::new(5)), p(1));
    }

    #[test]
    fn test_shared_edges_symmetric() {
        let mesh = strip();
        let adjacency: AdjacencyIndex = AdjacencyIndex::build(&mesh).unwrap();
        let (a, b, c) = (PolygonId::new(0), PolygonId::new(1), PolygonId::new(2));

        let ab = adjacency.shared_edges(a, b);
        let ba = adjacency.shared_edges(b, a);
        assert_eq!(ab.len(), 1);
        assert_eq!(ab, ba);
        assert_eq!(adjacency.first_shared_edge(a, b), Some(ab[0]));

        let shared = mesh.edge(ab[0]);
        assert!(shared.contains(VertexId::new(1)) && shared.contains(VertexId::new(5)));

        assert!(adjacency.shared_edges(a, c).is_empty());
        assert_eq!(adjacency.first_shared_edge(a, c), None);
    }

    #[test]
    fn test_multiple_shared_edges_keep_second_polygon_order() {
        // Two triangles over the same three edges, facing opposite ways
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: PolyMesh = build_from_polygons(&positions, &[[0, 1, 2], [0, 2, 1]]).unwrap();
        let adjacency: AdjacencyIndex = AdjacencyIndex::build(&mesh).unwrap();
        let (a, b) = (PolygonId::new(0), PolygonId::new(1));

        let ab = adjacency.shared_edges(a, b);
        let ba = adjacency.shared_edges(b, a);
        assert_eq!(ab.len(), 3);
        assert_eq!(ab, adjacency.polygon_edges(b).to_vec());
        assert_eq!(ba, adjacency.polygon_edges(a).to_vec());

        let mut sorted_ab = ab.clone();
        let mut sorted_ba = ba.clone();
        sorted_ab.sort();
        sorted_ba.sort();
        assert_eq!(sorted_ab, sorted_ba);
    }

    /// A source whose single quad claims more loops than exist.
    struct Truncated(PolyMesh);

    impl MeshSource for Truncated {
        fn num_vertices(&self) -> usize {
            self.0.num_vertices()
        }
        fn num_edges(&self) -> usize {
            self.0.num_edges()
        }
        fn num_polygons(&self) -> usize {
            self.0.num_polygons()
        }
        fn num_loops(&self) -> usize {
            self.0.num_loops() - 1
        }
        fn vertex_position(&self, v: VertexId) -> Point3<f64> {
            *self.0.position(v)
        }
        fn edge_vertices(&self, e: EdgeId) -> [VertexId; 2] {
            self.0.edge(e).vertices
        }
        fn edge_flags(&self, e: EdgeId) -> crate::mesh::EdgeFlags {
            self.0.edge_flags(e)
        }
        fn polygon_loop_range(&self, p: PolygonId) -> Range<usize> {
            self.0.polygon(p).loop_range()
        }
        fn polygon_normal(&self, p: PolygonId) -> Vector3<f64> {
            self.0.polygon_normal(p)
        }
        fn loop_vertex(&self, l: LoopId) -> VertexId {
            self.0.loop_(l).vertex
        }
        fn loop_edge(&self, l: LoopId) -> EdgeId {
            self.0.loop_(l).edge
        }
        fn loop_normal(&self, l: LoopId) -> Vector3<f64> {
            self.0.loop_normal(l)
        }
        fn default_loop_normal(&self, l: LoopId) -> Vector3<f64> {
            self.0.split_normal(l)
        }
        fn auto_smooth_angle(&self) -> f64 {
            self.0.auto_smooth_angle()
        }
    }

    #[test]
    fn test_loop_count_mismatch_rejected() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: PolyMesh = build_from_polygons(&positions, &[[0, 1, 2, 3]]).unwrap();
        let result = AdjacencyIndex::build(&Truncated(mesh));
        assert!(matches!(result, Err(MeshError::LoopCountMismatch { .. })));
    }
}
