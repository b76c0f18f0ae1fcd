//! Capability traits the normal-adjustment engine is written against.
//!
//! [`MeshSource`] is the read side: topology, edge flags, face normals, and the
//! current and default loop normals. [`MeshSink`] is the write side: clearing and setting
//! per-loop custom normals. The algorithms in [`crate::algo`] depend only on
//! these traits, so any geometry engine can be adapted by implementing them.
//! [`PolyMesh`] is the in-crate implementation.

use std::ops::Range;

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, LoopId, MeshIndex, PolygonId, VertexId};
use super::poly::{EdgeFlags, PolyMesh};
use crate::error::Result;

/// Read access to a polygon mesh.
///
/// Polygons own contiguous loop ranges, and every loop's edge joins its
/// vertex to the next corner of the polygon. Face normals are unit length.
pub trait MeshSource<I: MeshIndex = u32> {
    /// Number of vertices.
    fn num_vertices(&self) -> usize;

    /// Number of edges.
    fn num_edges(&self) -> usize;

    /// Number of polygons.
    fn num_polygons(&self) -> usize;

    /// Number of loops.
    fn num_loops(&self) -> usize;

    /// Position of a vertex.
    fn vertex_position(&self, v: VertexId<I>) -> Point3<f64>;

    /// The two endpoints of an edge.
    fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2];

    /// Seam, sharp and selection flags of an edge.
    fn edge_flags(&self, e: EdgeId<I>) -> EdgeFlags;

    /// Loop indices owned by a polygon, in winding order.
    fn polygon_loop_range(&self, p: PolygonId<I>) -> Range<usize>;

    /// Unit face normal of a polygon.
    fn polygon_normal(&self, p: PolygonId<I>) -> Vector3<f64>;

    /// Corner vertex of a loop.
    fn loop_vertex(&self, l: LoopId<I>) -> VertexId<I>;

    /// Edge leading from a loop to the next corner.
    fn loop_edge(&self, l: LoopId<I>) -> EdgeId<I>;

    /// Current normal of a loop.
    fn loop_normal(&self, l: LoopId<I>) -> Vector3<f64>;

    /// Normal the host gives a loop when it has no custom normal.
    fn default_loop_normal(&self, l: LoopId<I>) -> Vector3<f64>;

    /// Threshold below which adjacent faces are shaded smoothly, in radians.
    fn auto_smooth_angle(&self) -> f64;
}

/// Write access to per-loop custom normals.
pub trait MeshSink<I: MeshIndex = u32> {
    /// Drop all custom normals so that loop normals revert to the host default.
    fn clear_custom_normals(&mut self);

    /// Replace the custom normals, one per loop. The zero vector leaves a loop
    /// at the host default. On error the previous custom normals are kept.
    fn set_custom_normals(&mut self, normals: &[Vector3<f64>]) -> Result<()>;
}

impl<I: MeshIndex> MeshSource<I> for PolyMesh<I> {
    fn num_vertices(&self) -> usize {
        PolyMesh::num_vertices(self)
    }

    fn num_edges(&self) -> usize {
        PolyMesh::num_edges(self)
    }

    fn num_polygons(&self) -> usize {
        PolyMesh::num_polygons(self)
    }

    fn num_loops(&self) -> usize {
        PolyMesh::num_loops(self)
    }

    fn vertex_position(&self, v: VertexId<I>) -> Point3<f64> {
        *self.position(v)
    }

    fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        self.edge(e).vertices
    }

    fn edge_flags(&self, e: EdgeId<I>) -> EdgeFlags {
        PolyMesh::edge_flags(self, e)
    }

    fn polygon_loop_range(&self, p: PolygonId<I>) -> Range<usize> {
        self.polygon(p).loop_range()
    }

    fn polygon_normal(&self, p: PolygonId<I>) -> Vector3<f64> {
        PolyMesh::polygon_normal(self, p)
    }

    fn loop_vertex(&self, l: LoopId<I>) -> VertexId<I> {
        self.loop_(l).vertex
    }

    fn loop_edge(&self, l: LoopId<I>) -> EdgeId<I> {
        self.loop_(l).edge
    }

    fn loop_normal(&self, l: LoopId<I>) -> Vector3<f64> {
        PolyMesh::loop_normal(self, l)
    }

    fn default_loop_normal(&self, l: LoopId<I>) -> Vector3<f64> {
        PolyMesh::split_normal(self, l)
    }

    fn auto_smooth_angle(&self) -> f64 {
        PolyMesh::auto_smooth_angle(self)
    }
}

impl<I: MeshIndex> MeshSink<I> for PolyMesh<I> {
    fn clear_custom_normals(&mut self) {
        PolyMesh::clear_custom_normals(self);
    }

    fn set_custom_normals(&mut self, normals: &[Vector3<f64>]) -> Result<()> {
        PolyMesh::set_custom_normals(self, normals)
    }
}
