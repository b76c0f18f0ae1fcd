//! Polygon mesh with per-loop normals.
//!
//! This module provides a corner-based polygon representation: flat arrays of
//! vertices, edges, polygons and loops. A polygon owns a contiguous range of
//! loops; each loop records its corner vertex and the edge leading to the next
//! corner in winding order.
//!
//! # Normals
//!
//! Face normals are computed from vertex positions. Loop normals come in two
//! layers:
//! - **split normals**, derived from the geometry with auto-smooth: faces
//!   meeting at a non-sharp edge strictly below the auto-smooth angle share a smooth
//!   normal at their common corners
//! - **custom normals**, an optional per-loop override where the zero vector
//!   means "use the split normal"
//!
//! Both layers are cached and refreshed whenever positions, sharp flags or the
//! auto-smooth angle change.

use std::collections::BTreeMap;
use std::ops::Range;

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, LoopId, MeshIndex, PolygonId, VertexId};
use super::normals::{compute_face_normals, compute_split_normals, is_override};
use crate::error::{MeshError, Result};

/// Default auto-smooth angle (30 degrees).
pub const DEFAULT_AUTO_SMOOTH_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// A vertex in the polygon mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a new vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self { position }
    }
}

/// Per-edge flags authored on the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeFlags {
    /// UV seam.
    pub seam: bool,
    /// Forces a shading discontinuity.
    pub sharp: bool,
    /// Part of the current edge selection.
    pub select: bool,
}

/// An edge between two vertices.
#[derive(Debug, Clone, Copy)]
pub struct Edge<I: MeshIndex = u32> {
    /// The two endpoints (unordered).
    pub vertices: [VertexId<I>; 2],

    /// Seam, sharp and selection flags.
    pub flags: EdgeFlags,
}

impl<I: MeshIndex> Edge<I> {
    /// Check whether `v` is one of this edge's endpoints.
    #[inline]
    pub fn contains(&self, v: VertexId<I>) -> bool {
        self.vertices[0] == v || self.vertices[1] == v
    }
}

/// A polygon, stored as a contiguous range of loops.
#[derive(Debug, Clone, Copy)]
pub struct Polygon {
    /// Index of the first loop.
    pub loop_start: usize,

    /// Number of loops (corners).
    pub loop_total: usize,
}

impl Polygon {
    /// The range of loop indices owned by this polygon.
    #[inline]
    pub fn loop_range(&self) -> Range<usize> {
        self.loop_start..self.loop_start + self.loop_total
    }
}

/// A polygon corner.
#[derive(Debug, Clone, Copy)]
pub struct Loop<I: MeshIndex = u32> {
    /// The corner vertex.
    pub vertex: VertexId<I>,

    /// The edge from this corner to the next one in winding order.
    pub edge: EdgeId<I>,
}

/// A polygon mesh with edge flags and per-loop normals.
#[derive(Debug, Clone)]
pub struct PolyMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge<I>>,
    pub(crate) polygons: Vec<Polygon>,
    pub(crate) loops: Vec<Loop<I>>,

    /// Unit face normals, one per polygon.
    pub(crate) face_normals: Vec<Vector3<f64>>,

    /// Default (auto-smoothed) loop normals.
    pub(crate) split_normals: Vec<Vector3<f64>>,

    /// Custom loop normals; zero entries fall back to the split normal.
    pub(crate) custom_normals: Option<Vec<Vector3<f64>>>,

    pub(crate) auto_smooth_angle: f64,

    /// Named boolean attributes stored per edge.
    pub(crate) edge_attributes: BTreeMap<String, Vec<bool>>,
}

impl<I: MeshIndex> Default for PolyMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PolyMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            polygons: Vec::new(),
            loops: Vec::new(),
            face_normals: Vec::new(),
            split_normals: Vec::new(),
            custom_normals: None,
            auto_smooth_angle: DEFAULT_AUTO_SMOOTH_ANGLE,
            edge_attributes: BTreeMap::new(),
        }
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of polygons.
    #[inline]
    pub fn num_polygons(&self) -> usize {
        self.polygons.len()
    }

    /// Get the number of loops.
    #[inline]
    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId<I>) -> &Edge<I> {
        &self.edges[id.index()]
    }

    /// Get a polygon by ID.
    #[inline]
    pub fn polygon(&self, id: PolygonId<I>) -> &Polygon {
        &self.polygons[id.index()]
    }

    /// Get a loop by ID.
    #[inline]
    pub fn loop_(&self, id: LoopId<I>) -> &Loop<I> {
        &self.loops[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex and refresh the derived normals.
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertices[v.index()].position = pos;
        self.update_normals();
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all polygon IDs.
    pub fn polygon_ids(&self) -> impl Iterator<Item = PolygonId<I>> + '_ {
        (0..self.polygons.len()).map(PolygonId::new)
    }

    /// Iterate over all loop IDs.
    pub fn loop_ids(&self) -> impl Iterator<Item = LoopId<I>> + '_ {
        (0..self.loops.len()).map(LoopId::new)
    }

    /// Iterate over the loops of a polygon in winding order.
    pub fn polygon_loops(&self, p: PolygonId<I>) -> impl Iterator<Item = LoopId<I>> + '_ {
        self.polygon(p).loop_range().map(LoopId::new)
    }

    /// Iterate over the corner vertices of a polygon in winding order.
    pub fn polygon_vertices(&self, p: PolygonId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.polygon_loops(p).map(move |l| self.loop_(l).vertex)
    }

    // ==================== Geometry ====================

    /// Get the unit normal of a polygon.
    #[inline]
    pub fn polygon_normal(&self, p: PolygonId<I>) -> Vector3<f64> {
        self.face_normals[p.index()]
    }

    /// Compute the centroid of a polygon.
    pub fn polygon_centroid(&self, p: PolygonId<I>) -> Point3<f64> {
        let polygon = self.polygon(p);
        let sum: Vector3<f64> = self
            .polygon_vertices(p)
            .map(|v| self.position(v).coords)
            .sum();
        Point3::from(sum / polygon.loop_total as f64)
    }

    /// Compute the axis-aligned bounding box.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(min, max), v| {
                (min.inf(&v.position), max.sup(&v.position))
            });
        Some((min, max))
    }

    /// Check whether every polygon is a quad.
    pub fn is_quad_mesh(&self) -> bool {
        self.polygons.iter().all(|p| p.loop_total == 4)
    }

    // ==================== Edge flags ====================

    /// Get the flags of an edge.
    #[inline]
    pub fn edge_flags(&self, e: EdgeId<I>) -> EdgeFlags {
        self.edge(e).flags
    }

    /// Mark or clear an edge as a seam.
    pub fn set_seam(&mut self, e: EdgeId<I>, seam: bool) {
        self.edges[e.index()].flags.seam = seam;
    }

    /// Mark or clear an edge as sharp. Refreshes the split normals.
    pub fn set_sharp(&mut self, e: EdgeId<I>, sharp: bool) {
        if self.edges[e.index()].flags.sharp != sharp {
            self.edges[e.index()].flags.sharp = sharp;
            self.update_normals();
        }
    }

    /// Select or deselect an edge.
    pub fn set_selected(&mut self, e: EdgeId<I>, select: bool) {
        self.edges[e.index()].flags.select = select;
    }

    /// Deselect every edge.
    pub fn deselect_all(&mut self) {
        for edge in &mut self.edges {
            edge.flags.select = false;
        }
    }

    /// Set each edge's selection to the result of `predicate`.
    pub fn select_where<F>(&mut self, mut predicate: F)
    where
        F: FnMut(EdgeId<I>, &Edge<I>) -> bool,
    {
        for (i, edge) in self.edges.iter_mut().enumerate() {
            edge.flags.select = predicate(EdgeId::new(i), edge);
        }
    }

    /// Iterate over the IDs of selected edges.
    pub fn selected_edges(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.flags.select)
            .map(|(i, _)| EdgeId::new(i))
    }

    /// Find the edge connecting two vertices, if any.
    pub fn find_edge(&self, a: VertexId<I>, b: VertexId<I>) -> Option<EdgeId<I>> {
        self.edges
            .iter()
            .position(|e| e.contains(a) && e.contains(b) && a != b)
            .map(EdgeId::new)
    }

    // ==================== Edge attributes ====================

    /// Get a named boolean edge attribute.
    pub fn edge_attribute(&self, name: &str) -> Option<&[bool]> {
        self.edge_attributes.get(name).map(Vec::as_slice)
    }

    /// Store a named boolean edge attribute, replacing any previous values.
    pub fn set_edge_attribute(&mut self, name: &str, values: Vec<bool>) -> Result<()> {
        if values.len() != self.edges.len() {
            return Err(MeshError::InvalidState(format!(
                "edge attribute '{}' has {} values for {} edges",
                name,
                values.len(),
                self.edges.len()
            )));
        }
        self.edge_attributes.insert(name.to_string(), values);
        Ok(())
    }

    /// Remove a named edge attribute, returning its values.
    pub fn remove_edge_attribute(&mut self, name: &str) -> Option<Vec<bool>> {
        self.edge_attributes.remove(name)
    }

    /// Iterate over the names of all edge attributes.
    pub fn edge_attribute_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.edge_attributes.keys().map(String::as_str)
    }

    // ==================== Normals ====================

    /// The auto-smooth angle in radians.
    #[inline]
    pub fn auto_smooth_angle(&self) -> f64 {
        self.auto_smooth_angle
    }

    /// Set the auto-smooth angle in radians. Refreshes the split normals.
    pub fn set_auto_smooth_angle(&mut self, angle: f64) -> Result<()> {
        if !(0.0..=std::f64::consts::PI).contains(&angle) {
            return Err(MeshError::invalid_param(
                "auto_smooth_angle",
                angle,
                "must be in [0, pi]",
            ));
        }
        self.auto_smooth_angle = angle;
        self.update_normals();
        Ok(())
    }

    /// The default (auto-smoothed) normal of a loop.
    #[inline]
    pub fn split_normal(&self, l: LoopId<I>) -> Vector3<f64> {
        self.split_normals[l.index()]
    }

    /// The custom normal of a loop, if one is set.
    pub fn custom_normal(&self, l: LoopId<I>) -> Option<Vector3<f64>> {
        let n = self.custom_normals.as_ref()?[l.index()];
        is_override(&n).then_some(n)
    }

    /// The effective normal of a loop: its custom normal if set, otherwise
    /// its split normal.
    pub fn loop_normal(&self, l: LoopId<I>) -> Vector3<f64> {
        self.custom_normal(l).unwrap_or_else(|| self.split_normal(l))
    }

    /// Check whether any custom normals are stored.
    pub fn has_custom_normals(&self) -> bool {
        self.custom_normals.is_some()
    }

    /// Drop all custom normals.
    pub fn clear_custom_normals(&mut self) {
        self.custom_normals = None;
    }

    /// Replace the custom normals. `normals` must have one entry per loop;
    /// zero entries mean "no override". Overrides are stored as given, and an
    /// array without any override drops the custom normals entirely. On error
    /// the previous custom normals are kept.
    pub fn set_custom_normals(&mut self, normals: &[Vector3<f64>]) -> Result<()> {
        if normals.len() != self.loops.len() {
            return Err(MeshError::LoopCountMismatch {
                expected: self.loops.len(),
                actual: normals.len(),
            });
        }
        if normals.iter().any(|n| !n.iter().all(|c| c.is_finite())) {
            return Err(MeshError::InvalidState(
                "custom normals contain non-finite values".to_string(),
            ));
        }
        self.custom_normals = normals.iter().any(is_override).then(|| {
            normals
                .iter()
                .map(|n| if is_override(n) { *n } else { Vector3::zeros() })
                .collect()
        });
        Ok(())
    }

    /// Recompute face normals and split normals from the current geometry.
    pub fn update_normals(&mut self) {
        self.face_normals = compute_face_normals(self);
        self.split_normals = compute_split_normals(self);
    }

    /// Check the internal consistency of the mesh.
    pub fn is_valid(&self) -> bool {
        let mut expected_start = 0;
        for polygon in &self.polygons {
            if polygon.loop_start != expected_start || polygon.loop_total < 3 {
                return false;
            }
            expected_start += polygon.loop_total;
        }
        if expected_start != self.loops.len() {
            return false;
        }

        for polygon in &self.polygons {
            let range = polygon.loop_range();
            for i in range.clone() {
                let l = &self.loops[i];
                if l.vertex.index() >= self.vertices.len() || l.edge.index() >= self.edges.len() {
                    return false;
                }
                // The loop's edge must join it to the next corner
                let next = if i + 1 == range.end { range.start } else { i + 1 };
                let edge = &self.edges[l.edge.index()];
                if !edge.contains(l.vertex) || !edge.contains(self.loops[next].vertex) {
                    return false;
                }
            }
        }

        self.face_normals.len() == self.polygons.len()
            && self.split_normals.len() == self.loops.len()
    }
}
