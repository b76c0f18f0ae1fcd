//! Mesh construction utilities.
//!
//! This module provides functions for building polygon meshes from
//! face-vertex lists as commonly found in mesh file formats, and for
//! converting them back.

use std::collections::HashMap;

use nalgebra::Point3;

use super::index::{EdgeId, MeshIndex, VertexId};
use super::poly::{Edge, EdgeFlags, Loop, PolyMesh, Polygon, Vertex};
use crate::error::{MeshError, Result};

/// Build a polygon mesh from vertices and polygon corner lists.
///
/// Edges are created in order of first appearance while walking the polygons
/// in order; each loop references the edge leading to the next corner.
/// Edges shared by more than two polygons are accepted.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `polygons` - List of polygons, each as a list of vertex indices in winding order
///
/// # Returns
/// A polygon mesh with face and split normals computed, or an error if the
/// input is invalid.
///
/// # Example
/// ```
/// use trim_normals::mesh::{build_from_polygons, PolyMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let polygons = vec![vec![0, 1, 2, 3]];
///
/// let mesh: PolyMesh = build_from_polygons(&vertices, &polygons).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_edges(), 4);
/// assert_eq!(mesh.num_loops(), 4);
/// ```
pub fn build_from_polygons<I, P>(vertices: &[Point3<f64>], polygons: &[P]) -> Result<PolyMesh<I>>
where
    I: MeshIndex,
    P: AsRef<[usize]>,
{
    if polygons.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validate vertex indices
    for (pi, polygon) in polygons.iter().enumerate() {
        let corners = polygon.as_ref();
        if corners.len() < 3 {
            return Err(MeshError::DegenerateFace { polygon: pi });
        }
        for (i, &vi) in corners.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex {
                    polygon: pi,
                    vertex: vi,
                });
            }
            if corners[..i].contains(&vi) {
                return Err(MeshError::DegenerateFace { polygon: pi });
            }
        }
    }

    let mut mesh = PolyMesh::new();
    mesh.vertices = vertices.iter().map(|&p| Vertex::new(p)).collect();

    // Map from undirected vertex pair to edge ID
    let mut edge_map: HashMap<(usize, usize), EdgeId<I>> = HashMap::new();

    for polygon in polygons {
        let corners = polygon.as_ref();
        mesh.polygons.push(Polygon {
            loop_start: mesh.loops.len(),
            loop_total: corners.len(),
        });

        for (i, &v0) in corners.iter().enumerate() {
            let v1 = corners[(i + 1) % corners.len()];
            let key = (v0.min(v1), v0.max(v1));
            let edges = &mut mesh.edges;
            let edge = *edge_map.entry(key).or_insert_with(|| {
                edges.push(Edge {
                    vertices: [VertexId::new(key.0), VertexId::new(key.1)],
                    flags: EdgeFlags::default(),
                });
                EdgeId::new(edges.len() - 1)
            });
            mesh.loops.push(Loop {
                vertex: VertexId::new(v0),
                edge,
            });
        }
    }

    mesh.update_normals();
    Ok(mesh)
}

/// Convert a polygon mesh back to a face-vertex representation.
///
/// Returns (vertices, polygons) tuple.
pub fn to_face_vertex<I: MeshIndex>(mesh: &PolyMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices: Vec<Point3<f64>> = mesh.vertex_ids().map(|v| *mesh.position(v)).collect();

    let polygons: Vec<Vec<usize>> = mesh
        .polygon_ids()
        .map(|p| mesh.polygon_vertices(p).map(|v| v.index()).collect())
        .collect();

    (vertices, polygons)
}
