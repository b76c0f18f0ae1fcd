//! Face and split normal computation for [`PolyMesh`].
//!
//! Face normals use Newell's method so that non-planar quads still get a
//! stable average orientation. Split normals follow the usual auto-smooth
//! rule: around each vertex, corners whose polygons meet at a non-sharp,
//! manifold edge with a face angle strictly below the auto-smooth angle are
//! shaded together with the area-weighted average of their face normals.

use std::collections::HashMap;

use nalgebra::Vector3;

use super::index::{EdgeId, MeshIndex, PolygonId, VertexId};
use super::poly::PolyMesh;

/// Vectors shorter than this are treated as zero.
pub(crate) const NORMAL_EPSILON: f64 = 1e-12;

/// Check whether a stored custom normal overrides the default.
#[inline]
pub(crate) fn is_override(n: &Vector3<f64>) -> bool {
    n.norm_squared() > NORMAL_EPSILON
}

/// Newell normal of a polygon: twice the vector area, not normalized.
fn newell_vector<I: MeshIndex>(mesh: &PolyMesh<I>, p: PolygonId<I>) -> Vector3<f64> {
    let corners: Vec<_> = mesh.polygon_vertices(p).map(|v| *mesh.position(v)).collect();
    let mut n = Vector3::zeros();
    for (i, a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// Compute unit face normals for all polygons.
///
/// Zero-area polygons get a zero normal.
pub(crate) fn compute_face_normals<I: MeshIndex>(mesh: &PolyMesh<I>) -> Vec<Vector3<f64>> {
    mesh.polygon_ids()
        .map(|p| {
            newell_vector(mesh, p)
                .try_normalize(NORMAL_EPSILON)
                .unwrap_or_else(Vector3::zeros)
        })
        .collect()
}

/// Compute auto-smoothed split normals for all loops.
///
/// Expects `mesh.face_normals` to be current.
pub(crate) fn compute_split_normals<I: MeshIndex>(mesh: &PolyMesh<I>) -> Vec<Vector3<f64>> {
    let mut normals = vec![Vector3::zeros(); mesh.num_loops()];
    let weighted: Vec<Vector3<f64>> = mesh.polygon_ids().map(|p| newell_vector(mesh, p)).collect();

    // Corners around each vertex as (polygon, loop index)
    let mut corners: Vec<Vec<(PolygonId<I>, usize)>> = vec![Vec::new(); mesh.num_vertices()];
    for p in mesh.polygon_ids() {
        for l in mesh.polygon(p).loop_range() {
            corners[mesh.loops[l].vertex.index()].push((p, l));
        }
    }

    for (vi, around) in corners.iter().enumerate() {
        if around.is_empty() {
            continue;
        }
        let v = VertexId::<I>::new(vi);

        // Corners touching each edge incident to v
        let mut by_edge: HashMap<EdgeId<I>, Vec<usize>> = HashMap::new();
        for (ci, &(p, l)) in around.iter().enumerate() {
            let range = mesh.polygon(p).loop_range();
            let prev = if l == range.start { range.end - 1 } else { l - 1 };
            for e in [mesh.loops[l].edge, mesh.loops[prev].edge] {
                if mesh.edge(e).contains(v) {
                    by_edge.entry(e).or_default().push(ci);
                }
            }
        }

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); around.len()];
        for (e, touching) in &by_edge {
            if touching.len() != 2 || mesh.edge_flags(*e).sharp {
                continue;
            }
            let (a, b) = (touching[0], touching[1]);
            let na = mesh.polygon_normal(around[a].0);
            let nb = mesh.polygon_normal(around[b].0);
            if na.angle(&nb) < mesh.auto_smooth_angle() {
                neighbors[a].push(b);
                neighbors[b].push(a);
            }
        }

        // Flood fill the smooth fans around v
        let mut group = vec![usize::MAX; around.len()];
        for start in 0..around.len() {
            if group[start] != usize::MAX {
                continue;
            }
            let mut members = Vec::new();
            let mut stack = vec![start];
            group[start] = start;
            while let Some(c) = stack.pop() {
                members.push(c);
                for &n in &neighbors[c] {
                    if group[n] == usize::MAX {
                        group[n] = start;
                        stack.push(n);
                    }
                }
            }

            let sum: Vector3<f64> = members.iter().map(|&c| weighted[around[c].0.index()]).sum();
            for &c in &members {
                let (p, l) = around[c];
                normals[l] = sum
                    .try_normalize(NORMAL_EPSILON)
                    .unwrap_or_else(|| mesh.polygon_normal(p));
            }
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, LoopId};
    use nalgebra::Point3;

    /// Two unit quads sharing the edge x = 1, the second one folded up by `angle`.
    fn folded_pair(angle: f64) -> PolyMesh {
        let (s, c) = angle.sin_cos();
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0 + c, 0.0, s),
            Point3::new(1.0 + c, 1.0, s),
        ];
        build_from_polygons(&positions, &[vec![0, 1, 2, 3], vec![1, 4, 5, 2]]).unwrap()
    }

    #[test]
    fn test_newell_normal_of_non_planar_quad() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.1),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.1),
        ];
        let mesh: PolyMesh = build_from_polygons(&positions, &[vec![0, 1, 2, 3]]).unwrap();
        let n = mesh.polygon_normal(PolygonId::new(0));
        assert!((n.norm() - 1.0).abs() < 1e-10);
        assert!(n.z > 0.99);
    }

    #[test]
    fn test_shallow_fold_is_smooth() {
        let mesh = folded_pair(10f64.to_radians());
        // Loop 1 (quad 0 at v1) and loop 4 (quad 1 at v1) share a smooth normal
        let a = mesh.split_normal(LoopId::new(1));
        let b = mesh.split_normal(LoopId::new(4));
        assert!((a - b).norm() < 1e-10);
        assert!((a.norm() - 1.0).abs() < 1e-10);
        // Far corner keeps the flat face normal
        assert!((mesh.split_normal(LoopId::new(0)) - Vector3::z()).norm() < 1e-10);
    }

    #[test]
    fn test_steep_fold_is_split() {
        let mesh = folded_pair(90f64.to_radians());
        let a = mesh.split_normal(LoopId::new(1));
        let b = mesh.split_normal(LoopId::new(4));
        assert!((a - mesh.polygon_normal(PolygonId::new(0))).norm() < 1e-10);
        assert!((b - mesh.polygon_normal(PolygonId::new(1))).norm() < 1e-10);
    }

    #[test]
    fn test_fold_at_exact_threshold_is_split() {
        let mut mesh = folded_pair(40f64.to_radians());
        let n0 = mesh.polygon_normal(PolygonId::new(0));
        let n1 = mesh.polygon_normal(PolygonId::new(1));
        mesh.set_auto_smooth_angle(n0.angle(&n1)).unwrap();

        assert!((mesh.split_normal(LoopId::new(1)) - n0).norm() < 1e-10);
        assert!((mesh.split_normal(LoopId::new(4)) - n1).norm() < 1e-10);
    }

    #[test]
    fn test_sharp_edge_splits_shallow_fold() {
        let mut mesh = folded_pair(10f64.to_radians());
        let shared = mesh.find_edge(VertexId::new(1), VertexId::new(2)).unwrap();
        mesh.set_sharp(shared, true);

        let a = mesh.split_normal(LoopId::new(1));
        assert!((a - Vector3::z()).norm() < 1e-10);
    }
}
