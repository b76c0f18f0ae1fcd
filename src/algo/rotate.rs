//! Per-loop rotation toward a right-angle crease.
//!
//! For a loop on polygon `P` at an affected vertex, every polygon `O` that
//! meets `P` across a seam at that vertex pulls the loop normal by half of
//! the deviation of the `P`/`O` face angle from 90 degrees:
//!
//! ```text
//! delta = (angle(nP, nO) - pi/2) / 2
//! axis  = normalize(nP x nO)
//! n     = rotate(n, axis, delta)
//! ```
//!
//! The matching loop on `O` receives the other half when it is processed, so
//! the two corner normals end up a right angle apart. With several
//! influences the rotations are applied in polygon order; rotations do not
//! commute, so that order is part of the result.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};

use super::influence::AdjustState;
use crate::mesh::{EdgeId, LoopId, MeshIndex, MeshSource, PolygonId};

/// Cross products shorter than this give no usable rotation axis.
pub const AXIS_EPSILON: f64 = 1e-9;

/// The normal a loop starts from before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalBase {
    /// The loop's current (host split) normal.
    #[default]
    Loop,
    /// The owning polygon's face normal.
    Face,
}

/// What to do when two face normals are parallel or anti-parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateAxis {
    /// Skip the influence: it contributes no rotation.
    #[default]
    Skip,
    /// Rotate about the shared seam edge, treating the fold as convex.
    SharedEdge,
}

/// Rotation applied to a loop for a face angle `angle`, in radians.
#[inline]
pub fn rotation_delta(angle: f64) -> f64 {
    (angle - std::f64::consts::FRAC_PI_2) / 2.0
}

/// Rotate `v` about `axis` by `angle` radians (right-handed).
#[inline]
pub fn rotate(v: &Vector3<f64>, axis: &Unit<Vector3<f64>>, angle: f64) -> Vector3<f64> {
    UnitQuaternion::from_axis_angle(axis, angle) * v
}

/// Rotation axis for the influence of `other` on `poly`.
///
/// Returns `None` when the axis is undefined and the policy does not
/// provide a fallback.
pub fn rotation_axis<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    poly: PolygonId<I>,
    other: PolygonId<I>,
    policy: DegenerateAxis,
) -> Option<Unit<Vector3<f64>>>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    let n_poly = mesh.polygon_normal(poly);
    let n_other = mesh.polygon_normal(other);

    if let Some(axis) = Unit::try_new(n_poly.cross(&n_other), AXIS_EPSILON) {
        return Some(axis);
    }

    match policy {
        DegenerateAxis::Skip => None,
        DegenerateAxis::SharedEdge => {
            let edge = state.selected_shared_edge(poly, other)?;
            edge_fold_axis(mesh, poly, edge)
        }
    }
}

/// Axis for folding `poly` outward across `edge`.
///
/// This is `n x t`, where `t` is the in-plane direction perpendicular to the
/// edge pointing from the polygon's interior toward the edge. It matches the
/// limit of `nP x nO` for a convex fold.
fn edge_fold_axis<I, M>(mesh: &M, poly: PolygonId<I>, edge: EdgeId<I>) -> Option<Unit<Vector3<f64>>>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    let n = mesh.polygon_normal(poly);
    let [a, b] = mesh.edge_vertices(edge);
    let (pa, pb) = (mesh.vertex_position(a), mesh.vertex_position(b));

    let mut t = Unit::try_new(n.cross(&(pb - pa)), AXIS_EPSILON)?.into_inner();
    let outward = Point3::from((pa.coords + pb.coords) / 2.0) - polygon_centroid(mesh, poly);
    if t.dot(&outward) < 0.0 {
        t = -t;
    }
    Unit::try_new(n.cross(&t), AXIS_EPSILON)
}

fn polygon_centroid<I, M>(mesh: &M, poly: PolygonId<I>) -> Point3<f64>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    let range = mesh.polygon_loop_range(poly);
    let count = range.len() as f64;
    let sum: Vector3<f64> = range
        .map(|l| mesh.vertex_position(mesh.loop_vertex(LoopId::new(l))).coords)
        .sum();
    Point3::from(sum / count)
}

/// Compute the adjusted normal of loop `l` on polygon `poly`.
///
/// Returns `None` if the loop's vertex is not affected, in which case the
/// loop must be left untouched. Otherwise the starting normal is rotated once
/// per influencing polygon; influences without a usable axis are skipped.
pub fn adjust_loop<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    poly: PolygonId<I>,
    l: LoopId<I>,
    base: NormalBase,
    policy: DegenerateAxis,
) -> Option<Vector3<f64>>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    let vertex = mesh.loop_vertex(l);
    if !state.should_affect(vertex) {
        return None;
    }

    let n_poly = mesh.polygon_normal(poly);
    let mut normal = match base {
        NormalBase::Loop => mesh.loop_normal(l),
        NormalBase::Face => n_poly,
    };

    for other in state.influential_polygons(poly, vertex) {
        let n_other = mesh.polygon_normal(other);
        if n_poly.norm_squared() < AXIS_EPSILON || n_other.norm_squared() < AXIS_EPSILON {
            log::trace!("skipping zero-area polygon pair {:?}/{:?}", poly, other);
            continue;
        }

        let Some(axis) = rotation_axis(mesh, state, poly, other, policy) else {
            log::trace!(
                "no rotation axis for {:?} at {:?}: {:?} and {:?} are parallel",
                l,
                vertex,
                poly,
                other
            );
            continue;
        };

        let delta = rotation_delta(n_poly.angle(&n_other));
        normal = rotate(&normal, &axis, delta);
    }

    Some(normal)
}
