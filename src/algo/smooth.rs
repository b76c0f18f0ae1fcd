//! Smoothing pass over adjusted loop normals.
//!
//! After the rotation pass, corners on either side of a smooth (non-seam,
//! non-sharp, shallow) edge may disagree. Around each affected vertex the
//! incident polygons are partitioned into smoothing groups by flood fill, and
//! every group's corner normals at that vertex are replaced by their average.
//!
//! # Example
//!
//! ```
//! use trim_normals::algo::smooth::smoothing_groups;
//!
//! // Polygons 0-1 and 2-3 are linked; 4 stands alone
//! let linked = |a: usize, b: usize| a / 2 == b / 2 && a != 4 && b != 4;
//! let groups = smoothing_groups(&[0, 1, 2, 3, 4], |&a, &b| linked(a, b));
//! assert_eq!(groups, vec![vec![0, 1], vec![2, 3], vec![4]]);
//! ```

use nalgebra::Vector3;
use rayon::prelude::*;

use super::influence::AdjustState;
use super::loop_normals::LoopNormals;
use crate::mesh::{LoopId, MeshIndex, MeshSource, PolygonId, VertexId};

/// Averages shorter than this are not renormalized.
const AVERAGE_EPSILON: f64 = 1e-12;

/// Options for the smoothing pass.
#[derive(Debug, Clone, Copy)]
pub struct SmoothOptions {
    /// Polygons whose face normals are at least this far apart (radians)
    /// are not smoothed together.
    pub angle_threshold: f64,

    /// Whether to rescale averaged normals to unit length.
    pub renormalize: bool,

    /// Whether to use parallel execution.
    pub parallel: bool,
}

/// Check whether loops of `a` and `b` should share a normal.
///
/// Two polygons are smoothed together when they share an edge, that edge
/// (the first shared one) is neither in the working seam set nor sharp, and
/// their face normals are closer than `angle_threshold`.
pub fn should_smooth<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    a: PolygonId<I>,
    b: PolygonId<I>,
    angle_threshold: f64,
) -> bool
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    let Some(edge) = state.adjacency().first_shared_edge(a, b) else {
        return false;
    };
    if state.is_selected(edge) || mesh.edge_flags(edge).sharp {
        return false;
    }
    mesh.polygon_normal(a).angle(&mesh.polygon_normal(b)) < angle_threshold
}

/// Collect the smoothing group containing `start`.
///
/// Flood fills from `start` through `candidates` under `linked`, marking
/// every reached candidate in `seen`. `seen` is indexed like `candidates`.
pub fn smooth_set<T, F>(start: usize, candidates: &[T], seen: &mut [bool], linked: &mut F) -> Vec<T>
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    let mut group = Vec::new();
    let mut stack = vec![start];
    seen[start] = true;

    while let Some(i) = stack.pop() {
        group.push(i);
        for j in 0..candidates.len() {
            if !seen[j] && linked(&candidates[i], &candidates[j]) {
                seen[j] = true;
                stack.push(j);
            }
        }
    }

    // Report members in candidate order
    group.sort_unstable();
    group.into_iter().map(|i| candidates[i]).collect()
}

/// Partition `candidates` into connected components under `linked`.
///
/// Groups are ordered by their first member, and members keep candidate
/// order.
pub fn smoothing_groups<T, F>(candidates: &[T], mut linked: F) -> Vec<Vec<T>>
where
    T: Copy,
    F: FnMut(&T, &T) -> bool,
{
    let mut seen = vec![false; candidates.len()];
    let mut groups = Vec::new();
    for start in 0..candidates.len() {
        if !seen[start] {
            groups.push(smooth_set(start, candidates, &mut seen, &mut linked));
        }
    }
    groups
}

/// Compute the smoothed normals of the loops at vertex `v`.
///
/// Reads the current working normals and returns the new value of every
/// loop at `v`, grouped by smoothing group. A group whose average vanishes
/// is left out, keeping its loops as they are.
pub fn smooth_vertex<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    normals: &LoopNormals<I>,
    v: VertexId<I>,
    options: &SmoothOptions,
) -> Vec<(LoopId<I>, Vector3<f64>)>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    let candidates = state.adjacency().connected_polygons(v);
    let groups = smoothing_groups(candidates, |&a, &b| {
        should_smooth(mesh, state, a, b, options.angle_threshold)
    });

    let mut updates = Vec::new();
    for group in groups {
        let loops: Vec<LoopId<I>> = group
            .iter()
            .flat_map(|&p| mesh.polygon_loop_range(p))
            .map(LoopId::new)
            .filter(|&l| mesh.loop_vertex(l) == v)
            .collect();
        if loops.is_empty() {
            continue;
        }

        let sum: Vector3<f64> = loops.iter().map(|&l| normals.normal(l)).sum();
        let mean = sum / loops.len() as f64;
        if mean.norm_squared() < AVERAGE_EPSILON {
            log::trace!("smoothing group at {:?} cancels out, left unchanged", v);
            continue;
        }
        let average = if options.renormalize {
            mean.normalize()
        } else {
            mean
        };

        updates.extend(loops.into_iter().map(|l| (l, average)));
    }
    updates
}

/// Run the smoothing pass over every affected vertex.
///
/// All groups are computed from the normals as they were when the pass
/// started, then written back and marked affected.
pub fn smooth_pass<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    normals: &mut LoopNormals<I>,
    options: &SmoothOptions,
) where
    I: MeshIndex,
    M: MeshSource<I> + Sync + ?Sized,
{
    let vertices: Vec<VertexId<I>> = state.affected_vertices().iter().copied().collect();
    let snapshot: &LoopNormals<I> = normals;

    let updates: Vec<Vec<(LoopId<I>, Vector3<f64>)>> = if options.parallel {
        vertices
            .par_iter()
            .map(|&v| smooth_vertex(mesh, state, snapshot, v, options))
            .collect()
    } else {
        vertices
            .iter()
            .map(|&v| smooth_vertex(mesh, state, snapshot, v, options))
            .collect()
    };

    let mut written = 0;
    for (l, n) in updates.into_iter().flatten() {
        normals.set(l, n);
        written += 1;
    }
    log::debug!(
        "smoothed {} loops around {} vertices",
        written,
        vertices.len()
    );
}
