//! Trim-normal adjustment: the rotation pass followed by the smoothing pass.
//!
//! # Example
//!
//! ```
//! use trim_normals::prelude::*;
//! use trim_normals::algo::adjust::{apply_adjustment, AdjustOptions};
//! use nalgebra::Point3;
//!
//! // Two quads folded 60 degrees along the edge x = 1
//! let (s, c) = 60f64.to_radians().sin_cos();
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0 + c, 0.0, -s),
//!     Point3::new(1.0 + c, 1.0, -s),
//! ];
//! let mut mesh: PolyMesh = build_from_polygons(&positions, &[[0, 1, 2, 3], [1, 4, 5, 2]]).unwrap();
//! let seam = mesh.find_edge(VertexId::new(1), VertexId::new(2)).unwrap();
//! mesh.set_selected(seam, true);
//!
//! let normals = apply_adjustment(&mut mesh, &AdjustOptions::default()).unwrap();
//! assert_eq!(normals.affected_count(), 4);
//!
//! // Corners on either side of the seam now meet at a right angle
//! let a = mesh.loop_normal(LoopId::new(1));
//! let b = mesh.loop_normal(LoopId::new(4));
//! assert!((a.angle(&b) - std::f64::consts::FRAC_PI_2).abs() < 1e-10);
//! ```

use std::ops::Range;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use super::influence::AdjustState;
use super::loop_normals::LoopNormals;
use super::rotate::{adjust_loop, DegenerateAxis, NormalBase};
use super::smooth::{smooth_pass, SmoothOptions};
use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeFlags, EdgeId, LoopId, MeshIndex, MeshSink, MeshSource, PolygonId, VertexId};

/// Which edge flag forms the working seam set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeamSource {
    /// Edges currently selected.
    #[default]
    Selected,
    /// Edges marked as UV seams.
    Seams,
}

/// Options for trim-normal adjustment.
#[derive(Debug, Clone)]
pub struct AdjustOptions {
    /// Which edges act as trim seams.
    pub seam_source: SeamSource,

    /// The normal each loop starts from before rotation.
    pub base: NormalBase,

    /// Handling of influences with parallel face normals.
    pub degenerate: DegenerateAxis,

    /// Whether to run the smoothing pass.
    pub smoothing: bool,

    /// Smoothing threshold in radians. `None` uses the mesh's auto-smooth
    /// angle.
    pub smooth_angle: Option<f64>,

    /// Whether smoothed normals are rescaled to unit length.
    pub renormalize: bool,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for AdjustOptions {
    fn default() -> Self {
        Self {
            seam_source: SeamSource::Selected,
            base: NormalBase::Loop,
            degenerate: DegenerateAxis::Skip,
            smoothing: true,
            smooth_angle: None,
            renormalize: true,
            parallel: true,
        }
    }
}

impl AdjustOptions {
    /// Set which edges act as trim seams.
    pub fn with_seam_source(mut self, source: SeamSource) -> Self {
        self.seam_source = source;
        self
    }

    /// Set the normal each loop starts from.
    pub fn with_base(mut self, base: NormalBase) -> Self {
        self.base = base;
        self
    }

    /// Set the policy for parallel face normals.
    pub fn with_degenerate_axis(mut self, policy: DegenerateAxis) -> Self {
        self.degenerate = policy;
        self
    }

    /// Enable or disable the smoothing pass.
    pub fn with_smoothing(mut self, smoothing: bool) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Override the smoothing threshold, in radians.
    pub fn with_smooth_angle(mut self, angle: f64) -> Self {
        self.smooth_angle = Some(angle);
        self
    }

    /// Set whether smoothed normals are renormalized.
    pub fn with_renormalize(mut self, renormalize: bool) -> Self {
        self.renormalize = renormalize;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(angle) = self.smooth_angle {
            if !angle.is_finite() || angle < 0.0 {
                return Err(MeshError::invalid_param(
                    "smooth_angle",
                    angle,
                    "must be a non-negative angle in radians",
                ));
            }
        }
        Ok(())
    }
}

/// Edges forming the working seam set, in index order.
pub fn working_seam_set<I, M>(mesh: &M, source: SeamSource) -> Vec<EdgeId<I>>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
    (0..mesh.num_edges())
        .map(EdgeId::new)
        .filter(|&e| {
            let flags = mesh.edge_flags(e);
            match source {
                SeamSource::Selected => flags.select,
                SeamSource::Seams => flags.seam,
            }
        })
        .collect()
}

/// Compute adjusted loop normals without modifying the mesh.
///
/// Loops start from the mesh's current loop normals, custom ones included.
/// [`apply_adjustment`] starts from the host default instead.
pub fn adjust_normals<I, M>(mesh: &M, options: &AdjustOptions) -> Result<LoopNormals<I>>
where
    I: MeshIndex,
    M: MeshSource<I> + Sync + ?Sized,
{
    adjust_normals_with_progress(mesh, options, &Progress::none())
}

/// Compute adjusted loop normals, reporting progress per pass.
pub fn adjust_normals_with_progress<I, M>(
    mesh: &M,
    options: &AdjustOptions,
    progress: &Progress,
) -> Result<LoopNormals<I>>
where
    I: MeshIndex,
    M: MeshSource<I> + Sync + ?Sized,
{
    options.validate()?;
    progress.report(0, 3, "Building adjacency");
    let state = AdjustState::new(mesh, working_seam_set(mesh, options.seam_source))?;
    Ok(run_passes(mesh, &state, options, progress))
}

/// Adjust loop normals in place.
///
/// Rotation starts from the host default normals, ignoring any custom
/// normals already on the mesh. The affected loops then replace the custom
/// normals in a single write. Everything is computed and checked before that
/// write, so on error the mesh is left untouched.
pub fn apply_adjustment<I, M>(mesh: &mut M, options: &AdjustOptions) -> Result<LoopNormals<I>>
where
    I: MeshIndex,
    M: MeshSource<I> + MeshSink<I> + Sync + ?Sized,
{
    apply_adjustment_with_progress(mesh, options, &Progress::none())
}

/// [`apply_adjustment`] with progress reporting.
pub fn apply_adjustment_with_progress<I, M>(
    mesh: &mut M,
    options: &AdjustOptions,
    progress: &Progress,
) -> Result<LoopNormals<I>>
where
    I: MeshIndex,
    M: MeshSource<I> + MeshSink<I> + Sync + ?Sized,
{
    options.validate()?;
    progress.report(0, 3, "Building adjacency");
    let state = AdjustState::new(&*mesh, working_seam_set(&*mesh, options.seam_source))?;

    let normals = run_passes(&HostDefaults(&*mesh), &state, options, progress);
    let overrides = normals.to_host_array();
    if overrides.iter().any(|n| !n.iter().all(|c| c.is_finite())) {
        return Err(MeshError::InvalidState(
            "adjusted normals contain non-finite values".to_string(),
        ));
    }
    mesh.set_custom_normals(&overrides)?;
    Ok(normals)
}

/// A mesh seen with its custom normals cleared.
struct HostDefaults<'a, M: ?Sized>(&'a M);

impl<I, M> MeshSource<I> for HostDefaults<'_, M>
where
    I: MeshIndex,
    M: MeshSource<I> + ?Sized,
{
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
        self.0.num_loops()
    }
    fn vertex_position(&self, v: VertexId<I>) -> Point3<f64> {
        self.0.vertex_position(v)
    }
    fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        self.0.edge_vertices(e)
    }
    fn edge_flags(&self, e: EdgeId<I>) -> EdgeFlags {
        self.0.edge_flags(e)
    }
    fn polygon_loop_range(&self, p: PolygonId<I>) -> Range<usize> {
        self.0.polygon_loop_range(p)
    }
    fn polygon_normal(&self, p: PolygonId<I>) -> Vector3<f64> {
        self.0.polygon_normal(p)
    }
    fn loop_vertex(&self, l: LoopId<I>) -> VertexId<I> {
        self.0.loop_vertex(l)
    }
    fn loop_edge(&self, l: LoopId<I>) -> EdgeId<I> {
        self.0.loop_edge(l)
    }
    fn loop_normal(&self, l: LoopId<I>) -> Vector3<f64> {
        self.0.default_loop_normal(l)
    }
    fn default_loop_normal(&self, l: LoopId<I>) -> Vector3<f64> {
        self.0.default_loop_normal(l)
    }
    fn auto_smooth_angle(&self) -> f64 {
        self.0.auto_smooth_angle()
    }
}

/// Rotation and smoothing over a validated state.
fn run_passes<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    options: &AdjustOptions,
    progress: &Progress,
) -> LoopNormals<I>
where
    I: MeshIndex,
    M: MeshSource<I> + Sync + ?Sized,
{
    log::debug!(
        "adjusting normals: {} seam edges, {} affected vertices",
        state.selected_edges().len(),
        state.affected_vertices().len()
    );

    let mut normals = LoopNormals::from_source(mesh);
    if state.affected_vertices().is_empty() {
        progress.report(3, 3, "Done");
        return normals;
    }

    progress.report(1, 3, "Rotating loop normals");
    let rotated = rotation_pass(mesh, state, options);
    log::debug!("rotated {} loops", rotated.len());
    for (l, n) in rotated {
        normals.set(l, n);
    }

    if options.smoothing {
        progress.report(2, 3, "Smoothing loop normals");
        let smooth = SmoothOptions {
            angle_threshold: options
                .smooth_angle
                .unwrap_or_else(|| mesh.auto_smooth_angle()),
            renormalize: options.renormalize,
            parallel: options.parallel,
        };
        smooth_pass(mesh, state, &mut normals, &smooth);
    }

    progress.report(3, 3, "Done");
    normals
}

fn rotation_pass<I, M>(
    mesh: &M,
    state: &AdjustState<I>,
    options: &AdjustOptions,
) -> Vec<(LoopId<I>, Vector3<f64>)>
where
    I: MeshIndex,
    M: MeshSource<I> + Sync + ?Sized,
{
    let per_polygon = |p: usize| -> Vec<(LoopId<I>, Vector3<f64>)> {
        let poly = PolygonId::new(p);
        mesh.polygon_loop_range(poly)
            .map(LoopId::new)
            .filter_map(|l| {
                adjust_loop(mesh, state, poly, l, options.base, options.degenerate)
                    .map(|n| (l, n))
            })
            .collect()
    };

    if options.parallel {
        (0..mesh.num_polygons())
            .into_par_iter()
            .flat_map_iter(per_polygon)
            .collect()
    } else {
        (0..mesh.num_polygons()).flat_map(per_polygon).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_polygons, PolyMesh};
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    /// A flat 2x1 strip of unit quads with the middle edge selected.
    ///
    /// ```text
    /// 3---4---5
    /// | 0 | 1 |
    /// 0---1---2
    /// ```
    fn strip() -> PolyMesh {
        let mut positions = Vec::new();
        for y in 0..2 {
            for x in 0..3 {
                positions.push(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        let mut mesh: PolyMesh =
            build_from_polygons(&positions, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap();
        let seam = mesh.find_edge(VertexId::new(1), VertexId::new(4)).unwrap();
        mesh.set_selected(seam, true);
        mesh
    }

    /// Two quads folded `angle` apart along the edge 1-2, which is selected.
    fn folded_pair(angle: f64) -> PolyMesh {
        let (s, c) = angle.sin_cos();
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0 + c, 0.0, -s),
            Point3::new(1.0 + c, 1.0, -s),
        ];
        let mut mesh: PolyMesh =
            build_from_polygons(&positions, &[[0, 1, 2, 3], [1, 4, 5, 2]]).unwrap();
        let seam = mesh.find_edge(VertexId::new(1), VertexId::new(2)).unwrap();
        mesh.set_selected(seam, true);
        mesh
    }

    #[test]
    fn test_flat_strip_splits_at_45_degrees() {
        let mut mesh = strip();
        let options = AdjustOptions::default()
            .with_degenerate_axis(DegenerateAxis::SharedEdge)
            .sequential();
        let normals = apply_adjustment(&mut mesh, &options).unwrap();

        // Loops 1, 2 (polygon 0) and 4, 7 (polygon 1) touch the seam
        let near = [1, 2, 4, 7];
        assert_eq!(normals.affected_count(), near.len());
        for l in near {
            let n = mesh.loop_normal(LoopId::new(l));
            assert!((n.angle(&Vector3::z()) - FRAC_PI_4).abs() < 1e-10);
        }
        // Polygon 0 leans away from polygon 1 and vice versa
        assert!(mesh.loop_normal(LoopId::new(1)).x < 0.0);
        assert!(mesh.loop_normal(LoopId::new(4)).x > 0.0);

        for l in [0, 3, 5, 6] {
            assert_eq!(mesh.custom_normal(LoopId::new(l)), None);
            assert!((mesh.loop_normal(LoopId::new(l)) - Vector3::z()).norm() < 1e-10);
        }
    }

    #[test]
    fn test_flat_strip_skips_by_default() {
        let mesh = strip();
        let normals = adjust_normals(&mesh, &AdjustOptions::default()).unwrap();
        assert_eq!(normals.affected_count(), 4);
        for n in normals.normals() {
            assert!(n.iter().all(|c| c.is_finite()));
            assert!((n - Vector3::z()).norm() < 1e-10);
        }
    }

    #[test]
    fn test_fold_becomes_right_angle() {
        for degrees in [20.0, 60.0, 90.0, 135.0] {
            let mut mesh = folded_pair(f64::to_radians(degrees));
            mesh.set_auto_smooth_angle(0.0).unwrap();
            apply_adjustment(&mut mesh, &AdjustOptions::default()).unwrap();

            // Vertex 1 is loop 1 on polygon 0 and loop 4 on polygon 1;
            // vertex 2 is loop 2 and loop 7
            for (a, b) in [(1, 4), (2, 7)] {
                let na = mesh.loop_normal(LoopId::new(a));
                let nb = mesh.loop_normal(LoopId::new(b));
                assert!(
                    (na.angle(&nb) - FRAC_PI_2).abs() < 1e-10,
                    "fold of {} degrees",
                    degrees
                );
            }
        }
    }

    #[test]
    fn test_empty_seam_set_changes_nothing() {
        let mut mesh = strip();
        mesh.deselect_all();
        let before: Vec<_> = mesh.loop_ids().map(|l| mesh.loop_normal(l)).collect();

        let normals = apply_adjustment(&mut mesh, &AdjustOptions::default()).unwrap();

        assert_eq!(normals.affected_count(), 0);
        assert!(!mesh.has_custom_normals());
        let after: Vec<_> = mesh.loop_ids().map(|l| mesh.loop_normal(l)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_seam_source_uses_seam_flags() {
        let mut mesh = strip();
        mesh.deselect_all();
        let edge = mesh.find_edge(VertexId::new(1), VertexId::new(4)).unwrap();
        mesh.set_seam(edge, true);

        let selected = adjust_normals(&mesh, &AdjustOptions::default()).unwrap();
        assert_eq!(selected.affected_count(), 0);

        let options = AdjustOptions::default().with_seam_source(SeamSource::Seams);
        let seams = adjust_normals(&mesh, &options).unwrap();
        assert_eq!(seams.affected_count(), 4);
    }

    #[test]
    fn test_existing_custom_normals_are_replaced() {
        let mut mesh = folded_pair(f64::to_radians(60.0));
        let tilted = vec![Vector3::x(); mesh.num_loops()];
        mesh.set_custom_normals(&tilted).unwrap();

        apply_adjustment(&mut mesh, &AdjustOptions::default()).unwrap();

        // Unaffected loops fall back to the host default
        for l in [0, 3, 5, 6] {
            let l = LoopId::new(l);
            assert_eq!(mesh.custom_normal(l), None);
            assert_eq!(mesh.loop_normal(l), mesh.split_normal(l));
        }
    }

    #[test]
    fn test_invalid_options_leave_mesh_untouched() {
        let mut mesh = folded_pair(f64::to_radians(60.0));
        let tilted = vec![Vector3::x(); mesh.num_loops()];
        mesh.set_custom_normals(&tilted).unwrap();

        let options = AdjustOptions::default().with_smooth_angle(-1.0);
        let result = apply_adjustment(&mut mesh, &options);

        assert!(matches!(result, Err(MeshError::InvalidParameter { .. })));
        assert!(mesh.has_custom_normals());
        assert_eq!(mesh.loop_normal(LoopId::new(0)), Vector3::x());
    }

    #[test]
    fn test_failed_adjustment_keeps_custom_normals() {
        let mut mesh = folded_pair(f64::to_radians(60.0));
        let tilted = vec![Vector3::x(); mesh.num_loops()];
        mesh.set_custom_normals(&tilted).unwrap();
        mesh.set_position(VertexId::new(5), Point3::new(f64::NAN, 1.0, 0.0));

        let result = apply_adjustment(&mut mesh, &AdjustOptions::default());

        assert!(matches!(result, Err(MeshError::InvalidState(_))));
        assert!(mesh.has_custom_normals());
        for l in mesh.loop_ids() {
            assert_eq!(mesh.loop_normal(l), Vector3::x());
        }
    }

    #[test]
    fn test_adjustment_ignores_existing_custom_normals() {
        let mut plain = folded_pair(f64::to_radians(60.0));
        let mut tilted = plain.clone();
        tilted
            .set_custom_normals(&vec![Vector3::x(); tilted.num_loops()])
            .unwrap();

        let a = apply_adjustment(&mut plain, &AdjustOptions::default()).unwrap();
        let b = apply_adjustment(&mut tilted, &AdjustOptions::default()).unwrap();

        assert_eq!(a, b);
        for l in plain.loop_ids() {
            assert_eq!(plain.loop_normal(l), tilted.loop_normal(l));
        }
    }

    #[test]
    fn test_renormalize_reaches_the_mesh() {
        // 2x2 flat grid with the edge 1-4 selected:
        //
        // 6---7---8
        // | 2 | 3 |
        // 3---4---5
        // | 0 | 1 |
        // 0---1---2
        let mut positions = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                positions.push(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        let polygons = [[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]];
        let mut grid: PolyMesh = build_from_polygons(&positions, &polygons).unwrap();
        let seam = grid.find_edge(VertexId::new(1), VertexId::new(4)).unwrap();
        grid.set_selected(seam, true);

        let options = AdjustOptions::default()
            .with_degenerate_axis(DegenerateAxis::SharedEdge)
            .sequential();
        let mut unit = grid.clone();
        apply_adjustment(&mut unit, &options).unwrap();
        let mut raw = grid;
        apply_adjustment(&mut raw, &options.with_renormalize(false)).unwrap();

        // All four corners at vertex 4 form one smoothing group: two loops
        // leaning 45 degrees apart and two upright ones
        let mean_length = (1.0 + FRAC_PI_4.cos()) / 2.0;
        for l in [2, 7, 9, 12] {
            let l = LoopId::new(l);
            assert!((unit.loop_normal(l).norm() - 1.0).abs() < 1e-10);
            assert!((raw.loop_normal(l).norm() - mean_length).abs() < 1e-10);
            assert!((raw.loop_normal(l).normalize() - Vector3::z()).norm() < 1e-10);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = folded_pair(f64::to_radians(50.0));
        let parallel = adjust_normals(&mesh, &AdjustOptions::default()).unwrap();
        let sequential = adjust_normals(&mesh, &AdjustOptions::default().sequential()).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_progress_reports_each_pass() {
        use std::sync::{Arc, Mutex};

        let mesh = folded_pair(f64::to_radians(45.0));
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let progress = Progress::new(move |current, total, message| {
            sink.lock().unwrap().push((current, total, message.to_string()));
        });

        adjust_normals_with_progress(&mesh, &AdjustOptions::default(), &progress).unwrap();

        let messages = messages.lock().unwrap();
        let steps: Vec<usize> = messages.iter().map(|(c, _, _)| *c).collect();
        assert_eq!(steps, vec![0, 1, 2, 3]);
        assert!(messages.iter().all(|(_, t, _)| *t == 3));
    }
}
