//! # trim-normals
//!
//! Split normal adjustment for trim-sheet modeling.
//!
//! Hard-surface models built for trim sheets are mostly quads whose UV seams
//! follow the creases of the surface. Shading them with plain smooth normals
//! washes those creases out. This crate recomputes per-loop (face corner)
//! normals so that faces meeting at a seam read as meeting at a crisp right
//! angle, while everything away from the seams keeps its default shading.
//!
//! ## Features
//!
//! - **Polygon mesh**: corner-based mesh with seam, sharp and selection edge
//!   flags, auto-smoothed split normals and custom normal overrides
//! - **Adjustment engine**: seam-driven loop normal rotation and a
//!   connected-component smoothing pass, written against the
//!   [`MeshSource`](mesh::MeshSource) and [`MeshSink`](mesh::MeshSink) traits
//! - **Host operators**: mode-aware selection tools and a scoped mode guard
//! - **File formats**: PLY with edge flags and custom normals, OBJ export
//!
//! ## Quick Start
//!
//! ```no_run
//! use trim_normals::prelude::*;
//!
//! let mut mesh: PolyMesh = trim_normals::io::load("panel.ply").unwrap();
//!
//! // Use the UV seams as trim seams
//! let options = AdjustOptions::default().with_seam_source(SeamSource::Seams);
//! let normals = apply_adjustment(&mut mesh, &options).unwrap();
//! println!("adjusted {} loops", normals.affected_count());
//!
//! trim_normals::io::save(&mesh, "panel_shaded.obj").unwrap();
//! ```
//!
//! ## Working Through a Host
//!
//! ```
//! use trim_normals::prelude::*;
//! use trim_normals::host::{self, Document};
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, -1.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, -1.0),
//! ];
//! let mut mesh: PolyMesh =
//!     build_from_polygons(&positions, &[[0, 1, 4, 3], [1, 2, 5, 4]]).unwrap();
//! let seam = mesh.find_edge(VertexId::new(1), VertexId::new(4)).unwrap();
//! mesh.set_seam(seam, true);
//!
//! let mut doc = Document::new(mesh);
//! host::select_seams(&mut doc).unwrap();
//! let report = host::adjust_trim_normals(&mut doc, &AdjustOptions::default(), &Progress::none())
//!     .unwrap();
//! assert_eq!(report.affected_loops, 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod host;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use trim_normals::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        adjust_normals, apply_adjustment, AdjustOptions, DegenerateAxis, LoopNormals,
        NormalBase, Progress, SeamSource,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::host::{Host, Mode};
    pub use crate::mesh::{
        build_from_polygons, EdgeFlags, EdgeId, LoopId, MeshIndex, MeshSink, MeshSource,
        PolyMesh, PolygonId, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
