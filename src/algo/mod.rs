//! The normal-adjustment engine.
//!
//! Everything here is written against [`MeshSource`](crate::mesh::MeshSource)
//! and [`MeshSink`](crate::mesh::MeshSink), leaves first:
//!
//! - [`adjacency`]: vertex to polygon and polygon pair to shared edge lookups
//! - [`influence`]: the working seam set and the polygons influencing a loop
//! - [`rotate`]: rotation of a single loop normal toward a right-angle crease
//! - [`smooth`]: re-averaging of loop normals across smooth boundaries
//! - [`adjust`]: both passes, producing the final per-loop normals

pub mod adjacency;
pub mod adjust;
pub mod influence;
pub mod loop_normals;
mod progress;
pub mod rotate;
pub mod smooth;

pub use adjacency::AdjacencyIndex;
pub use adjust::{
    adjust_normals, adjust_normals_with_progress, apply_adjustment,
    apply_adjustment_with_progress, AdjustOptions, SeamSource,
};
pub use influence::AdjustState;
pub use loop_normals::LoopNormals;
pub use progress::Progress;
pub use rotate::{DegenerateAxis, NormalBase};
