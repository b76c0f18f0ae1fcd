//! Core mesh data structures.
//!
//! This module provides the polygon mesh representation, its index types and
//! the capability traits the normal-adjustment engine reads and writes
//! through.
//!
//! # Overview
//!
//! The primary type is [`PolyMesh`], a corner-based polygon mesh: flat arrays
//! of vertices, edges, polygons and loops (face corners). Each edge carries
//! seam, sharp and selection flags, and each loop carries its own normal so
//! that a vertex can be shaded differently from each of its faces.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an edge
//! - [`PolygonId`] - Identifies a polygon
//! - [`LoopId`] - Identifies a loop (polygon corner)
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! ```
//! use trim_normals::mesh::{build_from_polygons, PolyMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let polygons = vec![[0, 1, 2]];
//!
//! let mesh: PolyMesh = build_from_polygons(&vertices, &polygons).unwrap();
//! assert_eq!(mesh.num_loops(), 3);
//! ```

mod builder;
mod index;
mod normals;
mod poly;
mod source;

pub use builder::{build_from_polygons, to_face_vertex};
pub use index::{EdgeId, LoopId, MeshIndex, PolygonId, VertexId};
pub use poly::{Edge, EdgeFlags, Loop, PolyMesh, Polygon, Vertex, DEFAULT_AUTO_SMOOTH_ANGLE};
pub use source::{MeshSink, MeshSource};
