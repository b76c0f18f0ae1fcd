//! Error types for trim-normals.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

use crate::host::Mode;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no polygons.
    #[error("mesh has no polygons")]
    EmptyMesh,

    /// A polygon references an invalid vertex index.
    #[error("polygon {polygon} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The polygon index.
        polygon: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A loop references an edge that does not exist.
    #[error("loop {loop_index} references invalid edge index {edge}")]
    InvalidEdgeIndex {
        /// The loop index.
        loop_index: usize,
        /// The invalid edge index.
        edge: usize,
    },

    /// A polygon has fewer than three corners or repeats a corner vertex.
    #[error("polygon {polygon} is degenerate")]
    DegenerateFace {
        /// The polygon index.
        polygon: usize,
    },

    /// The polygon loop ranges do not cover the loop array.
    #[error("polygons reference {expected} loops but the mesh has {actual}")]
    LoopCountMismatch {
        /// Number of loops implied by the polygons (or required by the caller).
        expected: usize,
        /// Number of loops actually present.
        actual: usize,
    },

    /// The host has no active mesh to operate on.
    #[error("no active mesh")]
    NoActiveMesh,

    /// The requested query is not valid in the current interaction mode.
    #[error("operation requires {required:?} mode but the host is in {current:?} mode")]
    WrongMode {
        /// The mode the operation needs.
        required: Mode,
        /// The mode the host is in.
        current: Mode,
    },

    /// The host rejected a mode switch.
    #[error("failed to switch from {from:?} to {to:?} mode: {reason}")]
    ModeTransition {
        /// The mode before the switch.
        from: Mode,
        /// The requested mode.
        to: Mode,
        /// Why the host refused.
        reason: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_message() {
        let err = MeshError::invalid_param("smooth_angle", -1.0, "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid parameter: smooth_angle = -1 (must be non-negative)"
        );
    }

    #[test]
    fn test_wrong_mode_message() {
        let err = MeshError::WrongMode {
            required: Mode::Object,
            current: Mode::Edit,
        };
        assert_eq!(
            err.to_string(),
            "operation requires Object mode but the host is in Edit mode"
        );
    }
}
