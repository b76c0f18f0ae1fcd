//! An in-memory host with a single active mesh.

use super::{Host, Mode};
use crate::error::{MeshError, Result};
use crate::mesh::{MeshIndex, PolyMesh};

/// A document holding at most one active mesh.
///
/// Starts in Object mode. Entering Edit mode requires an active mesh.
#[derive(Debug, Clone)]
pub struct Document<I: MeshIndex = u32> {
    mesh: Option<PolyMesh<I>>,
    mode: Mode,
}

impl<I: MeshIndex> Default for Document<I> {
    fn default() -> Self {
        Self {
            mesh: None,
            mode: Mode::Object,
        }
    }
}

impl<I: MeshIndex> Document<I> {
    /// Create a document with `mesh` as the active mesh.
    pub fn new(mesh: PolyMesh<I>) -> Self {
        Self {
            mesh: Some(mesh),
            mode: Mode::Object,
        }
    }

    /// Create a document without an active mesh.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether there is an active mesh.
    #[inline]
    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    /// Replace the active mesh, returning the previous one.
    pub fn set_mesh(&mut self, mesh: PolyMesh<I>) -> Option<PolyMesh<I>> {
        self.mesh.replace(mesh)
    }

    /// Remove the active mesh. The document drops back to Object mode.
    pub fn take_mesh(&mut self) -> Option<PolyMesh<I>> {
        self.mode = Mode::Object;
        self.mesh.take()
    }

    /// Consume the document, returning its mesh.
    pub fn into_mesh(self) -> Result<PolyMesh<I>> {
        self.mesh.ok_or(MeshError::NoActiveMesh)
    }

    fn require(&self, required: Mode) -> Result<()> {
        if self.mesh.is_none() {
            return Err(MeshError::NoActiveMesh);
        }
        if self.mode != required {
            return Err(MeshError::WrongMode {
                required,
                current: self.mode,
            });
        }
        Ok(())
    }
}

impl<I: MeshIndex> Host for Document<I> {
    type Mesh = PolyMesh<I>;

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == Mode::Edit && self.mesh.is_none() {
            return Err(MeshError::ModeTransition {
                from: self.mode,
                to: mode,
                reason: "no active mesh".to_string(),
            });
        }
        if self.mode != mode {
            log::trace!("mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
        Ok(())
    }

    fn mesh(&self) -> Result<&PolyMesh<I>> {
        self.require(Mode::Object)?;
        self.mesh.as_ref().ok_or(MeshError::NoActiveMesh)
    }

    fn mesh_mut(&mut self) -> Result<&mut PolyMesh<I>> {
        self.require(Mode::Object)?;
        self.mesh.as_mut().ok_or(MeshError::NoActiveMesh)
    }

    fn edit_mesh(&mut self) -> Result<&mut PolyMesh<I>> {
        self.require(Mode::Edit)?;
        self.mesh.as_mut().ok_or(MeshError::NoActiveMesh)
    }
}
