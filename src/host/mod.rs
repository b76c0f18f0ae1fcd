//! Host adapter: interaction modes, the active mesh and the operators that
//! run against it.
//!
//! Modeling hosts only expose some data in some modes: topology and normals
//! are read in Object mode, selection is edited in Edit mode. [`Host`]
//! captures that contract, [`ModeGuard`] switches modes for the duration of
//! an operation and switches back on every exit path, and [`Document`] is
//! an in-memory host holding one [`PolyMesh`](crate::mesh::PolyMesh).

mod document;
pub mod ops;

pub use document::Document;
pub use ops::{
    adjust_trim_normals, reset_normals, restore_selection, save_selection, select_seams,
    select_sharp, AdjustReport, SAVED_SELECTION_ATTRIBUTE,
};

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::mesh::{EdgeFlags, MeshIndex, PolyMesh};

/// Interaction mode of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Whole-object mode: mesh data is readable and writable.
    #[default]
    Object,
    /// Mesh editing mode: selection is editable.
    Edit,
}

/// A modeling host with an interaction mode and an active mesh.
pub trait Host {
    /// The mesh type the host exposes.
    type Mesh;

    /// The current interaction mode.
    fn mode(&self) -> Mode;

    /// Switch to another mode.
    ///
    /// Fails with [`MeshError::ModeTransition`](crate::error::MeshError::ModeTransition)
    /// if the host refuses.
    fn set_mode(&mut self, mode: Mode) -> Result<()>;

    /// Mesh data access. Requires [`Mode::Object`].
    fn mesh(&self) -> Result<&Self::Mesh>;

    /// Mutable mesh data access. Requires [`Mode::Object`].
    fn mesh_mut(&mut self) -> Result<&mut Self::Mesh>;

    /// Mesh access for selection and normal editing. Requires [`Mode::Edit`].
    fn edit_mesh(&mut self) -> Result<&mut Self::Mesh>;
}

/// Switches a host into a mode and restores the previous mode on drop.
///
/// ```
/// use trim_normals::host::{Document, Host, Mode, ModeGuard};
/// use trim_normals::mesh::PolyMesh;
///
/// let mut doc: Document = Document::new(PolyMesh::new());
/// {
///     let guard = ModeGuard::enter(&mut doc, Mode::Edit).unwrap();
///     assert_eq!(guard.mode(), Mode::Edit);
/// }
/// assert_eq!(doc.mode(), Mode::Object);
/// ```
pub struct ModeGuard<'a, H: Host + ?Sized> {
    host: &'a mut H,
    previous: Mode,
}

impl<'a, H: Host + ?Sized> ModeGuard<'a, H> {
    /// Enter `mode`, remembering the current one.
    ///
    /// If the switch fails, the previous mode is put back before the error
    /// is returned.
    pub fn enter(host: &'a mut H, mode: Mode) -> Result<Self> {
        let previous = host.mode();
        if previous != mode {
            if let Err(e) = host.set_mode(mode) {
                restore(host, previous);
                return Err(e);
            }
        }
        Ok(Self { host, previous })
    }

    /// The mode that will be restored.
    #[inline]
    pub fn previous(&self) -> Mode {
        self.previous
    }
}

impl<H: Host + ?Sized> Deref for ModeGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: Host + ?Sized> DerefMut for ModeGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: Host + ?Sized> Drop for ModeGuard<'_, H> {
    fn drop(&mut self) {
        restore(self.host, self.previous);
    }
}

fn restore<H: Host + ?Sized>(host: &mut H, mode: Mode) {
    if host.mode() == mode {
        return;
    }
    if let Err(e) = host.set_mode(mode) {
        log::warn!("could not restore {:?} mode: {}", mode, e);
    }
}

/// Edge selection and named boolean edge attributes.
pub trait EdgeSelect {
    /// Select exactly the edges whose flags satisfy `predicate`. Returns
    /// the number of selected edges.
    fn select_by_flags(&mut self, predicate: &dyn Fn(EdgeFlags) -> bool) -> usize;

    /// Selection state of every edge, indexed by edge.
    fn selection(&self) -> Vec<bool>;

    /// Replace the selection, one value per edge.
    fn set_selection(&mut self, selection: &[bool]) -> Result<()>;

    /// A named boolean edge attribute.
    fn bool_attribute(&self, name: &str) -> Option<Vec<bool>>;

    /// Store a named boolean edge attribute, one value per edge.
    fn set_bool_attribute(&mut self, name: &str, values: Vec<bool>) -> Result<()>;
}

impl<I: MeshIndex> EdgeSelect for PolyMesh<I> {
    fn select_by_flags(&mut self, predicate: &dyn Fn(EdgeFlags) -> bool) -> usize {
        self.select_where(|_, edge| predicate(edge.flags));
        self.selected_edges().count()
    }

    fn selection(&self) -> Vec<bool> {
        self.edge_ids().map(|e| self.edge_flags(e).select).collect()
    }

    fn set_selection(&mut self, selection: &[bool]) -> Result<()> {
        if selection.len() != self.num_edges() {
            return Err(crate::error::MeshError::InvalidState(format!(
                "selection has {} values for {} edges",
                selection.len(),
                self.num_edges()
            )));
        }
        self.select_where(|e, _| selection[e.index()]);
        Ok(())
    }

    fn bool_attribute(&self, name: &str) -> Option<Vec<bool>> {
        self.edge_attribute(name).map(<[bool]>::to_vec)
    }

    fn set_bool_attribute(&mut self, name: &str, values: Vec<bool>) -> Result<()> {
        self.set_edge_attribute(name, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;

    /// A host that refuses to enter Edit mode, and optionally to leave it.
    struct Stubborn {
        mode: Mode,
        refuse_edit: bool,
        refuse_object: bool,
        switches: Vec<Mode>,
    }

    impl Stubborn {
        fn new(mode: Mode) -> Self {
            Self {
                mode,
                refuse_edit: false,
                refuse_object: false,
                switches: Vec::new(),
            }
        }
    }

    impl Host for Stubborn {
        type Mesh = ();

        fn mode(&self) -> Mode {
            self.mode
        }

        fn set_mode(&mut self, mode: Mode) -> Result<()> {
            let refused = match mode {
                Mode::Edit => self.refuse_edit,
                Mode::Object => self.refuse_object,
            };
            if refused {
                return Err(MeshError::ModeTransition {
                    from: self.mode,
                    to: mode,
                    reason: "refused".to_string(),
                });
            }
            self.switches.push(mode);
            self.mode = mode;
            Ok(())
        }

        fn mesh(&self) -> Result<&()> {
            Ok(&())
        }

        fn mesh_mut(&mut self) -> Result<&mut ()> {
            Err(MeshError::NoActiveMesh)
        }

        fn edit_mesh(&mut self) -> Result<&mut ()> {
            Err(MeshError::NoActiveMesh)
        }
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut host = Stubborn::new(Mode::Object);
        {
            let guard = ModeGuard::enter(&mut host, Mode::Edit).unwrap();
            assert_eq!(guard.mode(), Mode::Edit);
            assert_eq!(guard.previous(), Mode::Object);
        }
        assert_eq!(host.mode(), Mode::Object);
        assert_eq!(host.switches, vec![Mode::Edit, Mode::Object]);
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        fn failing(host: &mut Stubborn) -> Result<()> {
            let mut guard = ModeGuard::enter(host, Mode::Edit)?;
            guard.mesh_mut()?;
            Ok(())
        }

        let mut host = Stubborn::new(Mode::Object);
        assert!(matches!(failing(&mut host), Err(MeshError::NoActiveMesh)));
        assert_eq!(host.mode(), Mode::Object);
    }

    #[test]
    fn test_guard_same_mode_does_not_switch() {
        let mut host = Stubborn::new(Mode::Edit);
        drop(ModeGuard::enter(&mut host, Mode::Edit).unwrap());
        assert!(host.switches.is_empty());
    }

    #[test]
    fn test_refused_entry_reports_transition() {
        let mut host = Stubborn::new(Mode::Object);
        host.refuse_edit = true;
        let result = ModeGuard::enter(&mut host, Mode::Edit).map(|_| ());
        assert!(matches!(
            result,
            Err(MeshError::ModeTransition {
                from: Mode::Object,
                to: Mode::Edit,
                ..
            })
        ));
        assert_eq!(host.mode(), Mode::Object);
    }

    #[test]
    fn test_failed_restore_is_not_fatal() {
        let mut host = Stubborn::new(Mode::Object);
        {
            let mut guard = ModeGuard::enter(&mut host, Mode::Edit).unwrap();
            guard.refuse_object = true;
        }
        // Restoration was refused and only logged
        assert_eq!(host.mode(), Mode::Edit);
    }
}
