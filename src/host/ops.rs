//! Operators run against a [`Host`].
//!
//! Each operator enters the mode it needs through a [`ModeGuard`]. The
//! selection operators leave the host in Edit mode so the new selection can
//! be inspected; the others restore the mode the host was in.

use super::{EdgeSelect, Host, Mode, ModeGuard};
use crate::algo::adjust::{apply_adjustment_with_progress, working_seam_set, AdjustOptions};
use crate::algo::Progress;
use crate::error::Result;
use crate::mesh::{EdgeFlags, MeshIndex, MeshSink, MeshSource};

/// Edge attribute holding the saved trim selection.
pub const SAVED_SELECTION_ATTRIBUTE: &str = "trimsheet_edge";

/// Summary of an adjustment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustReport {
    /// Edges in the working seam set.
    pub seam_edges: usize,
    /// Loops given a custom normal.
    pub affected_loops: usize,
    /// All loops of the mesh.
    pub total_loops: usize,
}

/// Select exactly the seam edges. Leaves the host in Edit mode.
pub fn select_seams<H>(host: &mut H) -> Result<usize>
where
    H: Host + ?Sized,
    H::Mesh: EdgeSelect,
{
    select_by(host, "seam", &|flags: EdgeFlags| flags.seam)
}

/// Select exactly the sharp edges. Leaves the host in Edit mode.
pub fn select_sharp<H>(host: &mut H) -> Result<usize>
where
    H: Host + ?Sized,
    H::Mesh: EdgeSelect,
{
    select_by(host, "sharp", &|flags: EdgeFlags| flags.sharp)
}

fn select_by<H>(
    host: &mut H,
    what: &str,
    predicate: &dyn Fn(EdgeFlags) -> bool,
) -> Result<usize>
where
    H: Host + ?Sized,
    H::Mesh: EdgeSelect,
{
    host.set_mode(Mode::Edit)?;
    let count = host.edit_mesh()?.select_by_flags(predicate);
    log::info!("selected {} {} edges", count, what);
    Ok(count)
}

/// Store the current edge selection in [`SAVED_SELECTION_ATTRIBUTE`].
///
/// Returns the number of saved edges.
pub fn save_selection<H>(host: &mut H) -> Result<usize>
where
    H: Host + ?Sized,
    H::Mesh: EdgeSelect,
{
    let mut guard = ModeGuard::enter(host, Mode::Object)?;
    let mesh = guard.mesh_mut()?;

    let selection = mesh.selection();
    let count = selection.iter().filter(|&&s| s).count();
    mesh.set_bool_attribute(SAVED_SELECTION_ATTRIBUTE, selection)?;

    log::info!("saved {} selected edges", count);
    Ok(count)
}

/// Replace the selection with the saved one. Leaves the host in Edit mode.
///
/// A mesh without a saved selection gets an empty one, so every edge ends
/// up deselected.
pub fn restore_selection<H>(host: &mut H) -> Result<usize>
where
    H: Host + ?Sized,
    H::Mesh: EdgeSelect,
{
    let saved = {
        let mut guard = ModeGuard::enter(host, Mode::Object)?;
        let mesh = guard.mesh_mut()?;
        match mesh.bool_attribute(SAVED_SELECTION_ATTRIBUTE) {
            Some(saved) => saved,
            None => {
                let empty = vec![false; mesh.selection().len()];
                mesh.set_bool_attribute(SAVED_SELECTION_ATTRIBUTE, empty.clone())?;
                empty
            }
        }
    };

    host.set_mode(Mode::Edit)?;
    host.edit_mesh()?.set_selection(&saved)?;

    let count = saved.iter().filter(|&&s| s).count();
    log::info!("restored {} saved edges", count);
    Ok(count)
}

/// Drop all custom normals so that the mesh shades with its defaults.
pub fn reset_normals<I, H>(host: &mut H) -> Result<()>
where
    I: MeshIndex,
    H: Host + ?Sized,
    H::Mesh: MeshSink<I>,
{
    let mut guard = ModeGuard::enter(host, Mode::Edit)?;
    guard.edit_mesh()?.clear_custom_normals();
    log::info!("custom normals cleared");
    Ok(())
}

/// Adjust trim normals on the active mesh.
///
/// Runs in Object mode and restores the previous mode afterwards, also when
/// the adjustment fails.
pub fn adjust_trim_normals<I, H>(
    host: &mut H,
    options: &AdjustOptions,
    progress: &Progress,
) -> Result<AdjustReport>
where
    I: MeshIndex,
    H: Host + ?Sized,
    H::Mesh: MeshSource<I> + MeshSink<I> + Sync,
{
    log::info!("adjusting trim normals");
    let mut guard = ModeGuard::enter(host, Mode::Object)?;
    let mesh = guard.mesh_mut()?;

    let seam_edges = working_seam_set(&*mesh, options.seam_source).len();
    let normals = apply_adjustment_with_progress(mesh, options, progress)?;

    let report = AdjustReport {
        seam_edges,
        affected_loops: normals.affected_count(),
        total_loops: normals.len(),
    };
    log::info!(
        "adjusted {} of {} loops around {} seam edges",
        report.affected_loops,
        report.total_loops,
        report.seam_edges
    );
    Ok(report)
}
