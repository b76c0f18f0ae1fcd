//! Wavefront OBJ export.
//!
//! OBJ has no place for edge flags, so it is an output-only format here: it
//! carries the shading result. Every loop gets its own `vn` line holding the
//! effective loop normal, and polygons are written as `f v//vn` without
//! triangulation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::mesh::{MeshIndex, PolyMesh};

/// Save a mesh with its loop normals to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use trim_normals::io::obj;
/// use trim_normals::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in OBJ format to any writer.
pub fn write_obj<W: Write, I: MeshIndex>(mesh: &PolyMesh<I>, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Generated by trim-normals")?;

    for v in mesh.vertex_ids() {
        let p = mesh.position(v);
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    for l in mesh.loop_ids() {
        let n = mesh.loop_normal(l);
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    // OBJ indices are 1-based; normal indices are loop indices
    for p in mesh.polygon_ids() {
        write!(writer, "f")?;
        for l in mesh.polygon_loops(p) {
            write!(writer, " {}//{}", mesh.loop_(l).vertex.index() + 1, l.index() + 1)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
