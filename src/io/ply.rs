//! PLY (Stanford polygon) format support.
//!
//! Besides the usual `vertex` and `face` elements, two optional elements
//! carry the data normal adjustment needs:
//!
//! - `edge` with `vertex1`, `vertex2` and uchar flag properties. `seam`,
//!   `sharp` and `select` map to the edge flags; any other uchar property is
//!   loaded as a named boolean edge attribute.
//! - `loop_normal` with `nx`, `ny`, `nz`, one entry per loop in polygon
//!   order. Zero vectors mean "no custom normal".

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, EdgeId, MeshIndex, PolyMesh, VertexId};

const FLAG_PROPERTIES: [&str; 5] = ["vertex1", "vertex2", "seam", "sharp", "select"];

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use trim_normals::io::ply;
/// use trim_normals::mesh::PolyMesh;
///
/// let mesh: PolyMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let load_error = |message: String| MeshError::LoadError {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(e.to_string()))?;

    // Vertices
    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element".to_string()))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| load_error(format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    // Polygons, kept as they are
    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element".to_string()))?;

    let mut polygons: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property".to_string()))?;
        polygons.push(indices);
    }

    if polygons.is_empty() {
        return Err(load_error("PLY file contains no faces".to_string()));
    }

    let mut mesh: PolyMesh<I> = build_from_polygons(&vertices, &polygons)?;

    if let Some(edge_element) = ply.payload.get("edge") {
        load_edges(&mut mesh, edge_element).map_err(load_error)?;
    }

    if let Some(normal_element) = ply.payload.get("loop_normal") {
        if normal_element.len() != mesh.num_loops() {
            return Err(MeshError::LoopCountMismatch {
                expected: mesh.num_loops(),
                actual: normal_element.len(),
            });
        }
        let mut normals = Vec::with_capacity(normal_element.len());
        for entry in normal_element {
            let component = |name: &str| {
                get_float_property(entry, name)
                    .ok_or_else(|| load_error(format!("loop_normal missing {}", name)))
            };
            normals.push(Vector3::new(component("nx")?, component("ny")?, component("nz")?));
        }
        mesh.set_custom_normals(&normals)?;
    }

    log::debug!(
        "loaded {}: {} vertices, {} polygons, {} loops",
        path.display(),
        mesh.num_vertices(),
        mesh.num_polygons(),
        mesh.num_loops()
    );
    Ok(mesh)
}

/// Apply an `edge` element's flags and attributes to the mesh edges.
fn load_edges<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    element: &[DefaultElement],
) -> std::result::Result<(), String> {
    let lookup: HashMap<(usize, usize), EdgeId<I>> = mesh
        .edge_ids()
        .map(|e| {
            let [a, b] = mesh.edge(e).vertices;
            (ordered(a.index(), b.index()), e)
        })
        .collect();

    let mut attributes: HashMap<String, Vec<bool>> = HashMap::new();
    for entry in element {
        let endpoint = |name: &str| {
            get_float_property(entry, name)
                .map(|v| v as usize)
                .ok_or_else(|| format!("edge missing {}", name))
        };
        let (a, b) = (endpoint("vertex1")?, endpoint("vertex2")?);
        let e = *lookup
            .get(&ordered(a, b))
            .ok_or_else(|| format!("edge ({}, {}) is not an edge of any face", a, b))?;

        let flags = &mut mesh.edges[e.index()].flags;
        flags.seam = get_bool_property(entry, "seam").unwrap_or(false);
        flags.sharp = get_bool_property(entry, "sharp").unwrap_or(false);
        flags.select = get_bool_property(entry, "select").unwrap_or(false);

        for (name, value) in entry.iter() {
            if FLAG_PROPERTIES.contains(&name.as_str()) {
                continue;
            }
            if let Property::UChar(v) = value {
                let values = attributes
                    .entry(name.clone())
                    .or_insert_with(|| vec![false; lookup.len()]);
                values[e.index()] = *v != 0;
            }
        }
    }

    for (name, values) in attributes {
        mesh.set_edge_attribute(&name, values)
            .map_err(|err| err.to_string())?;
    }

    // Sharp flags changed behind set_sharp's back
    mesh.update_normals();
    Ok(())
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn get_bool_property(element: &DefaultElement, name: &str) -> Option<bool> {
    get_float_property(element, name).map(|v| v != 0.0)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
///
/// Edge flags and boolean edge attributes are always written; custom
/// normals only when the mesh has any.
///
/// # Example
///
/// ```no_run
/// use trim_normals::io::ply;
/// use trim_normals::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, polygons) = to_face_vertex(mesh);
    let attributes: Vec<(&str, &[bool])> = mesh
        .edge_attribute_names()
        .filter(|name| {
            let reserved = FLAG_PROPERTIES.contains(name);
            if reserved {
                log::warn!("edge attribute '{}' clashes with an edge flag, not saved", name);
            }
            !reserved
        })
        .filter_map(|name| mesh.edge_attribute(name).map(|values| (name, values)))
        .collect();

    // Header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by trim-normals")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", polygons.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "element edge {}", mesh.num_edges())?;
    writeln!(writer, "property int vertex1")?;
    writeln!(writer, "property int vertex2")?;
    writeln!(writer, "property uchar seam")?;
    writeln!(writer, "property uchar sharp")?;
    writeln!(writer, "property uchar select")?;
    for (name, _) in &attributes {
        writeln!(writer, "property uchar {}", name)?;
    }
    if mesh.has_custom_normals() {
        writeln!(writer, "element loop_normal {}", mesh.num_loops())?;
        writeln!(writer, "property double nx")?;
        writeln!(writer, "property double ny")?;
        writeln!(writer, "property double nz")?;
    }
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for polygon in &polygons {
        if polygon.len() > u8::MAX as usize {
            return Err(MeshError::SaveError {
                path: path.to_path_buf(),
                message: format!("polygon with {} corners exceeds the PLY list limit", polygon.len()),
            });
        }
        write!(writer, "{}", polygon.len())?;
        for index in polygon {
            write!(writer, " {}", index)?;
        }
        writeln!(writer)?;
    }

    for e in mesh.edge_ids() {
        let edge = mesh.edge(e);
        let [a, b]: [VertexId<I>; 2] = edge.vertices;
        write!(
            writer,
            "{} {} {} {} {}",
            a.index(),
            b.index(),
            edge.flags.seam as u8,
            edge.flags.sharp as u8,
            edge.flags.select as u8
        )?;
        for (_, values) in &attributes {
            write!(writer, " {}", values[e.index()] as u8)?;
        }
        writeln!(writer)?;
    }

    if mesh.has_custom_normals() {
        for l in mesh.loop_ids() {
            let n = mesh.custom_normal(l).unwrap_or_else(Vector3::zeros);
            writeln!(writer, "{} {} {}", n.x, n.y, n.z)?;
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::LoopId;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("trim_normals_{}_{}.ply", name, std::process::id()))
    }

    fn quad_pair() -> PolyMesh {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.5, 0.0, -0.5),
            Point3::new(1.5, 1.0, -0.5),
        ];
        build_from_polygons(&positions, &[[0, 1, 2, 3], [1, 4, 5, 2]]).unwrap()
    }

    #[test]
    fn test_edges_attributes_and_normals_survive() {
        let mut mesh = quad_pair();
        let middle = mesh.find_edge(VertexId::new(1), VertexId::new(2)).unwrap();
        let left = mesh.find_edge(VertexId::new(0), VertexId::new(3)).unwrap();
        mesh.set_seam(middle, true);
        mesh.set_selected(middle, true);
        mesh.set_sharp(left, true);

        let mut saved = vec![false; mesh.num_edges()];
        saved[middle.index()] = true;
        mesh.set_edge_attribute("trimsheet_edge", saved.clone()).unwrap();

        let mut normals = vec![Vector3::zeros(); mesh.num_loops()];
        normals[1] = Vector3::new(1.0, 0.0, 1.0).normalize();
        mesh.set_custom_normals(&normals).unwrap();

        let path = temp_path("roundtrip");
        save(&mesh, &path).unwrap();
        let loaded: PolyMesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.num_polygons(), 2);
        assert_eq!(loaded.num_loops(), 8);
        assert!(loaded.is_quad_mesh());

        let middle = loaded.find_edge(VertexId::new(1), VertexId::new(2)).unwrap();
        let left = loaded.find_edge(VertexId::new(0), VertexId::new(3)).unwrap();
        assert!(loaded.edge_flags(middle).seam && loaded.edge_flags(middle).select);
        assert!(!loaded.edge_flags(middle).sharp);
        assert!(loaded.edge_flags(left).sharp);
        assert_eq!(loaded.edge_attribute("trimsheet_edge"), Some(saved.as_slice()));

        assert_eq!(loaded.custom_normal(LoopId::new(0)), None);
        let custom = loaded.custom_normal(LoopId::new(1)).unwrap();
        assert!((custom - normals[1]).norm() < 1e-12);
    }

    #[test]
    fn test_plain_file_without_edges() {
        let path = temp_path("plain");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n",
        )
        .unwrap();
        let mesh: PolyMesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.num_edges(), 4);
        assert_eq!(mesh.selected_edges().count(), 0);
        assert!(!mesh.has_custom_normals());
    }

    #[test]
    fn test_unknown_edge_rejected() {
        let path = temp_path("unknown_edge");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             element edge 1\nproperty int vertex1\nproperty int vertex2\nproperty uchar seam\n\
             end_header\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n0 7 1\n",
        )
        .unwrap();
        let result: Result<PolyMesh> = load(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(MeshError::LoadError { .. })));
    }
}
