//! Wavefront OBJ support.
//!
//! Loading goes through `tobj` with triangulation on. Positions and faces
//! are kept; normals, texture coordinates and materials are ignored. All
//! objects and groups in the file are merged into one mesh.
//!
//! Vertex ids follow the order `tobj` reports: within each object, vertices
//! are numbered by their first use in a face, and vertices no face uses are
//! dropped. Loading the same file twice always gives the same ids, so a
//! selection saved against a loaded OBJ stays valid for that file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, TriangleMesh};

/// Load a mesh from an OBJ file.
///
/// # Errors
///
/// [`MeshError::LoadError`] if `tobj` cannot parse the file or a position is
/// not finite; [`MeshError::EmptyMesh`] if the file has no usable vertices.
///
/// # Example
///
/// ```no_run
/// use deformesh::io::obj;
/// use deformesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::load(path, e.to_string()))?;

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    // Indices are per model; shift them past the vertices merged so far.
    for model in &models {
        let obj_mesh = &model.mesh;
        let offset = vertices.len();

        for chunk in obj_mesh.positions.chunks_exact(3) {
            let p = Point3::new(f64::from(chunk[0]), f64::from(chunk[1]), f64::from(chunk[2]));
            if !p.coords.iter().all(|c| c.is_finite()) {
                return Err(MeshError::load(
                    path,
                    format!(
                        "object {:?}: vertex {} has a non-finite coordinate",
                        model.name,
                        vertices.len() - offset
                    ),
                ));
            }
            vertices.push(p);
        }

        for tri in obj_mesh.indices.chunks_exact(3) {
            faces.push([
                offset + tri[0] as usize,
                offset + tri[1] as usize,
                offset + tri[2] as usize,
            ]);
        }

        debug!(
            object = %model.name,
            vertices = vertices.len() - offset,
            "loaded OBJ object"
        );
    }

    debug!(
        path = %path.display(),
        objects = models.len(),
        vertices = vertices.len(),
        triangles = faces.len(),
        "parsed OBJ"
    );
    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to an OBJ file.
///
/// # Errors
///
/// [`MeshError::SaveError`] if the file cannot be created or written.
///
/// # Example
///
/// ```no_run
/// use deformesh::io::obj;
/// use deformesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = deformesh::io::load("in.off").unwrap();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    write_obj(mesh, path).map_err(|e| MeshError::save(path, e.to_string()))
}

fn write_obj(mesh: &TriangleMesh, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# deformesh")?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for [a, b, c] in &faces {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;
    use tempfile::tempdir;

    fn load_str(text: &str) -> Result<TriangleMesh> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.obj");
        std::fs::write(&path, text).unwrap();
        load(&path)
    }

    #[test]
    fn test_quad_with_normals_is_triangulated() {
        let text = "\
# square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1
";
        let mesh = load_str(text).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let mesh = load_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n").unwrap();
        assert_eq!(mesh.face_indices(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_objects_are_merged() {
        let text = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let mesh = load_str(text).unwrap();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face_positions(FaceId::new(1))[0], Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_malformed_face_is_load_error() {
        let result = load_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 x 3\n");
        assert!(matches!(result, Err(MeshError::LoadError { .. })));
    }

    #[test]
    fn test_non_finite_coordinate_is_load_error() {
        let result = load_str("v 0 0 0\nv nan 0 0\nv 0 1 0\nf 1 2 3\n");
        assert!(matches!(result, Err(MeshError::LoadError { .. })));

        let result = load_str("v 0 0 0\nv 1 0 0\nv 0 inf 0\nf 1 2 3\n");
        assert!(matches!(result, Err(MeshError::LoadError { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        let vertices = vec![
            Point3::new(0.25, 0.0, -1.5),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 1e-7),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();

        save(&mesh, &path).unwrap();
        let copy = load(&path).unwrap();

        assert_eq!(copy.positions(), vertices);
        assert_eq!(copy.face_indices(), vec![[0, 1, 2]]);
    }

    #[test]
    fn test_save_into_missing_directory_is_save_error() {
        let dir = tempdir().unwrap();
        let mesh = build_from_triangles(&[Point3::origin()], &[]).unwrap();
        let result = save(&mesh, dir.path().join("missing").join("out.obj"));
        assert!(matches!(result, Err(MeshError::SaveError { .. })));
    }
}
