//! Mesh construction utilities.
//!
//! Loaders hand over a flat vertex list and triangle index triples; this
//! module validates them and derives the cached adjacency and normals.

use nalgebra::Point3;
use tracing::{debug, warn};

use super::adjacency::Adjacency;
use super::store::TriangleMesh;
use super::vertex::{Triangle, Vertex};
use crate::algo::normals::NormalWeighting;
use crate::error::{MeshError, Result};

/// Build a mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions; order defines vertex ids
/// * `faces` - List of triangle faces, each as `[v0, v1, v2]` indices
///
/// Degenerate triangles (repeated corners) are kept but logged; they add no
/// self-adjacency and contribute nothing to normals.
///
/// # Errors
///
/// - [`MeshError::EmptyMesh`] if `vertices` is empty
/// - [`MeshError::InvalidVertexIndex`] if a face index is out of range
///
/// # Example
/// ```
/// use deformesh::mesh::{build_from_triangles, TriangleMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: TriangleMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<TriangleMesh> {
    build_with_weighting(vertices, faces, NormalWeighting::default())
}

/// Same as [`build_from_triangles`], choosing how normals are averaged.
pub fn build_with_weighting(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    weighting: NormalWeighting,
) -> Result<TriangleMesh> {
    if vertices.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validate before converting so the error reports the raw index.
    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
    }

    let triangles: Vec<Triangle> = faces
        .iter()
        .map(|&[a, b, c]| Triangle::new(a, b, c))
        .collect();

    let degenerate = triangles.iter().filter(|t| t.is_degenerate()).count();
    if degenerate > 0 {
        warn!(degenerate, "mesh contains degenerate triangles");
    }
    if triangles.is_empty() {
        warn!(vertices = vertices.len(), "mesh has no triangles");
    }

    let adjacency = Adjacency::build(vertices.len(), &triangles)?;

    let mut mesh = TriangleMesh {
        vertices: vertices.iter().map(|&p| Vertex::new(p)).collect(),
        triangles,
        adjacency,
        normal_weighting: weighting,
    };
    mesh.recompute_normals();

    debug!(
        vertices = mesh.num_vertices(),
        faces = mesh.num_faces(),
        "built triangle mesh"
    );

    Ok(mesh)
}

/// Extract vertex positions and face index triples from a mesh.
pub fn to_face_vertex(mesh: &TriangleMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    (mesh.positions(), mesh.face_indices())
}
