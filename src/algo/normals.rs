//! Smooth per-vertex normals.
//!
//! A vertex normal is the weighted sum of the unit normals of its incident
//! triangles, normalized to unit length. Each vertex is summed over its own
//! incident face list in a fixed order, so recomputing on unchanged geometry
//! gives bitwise-identical results regardless of thread scheduling.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::mesh::{FaceId, TriangleMesh, VertexId};

/// How incident face normals are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalWeighting {
    /// Every incident triangle counts the same.
    Uniform,
    /// Weight by triangle area.
    #[default]
    Area,
    /// Weight by the triangle's corner angle at the vertex.
    Angle,
}

/// Compute per-vertex normals without touching the mesh.
///
/// A vertex with no incident triangle, or whose weighted sum cancels out,
/// gets `None`.
pub fn vertex_normals(mesh: &TriangleMesh, weighting: NormalWeighting) -> Vec<Option<Vector3<f64>>> {
    (0..mesh.num_vertices())
        .into_par_iter()
        .map(|i| {
            let v = VertexId::new(i);
            let mut sum = Vector3::zeros();
            for &f in mesh.adjacency().incident_faces(v) {
                sum += weighted_face_normal(mesh, f, v, weighting);
            }
            sum.try_normalize(1e-12)
        })
        .collect()
}

/// Recompute every vertex normal in place.
///
/// Vertices for which no normal can be derived keep their previous value.
pub fn compute_normals(mesh: &mut TriangleMesh, weighting: NormalWeighting) {
    let normals = vertex_normals(mesh, weighting);
    for (vertex, normal) in mesh.vertices.iter_mut().zip(normals) {
        if let Some(n) = normal {
            vertex.normal = n;
        }
    }
}

fn weighted_face_normal(
    mesh: &TriangleMesh,
    f: FaceId,
    v: VertexId,
    weighting: NormalWeighting,
) -> Vector3<f64> {
    let cross = mesh.face_cross(f);
    let unit = match cross.try_normalize(1e-300) {
        Some(n) => n,
        None => return Vector3::zeros(),
    };

    match weighting {
        NormalWeighting::Uniform => unit,
        // |cross| is twice the area; the constant factor cancels on normalize.
        NormalWeighting::Area => cross,
        NormalWeighting::Angle => unit * corner_angle(mesh, f, v),
    }
}

/// Interior angle of triangle `f` at corner `v`.
fn corner_angle(mesh: &TriangleMesh, f: FaceId, v: VertexId) -> f64 {
    let corners = mesh.triangle(f).vertices();
    let Some(k) = corners.iter().position(|&c| c == v) else {
        return 0.0;
    };
    let p = mesh.position(corners[k]);
    let a = mesh.position(corners[(k + 1) % 3]) - p;
    let b = mesh.position(corners[(k + 2) % 3]) - p;
    a.angle(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn create_tetrahedron() -> TriangleMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_normals_are_unit_length() {
        let mesh = create_tetrahedron();
        for weighting in [NormalWeighting::Uniform, NormalWeighting::Area, NormalWeighting::Angle] {
            for n in vertex_normals(&mesh, weighting) {
                let n = n.expect("every tetrahedron vertex has faces");
                assert!((n.norm() - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_apex_normal_points_outward() {
        let mesh = create_tetrahedron();
        let apex = mesh.normal(VertexId::new(3));
        assert!(apex.z > 0.0, "apex normal should point up: {:?}", apex);
    }

    #[test]
    fn test_recompute_is_bitwise_idempotent() {
        let mut mesh = create_tetrahedron();
        compute_normals(&mut mesh, NormalWeighting::Angle);
        let first: Vec<_> = mesh.vertex_ids().map(|v| *mesh.normal(v)).collect();
        compute_normals(&mut mesh, NormalWeighting::Angle);
        let second: Vec<_> = mesh.vertex_ids().map(|v| *mesh.normal(v)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_isolated_vertex_keeps_previous_normal() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let mut mesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
        compute_normals(&mut mesh, NormalWeighting::Area);

        assert_eq!(*mesh.normal(VertexId::new(3)), Vector3::zeros());
        assert!(vertex_normals(&mesh, NormalWeighting::Area)[3].is_none());
    }

    #[test]
    fn test_flat_patch_normals_agree() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        for v in mesh.vertex_ids() {
            assert!((mesh.normal(v) - Vector3::z()).norm() < 1e-12);
        }
    }
}
