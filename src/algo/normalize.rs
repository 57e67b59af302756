//! Recentering and rescaling into a canonical bounding volume.
//!
//! [`center_and_scale_to_unit`] moves the bounding box center to the origin
//! and scales uniformly so the largest box extent is 1. Uniform positive
//! scaling does not change normal directions, so normals are left alone.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::mesh::TriangleMesh;

/// The similarity applied by [`center_and_scale_to_unit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Bounding box center before normalization.
    pub center: Point3<f64>,
    /// Uniform scale factor applied after centering.
    pub scale: f64,
}

impl Normalization {
    /// The unit-box frame of `mesh`, computed from its bounding box without
    /// moving any vertex.
    ///
    /// `None` when the mesh has fewer than two vertices.
    pub fn for_mesh(mesh: &TriangleMesh) -> Option<Normalization> {
        if mesh.num_vertices() < 2 {
            return None;
        }

        let (min, max) = mesh.bounding_box()?;
        let center = Point3::from((min.coords + max.coords) * 0.5);
        let extent = (max - min).max();
        let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
        Some(Normalization { center, scale })
    }

    /// Map a point from the original frame into the normalized frame.
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from((p - self.center) * self.scale)
    }

    /// Map a point from the normalized frame back to the original frame.
    pub fn invert(&self, p: &Point3<f64>) -> Point3<f64> {
        self.center + p.coords / self.scale
    }

    /// Map a displacement (no translation part) into the normalized frame.
    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v * self.scale
    }
}

/// Center the mesh at the origin and scale its largest extent to 1.
///
/// Returns `None` without touching the mesh when it has fewer than two
/// vertices. If every vertex sits at the same point, the mesh is only
/// translated and the returned scale is 1.
pub fn center_and_scale_to_unit(mesh: &mut TriangleMesh) -> Option<Normalization> {
    let normalization = Normalization::for_mesh(mesh)?;
    for vertex in &mut mesh.vertices {
        vertex.position = normalization.apply(&vertex.position);
    }

    debug!(
        center = ?normalization.center,
        scale = normalization.scale,
        "normalized mesh to unit box"
    );
    Some(normalization)
}
