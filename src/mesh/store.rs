//! The indexed triangle mesh store.
//!
//! [`TriangleMesh`] owns the vertex array, the triangle array and the
//! adjacency derived from them. Everything else in the crate addresses
//! vertices by [`VertexId`], so growing or rewriting the arrays never leaves a
//! dangling reference behind.
//!
//! Roles and positions are only writable from inside the crate: roles change
//! through [`crate::algo::select`], positions through the deformation
//! write-back and [`crate::algo::normalize`].

use nalgebra::{Point3, Vector3};

use super::adjacency::Adjacency;
use super::index::{FaceId, VertexId};
use super::vertex::{Triangle, Vertex, VertexRole};
use crate::algo::normals::{compute_normals, NormalWeighting};

/// Number of vertices per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCounts {
    /// Free ROI vertices.
    pub interests: usize,
    /// Handle vertices.
    pub handle: usize,
    /// Anchor vertices.
    pub anchor: usize,
}

impl SelectionCounts {
    /// Total size of the region of interest.
    pub fn roi(&self) -> usize {
        self.interests + self.handle + self.anchor
    }
}

/// An indexed triangle mesh with cached adjacency and per-vertex normals.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) adjacency: Adjacency,
    pub(crate) normal_weighting: NormalWeighting,
}

impl TriangleMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the mesh has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// All vertices in id order.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All triangles in id order.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Get a triangle by ID.
    #[inline]
    pub fn triangle(&self, f: FaceId) -> &Triangle {
        &self.triangles[f.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertices[v.index()].position
    }

    /// Get the normal of a vertex.
    #[inline]
    pub fn normal(&self, v: VertexId) -> &Vector3<f64> {
        &self.vertices[v.index()].normal
    }

    /// Get the selection role of a vertex.
    #[inline]
    pub fn role(&self, v: VertexId) -> VertexRole {
        self.vertices[v.index()].role
    }

    /// The cached adjacency table.
    #[inline]
    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Vertices sharing an edge with `v`.
    #[inline]
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        self.adjacency.neighbors(v)
    }

    /// The weighting used whenever normals are recomputed.
    #[inline]
    pub fn normal_weighting(&self) -> NormalWeighting {
        self.normal_weighting
    }

    /// Copy of every vertex position, in id order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Raw `[a, b, c]` index triples, as written by the file savers.
    pub fn face_indices(&self) -> Vec<[usize; 3]> {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices();
                [a.index(), b.index(), c.index()]
            })
            .collect()
    }

    // ==================== Mutation (crate only) ====================

    #[inline]
    pub(crate) fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.vertices[v.index()].position = pos;
    }

    #[inline]
    pub(crate) fn set_role(&mut self, v: VertexId, role: VertexRole) {
        self.vertices[v.index()].role = role;
    }

    /// Change the normal weighting and recompute normals with it.
    pub fn set_normal_weighting(&mut self, weighting: NormalWeighting) {
        self.normal_weighting = weighting;
        self.recompute_normals();
    }

    /// Recompute per-vertex normals from the current geometry.
    pub fn recompute_normals(&mut self) {
        let weighting = self.normal_weighting;
        compute_normals(self, weighting);
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all triangle IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.triangles.len()).map(FaceId::new)
    }

    // ==================== Selection views ====================

    fn ids_with_role(&self, role: VertexRole) -> Vec<VertexId> {
        self.vertex_ids().filter(|&v| self.role(v) == role).collect()
    }

    /// Free vertices of the region of interest.
    pub fn interests(&self) -> Vec<VertexId> {
        self.ids_with_role(VertexRole::Interest)
    }

    /// Handle vertices.
    pub fn handle(&self) -> Vec<VertexId> {
        self.ids_with_role(VertexRole::Handle)
    }

    /// Anchor vertices.
    pub fn anchor(&self) -> Vec<VertexId> {
        self.ids_with_role(VertexRole::Anchor)
    }

    /// Every vertex with a role other than [`VertexRole::Unselected`].
    pub fn roi(&self) -> Vec<VertexId> {
        self.vertex_ids().filter(|&v| self.role(v).in_roi()).collect()
    }

    /// Count vertices per role.
    pub fn selection_counts(&self) -> SelectionCounts {
        let mut counts = SelectionCounts::default();
        for v in &self.vertices {
            match v.role {
                VertexRole::Interest => counts.interests += 1,
                VertexRole::Handle => counts.handle += 1,
                VertexRole::Anchor => counts.anchor += 1,
                VertexRole::Unselected => {}
            }
        }
        counts
    }

    // ==================== Geometry ====================

    /// Get the positions of the three corners of a triangle.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangle(f).vertices();
        [*self.position(a), *self.position(b), *self.position(c)]
    }

    /// Unnormalized face normal; its length is twice the face area.
    pub fn face_cross(&self, f: FaceId) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Compute the unit normal of a triangle (zero for degenerate faces).
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        self.face_cross(f)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a triangle.
    pub fn face_area(&self, f: FaceId) -> f64 {
        0.5 * self.face_cross(f).norm()
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Compute the axis-aligned bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let mut min = first;
        let mut max = first;

        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Centroid of a set of vertices, or `None` for an empty set.
    pub fn centroid(&self, ids: &[VertexId]) -> Option<Point3<f64>> {
        if ids.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = ids.iter().map(|&v| self.position(v).coords).sum();
        Some(Point3::from(sum / ids.len() as f64))
    }
}
