//! Vertex and triangle records stored by the mesh.

use nalgebra::{Point3, Vector3};

use super::index::VertexId;

/// The selection role of a vertex.
///
/// A vertex carries exactly one role at a time, so a vertex can never be
/// both a handle and an anchor. The region of interest (ROI) is every vertex
/// whose role is not [`VertexRole::Unselected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexRole {
    /// Not part of the region of interest.
    #[default]
    Unselected,
    /// Inside the region of interest and free to move during a solve.
    Interest,
    /// Driven by the user transform during a solve.
    Handle,
    /// Fixed boundary constraint; keeps its position during a solve.
    Anchor,
}

impl VertexRole {
    /// Whether this vertex belongs to the region of interest.
    #[inline]
    pub fn in_roi(self) -> bool {
        self != VertexRole::Unselected
    }

    /// Whether the solver treats this vertex as a known value.
    #[inline]
    pub fn is_constrained(self) -> bool {
        matches!(self, VertexRole::Handle | VertexRole::Anchor)
    }

    /// Lowercase name used by the selection file format and the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            VertexRole::Unselected => "unselected",
            VertexRole::Interest => "interest",
            VertexRole::Handle => "handle",
            VertexRole::Anchor => "anchor",
        }
    }

    /// Parse a role name as written by [`VertexRole::as_str`].
    pub fn parse(name: &str) -> Option<VertexRole> {
        match name {
            "unselected" => Some(VertexRole::Unselected),
            "interest" => Some(VertexRole::Interest),
            "handle" => Some(VertexRole::Handle),
            "anchor" => Some(VertexRole::Anchor),
            _ => None,
        }
    }
}

/// A vertex of the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Unit normal, or zero if the vertex has no incident triangle.
    pub normal: Vector3<f64>,

    /// Current selection role.
    pub role: VertexRole,
}

impl Vertex {
    /// Create an unselected vertex with a zero normal.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            role: VertexRole::Unselected,
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }
}

/// A triangle as three indices into the vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triangle(pub [VertexId; 3]);

impl Triangle {
    /// Create a triangle from raw indices.
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Triangle([VertexId::new(a), VertexId::new(b), VertexId::new(c)])
    }

    /// The three corners.
    #[inline]
    pub fn vertices(&self) -> [VertexId; 3] {
        self.0
    }

    /// The three edges `(a,b)`, `(b,c)`, `(c,a)`.
    #[inline]
    pub fn edges(&self) -> [(VertexId, VertexId); 3] {
        let [a, b, c] = self.0;
        [(a, b), (b, c), (c, a)]
    }

    /// Whether two corners share an index.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.0;
        a == b || b == c || a == c
    }
}
