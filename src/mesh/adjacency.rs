//! Per-vertex neighbor tables derived from the triangle list.
//!
//! Every triangle `(a, b, c)` contributes the unordered pairs `(a, b)`,
//! `(b, c)` and `(c, a)`. An edge shared by two triangles is recorded once,
//! so neighbor lists never hold duplicates and are symmetric by construction.
//! Neighbors are kept in insertion order, which makes rebuilding from the
//! same triangles produce identical tables.

use tracing::debug;

use super::index::{FaceId, VertexId};
use super::vertex::Triangle;
use crate::error::{MeshError, Result};

/// Vertex-to-vertex and vertex-to-face adjacency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    neighbors: Vec<Vec<VertexId>>,
    faces: Vec<Vec<FaceId>>,
}

impl Adjacency {
    /// Build adjacency for `num_vertices` vertices from a triangle list.
    ///
    /// Degenerate triangles contribute only their distinct pairs; a vertex is
    /// never its own neighbor.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidVertexIndex`] if any triangle references a
    /// vertex outside `0..num_vertices`.
    pub fn build(num_vertices: usize, triangles: &[Triangle]) -> Result<Self> {
        let mut neighbors: Vec<Vec<VertexId>> = vec![Vec::new(); num_vertices];
        let mut faces: Vec<Vec<FaceId>> = vec![Vec::new(); num_vertices];

        for (fi, tri) in triangles.iter().enumerate() {
            for v in tri.vertices() {
                if v.index() >= num_vertices {
                    return Err(MeshError::InvalidVertexIndex {
                        face: fi,
                        vertex: v.index(),
                    });
                }
            }

            let face = FaceId::new(fi);
            for v in tri.vertices() {
                let incident = &mut faces[v.index()];
                if !incident.contains(&face) {
                    incident.push(face);
                }
            }

            for (a, b) in tri.edges() {
                if a == b {
                    continue;
                }
                insert_unique(&mut neighbors[a.index()], b);
                insert_unique(&mut neighbors[b.index()], a);
            }
        }

        let adjacency = Self { neighbors, faces };
        debug!(
            vertices = num_vertices,
            triangles = triangles.len(),
            edges = adjacency.num_edges(),
            "built adjacency"
        );
        Ok(adjacency)
    }

    /// Number of vertices covered by the table.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.neighbors.len()
    }

    /// Vertices sharing an edge with `v`.
    #[inline]
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        &self.neighbors[v.index()]
    }

    /// Triangles that have `v` as a corner.
    #[inline]
    pub fn incident_faces(&self, v: VertexId) -> &[FaceId] {
        &self.faces[v.index()]
    }

    /// Number of neighbors of `v`.
    #[inline]
    pub fn degree(&self, v: VertexId) -> usize {
        self.neighbors[v.index()].len()
    }

    /// Whether `a` and `b` share an edge.
    pub fn contains(&self, a: VertexId, b: VertexId) -> bool {
        self.neighbors[a.index()].contains(&b)
    }

    /// Number of distinct undirected edges.
    pub fn num_edges(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Whether every relation has its mirror.
    pub fn is_symmetric(&self) -> bool {
        self.neighbors.iter().enumerate().all(|(i, list)| {
            let v = VertexId::new(i);
            list.iter().all(|&u| self.neighbors[u.index()].contains(&v))
        })
    }
}

fn insert_unique(list: &mut Vec<VertexId>, v: VertexId) {
    if !list.contains(&v) {
        list.push(v);
    }
}
