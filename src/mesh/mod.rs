//! Core mesh data structures.
//!
//! This module provides the indexed triangle mesh store and the types it is
//! built from.
//!
//! # Overview
//!
//! [`TriangleMesh`] owns a vertex array and a triangle array. Vertices are
//! addressed by [`VertexId`], triangles by [`FaceId`]; both are plain indices
//! into the arrays, so nothing holds a pointer into storage that might move.
//! Adjacency ([`Adjacency`]) and per-vertex normals are derived once at
//! construction and kept current by the operations that change geometry.
//!
//! Each vertex carries one [`VertexRole`]: unselected, a free interest
//! vertex, a handle vertex or an anchor vertex.
//!
//! # Construction
//!
//! ```
//! use deformesh::mesh::{build_from_triangles, TriangleMesh, VertexId};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: TriangleMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.neighbors(VertexId::new(0)).len(), 2);
//! ```

mod adjacency;
mod builder;
mod index;
mod store;
mod vertex;

pub use adjacency::Adjacency;
pub use builder::{build_from_triangles, build_with_weighting, to_face_vertex};
pub use index::{FaceId, VertexId};
pub use store::{SelectionCounts, TriangleMesh};
pub use vertex::{Triangle, Vertex, VertexRole};
