//! # Deformesh
//!
//! Interactive-style surface editing on triangle meshes.
//!
//! Deformesh loads an indexed triangle mesh, lets the caller mark a region of
//! interest, a handle inside it and an anchor ring that holds the surface in
//! place, and then moves the handle while the rest of the region follows
//! smoothly. The smoothness comes from a discrete Laplacian solve: every
//! vertex tries to keep its offset from the centroid of its neighbors.
//!
//! ## Features
//!
//! - **Indexed mesh store**: integer vertex and face ids, adjacency as index lists
//! - **Vertex normals**: area, angle or uniform weighting, recomputed after edits
//! - **Selection**: sphere and id selection, handle ring or region border anchors
//! - **Deformation**: least-squares Laplacian editing with a conjugate gradient solver
//! - **File formats**: OFF and OBJ, plus a plain-text selection file
//!
//! ## Quick Start
//!
//! ```no_run
//! use deformesh::prelude::*;
//! use nalgebra::{Point3, Vector3};
//!
//! let mut mesh: TriangleMesh = deformesh::io::load("bunny.off").unwrap();
//! center_and_scale_to_unit(&mut mesh);
//!
//! let seed = Point3::new(0.0, 0.4, 0.0);
//! select_sphere(&mut mesh, &seed, 0.3, SelectionIntent::Interest).unwrap();
//! select_sphere(&mut mesh, &seed, 0.05, SelectionIntent::Handle).unwrap();
//! compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
//!
//! let pull = HandleTransform::translation(Vector3::new(0.0, 0.1, 0.0));
//! let report = laplacian_deform(&mut mesh, &pull, &DeformOptions::default()).unwrap();
//! println!("moved {} free vertices", report.free);
//!
//! deformesh::io::save(&mesh, "bunny_edited.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use deformesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh: TriangleMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 4);
//!
//! // Every vertex of a tetrahedron touches the other three.
//! for v in mesh.vertex_ids() {
//!     assert_eq!(mesh.neighbors(v).len(), 3);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use deformesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::deform::{
        laplacian_deform, solve_deformation, DeformOptions, DeformReport, Deformation,
        HandleTransform,
    };
    pub use crate::algo::normalize::{center_and_scale_to_unit, Normalization};
    pub use crate::algo::normals::NormalWeighting;
    pub use crate::algo::select::{
        clear_selection, compute_anchor, select_sphere, select_vertices, AnchorPolicy,
        SelectionIntent,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, FaceId, SelectionCounts, Triangle, TriangleMesh,
        Vertex, VertexId, VertexRole,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
