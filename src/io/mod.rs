//! Mesh file I/O.
//!
//! This module provides functions for loading and saving meshes in various formats.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Object File Format | `.off` | ✓ | ✓ | Counts header, polygons fan-triangulated |
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Read with `tobj`, positions and faces only |
//!
//! Loaders only parse; index validation and adjacency happen in
//! [`build_from_triangles`](crate::mesh::build_from_triangles), so every
//! format reports bad indices the same way.
//!
//! The region selection can be stored next to the mesh with [`selection`].
//!
//! # Usage
//!
//! ```no_run
//! use deformesh::io::{load, save};
//! use deformesh::mesh::TriangleMesh;
//!
//! // Load with automatic format detection
//! let mesh: TriangleMesh = load("model.off").unwrap();
//!
//! // Save with automatic format detection
//! save(&mesh, "output.obj").unwrap();
//! ```

pub mod obj;
pub mod off;
pub mod selection;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::TriangleMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Object File Format.
    Off,
    /// Wavefront OBJ format.
    Obj,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "off" => Some(Format::Off),
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    fn require<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
///
/// # Example
///
/// ```no_run
/// use deformesh::io::load;
/// use deformesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match Format::require(path)? {
        Format::Off => off::load(path),
        Format::Obj => obj::load(path),
    }
}

/// Save a mesh to a file with automatic format detection.
///
/// The format is determined by the file extension.
///
/// # Example
///
/// ```no_run
/// use deformesh::io::save;
/// use deformesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = deformesh::io::load("in.obj").unwrap();
/// save(&mesh, "output.off").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::require(path)? {
        Format::Off => off::save(mesh, path),
        Format::Obj => obj::save(mesh, path),
    }
}

/// Split a polygon into a triangle fan around its first corner.
pub(crate) fn fan_triangulate(polygon: &[usize], faces: &mut Vec<[usize; 3]>) {
    for i in 1..polygon.len().saturating_sub(1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}
