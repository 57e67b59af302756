//! Error types for deformesh.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no vertices.
    #[error("mesh has no vertices")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A vertex id passed by the caller is outside the mesh.
    #[error("vertex {vertex} is out of range for a mesh with {num_vertices} vertices")]
    VertexOutOfRange {
        /// The offending vertex index.
        vertex: usize,
        /// Number of vertices in the mesh.
        num_vertices: usize,
    },

    /// A connected part of the handle has no anchor vertex in its ROI
    /// component to hold the rest of the surface in place.
    #[error("underconstrained system: {handle} handle vertices but no anchor")]
    Underconstrained {
        /// Number of handle vertices in the unanchored component.
        handle: usize,
    },

    /// The Laplacian system could not be solved reliably.
    #[error("singular system on axis {axis}: {reason}")]
    SingularSystem {
        /// The coordinate axis being solved (`x`, `y` or `z`).
        axis: char,
        /// What the solver observed.
        reason: String,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Algorithm failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a load error for `path`.
    pub(crate) fn load(path: &std::path::Path, message: impl Into<String>) -> Self {
        MeshError::LoadError {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a save error for `path`.
    pub(crate) fn save(path: &std::path::Path, message: impl Into<String>) -> Self {
        MeshError::SaveError {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether the caller can fix the input and try again without reloading.
    ///
    /// Selection and solver errors leave the mesh untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MeshError::Underconstrained { .. }
                | MeshError::SingularSystem { .. }
                | MeshError::ConvergenceFailed { .. }
                | MeshError::InvalidParameter { .. }
                | MeshError::VertexOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = MeshError::Underconstrained { handle: 25 };
        assert_eq!(
            e.to_string(),
            "underconstrained system: 25 handle vertices but no anchor"
        );

        let e = MeshError::invalid_param("radius", -1.0, "must be non-negative");
        assert_eq!(
            e.to_string(),
            "invalid parameter: radius = -1 (must be non-negative)"
        );

        let e = MeshError::save(std::path::Path::new("out.off"), "disk full");
        assert_eq!(e.to_string(), "failed to save mesh to out.off: disk full");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(MeshError::Underconstrained { handle: 1 }.is_recoverable());
        assert!(MeshError::SingularSystem {
            axis: 'x',
            reason: "residual".into()
        }
        .is_recoverable());
        assert!(!MeshError::EmptyMesh.is_recoverable());
        assert!(!MeshError::InvalidVertexIndex { face: 0, vertex: 9 }.is_recoverable());
    }
}
