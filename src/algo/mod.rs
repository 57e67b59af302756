//! Mesh processing algorithms.
//!
//! - **Normals**: area, angle or uniform weighted vertex normals
//! - **Normalization**: recenter and rescale into the unit box
//! - **Selection**: region of interest, handle and anchor sets
//! - **Deformation**: Laplacian surface editing driven by the handle
//!
//! [`sparse`] holds the CSR matrix and conjugate gradient solver the
//! deformation is built on.

pub mod deform;
pub mod normalize;
pub mod normals;
pub mod select;
pub mod sparse;
