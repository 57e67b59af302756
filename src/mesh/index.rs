//! Index types for mesh elements.
//!
//! Vertices and triangles are addressed by position in the mesh store's
//! arrays. The wrappers below keep the two index spaces apart at the type
//! level while staying `Copy` and 4 bytes wide.

use std::fmt::{self, Debug};

/// A type-safe vertex index.
///
/// The id of a vertex is its load order and stays stable for the whole
/// editing session, since the vertex array is never reordered.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(u32);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            ///
            /// # Panics
            /// Panics in debug builds if the value does not fit in 32 bits.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id.index()
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(FaceId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(usize::from(v), 42);
    }

    #[test]
    fn test_ordering_follows_raw_index() {
        let mut ids = vec![VertexId::new(3), VertexId::new(0), VertexId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![VertexId::new(0), VertexId::new(3), VertexId::new(7)]);
    }

    #[test]
    fn test_debug_and_display_format() {
        let v = VertexId::new(42);
        assert_eq!(format!("{:?}", v), "V(42)");
        assert_eq!(format!("{}", v), "42");

        let f = FaceId::from(5usize);
        assert_eq!(format!("{:?}", f), "F(5)");
    }
}
