//! Error types for core type invariants.

use thiserror::Error;

/// Errors raised when constructing types from raw parts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    /// Position and color buffers have different lengths.
    #[error("buffer length mismatch: {positions} positions, {colors} colors")]
    LengthMismatch {
        /// Number of positions supplied.
        positions: usize,
        /// Number of colors supplied.
        colors: usize,
    },

    /// A mesh failed validation.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Mesh invariant violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        /// Triangle index.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Normal buffer does not have one entry per vertex.
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch {
        /// Number of normals.
        normals: usize,
        /// Number of vertices.
        vertices: usize,
    },

    /// A vertex normal is not unit length.
    #[error("normal at vertex {vertex} is not unit length")]
    NonUnitNormal {
        /// Vertex index.
        vertex: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypesError::LengthMismatch {
            positions: 3,
            colors: 2,
        };
        assert_eq!(
            format!("{err}"),
            "buffer length mismatch: 3 positions, 2 colors"
        );

        let err = MeshError::IndexOutOfBounds {
            triangle: 0,
            index: 7,
            vertex_count: 3,
        };
        assert!(format!("{err}").contains("vertex 7"));
    }
}
