//! Error types for polyhedron construction.

use thiserror::Error;

/// Errors that can occur while building a polyhedron.
///
/// The spatial index and the intersection store themselves never fail:
/// queries on an unbounded tree or an unknown object return empty results.
/// Only [`Polyhedron::build`](crate::Polyhedron::build) validates input.
#[derive(Debug, Error)]
pub enum CsgError {
    /// A face loop has fewer than three vertices.
    #[error("face {face} has fewer than 3 vertices")]
    DegenerateFace {
        /// Index of the offending face loop.
        face: usize,
    },

    /// A face loop references a vertex index past the vertex table.
    #[error("face {face} references vertex {vertex} out of range")]
    VertexOutOfRange {
        /// Index of the offending face loop.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
    },

    /// An edge is shared by more than two faces.
    #[error("edge ({v1}, {v2}) is shared by more than two faces")]
    NonManifoldEdge {
        /// First endpoint vertex index.
        v1: u32,
        /// Second endpoint vertex index.
        v2: u32,
    },

    /// A face loop is collinear or otherwise has no usable normal.
    #[error("face {face} has a degenerate normal")]
    DegenerateFaceNormal {
        /// Index of the offending face loop.
        face: usize,
    },
}

/// Result type for polyhedron construction.
pub type CsgResult<T> = Result<T, CsgError>;
