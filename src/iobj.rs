//! Polymorphic intersection objects.
//!
//! An [`IObj`] identifies one vertex, edge or face of some polyhedron
//! behind a single small, copyable, hashable handle, so the intersection
//! store can key relations between primitives of different kinds in one
//! map.

use crate::poly::{EdgeRef, FaceRef, VertRef};
use crate::traits::Inserter;

/// A tagged handle to a vertex, edge or face.
///
/// Equality, hashing and ordering combine the kind with the referent's
/// `(owner, index)` identity. `IObj::None` is the identity of "no object"
/// and never matches a real primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum IObj<'a> {
    /// No object.
    #[default]
    None,
    /// A vertex.
    Vertex(VertRef<'a>),
    /// An edge.
    Edge(EdgeRef<'a>),
    /// A face.
    Face(FaceRef<'a>),
}

impl<'a> From<VertRef<'a>> for IObj<'a> {
    fn from(v: VertRef<'a>) -> Self {
        Self::Vertex(v)
    }
}

impl<'a> From<EdgeRef<'a>> for IObj<'a> {
    fn from(e: EdgeRef<'a>) -> Self {
        Self::Edge(e)
    }
}

impl<'a> From<FaceRef<'a>> for IObj<'a> {
    fn from(f: FaceRef<'a>) -> Self {
        Self::Face(f)
    }
}

impl<'a> IObj<'a> {
    /// True for `IObj::None`.
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Append the faces incident on this object to `out`.
    ///
    /// - a vertex contributes every face around it;
    /// - an edge contributes its up-to-two faces, skipping the empty slot
    ///   of a boundary edge;
    /// - a face contributes itself;
    /// - `None` contributes nothing.
    pub fn incident_faces<C: Inserter<FaceRef<'a>>>(&self, out: &mut C) {
        match *self {
            Self::Vertex(v) => {
                for f in v.faces() {
                    out.add(f);
                }
            }
            Self::Edge(e) => {
                for f in e.faces().into_iter().flatten() {
                    out.add(f);
                }
            }
            Self::Face(f) => out.add(f),
            Self::None => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::poly::Polyhedron;
    use nalgebra::Point3;

    fn cube() -> Polyhedron {
        Polyhedron::build(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
            vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![2, 3, 7, 6],
                vec![0, 4, 7, 3],
                vec![1, 2, 6, 5],
            ],
        )
        .unwrap()
    }

    #[test]
    fn kind_and_identity_distinguish_objects() {
        let poly = cube();

        assert_eq!(IObj::from(poly.vertex(0)), IObj::Vertex(poly.vertex(0)));
        assert_ne!(IObj::from(poly.vertex(0)), IObj::from(poly.vertex(1)));
        // Same index, different kind.
        assert_ne!(IObj::from(poly.vertex(0)), IObj::from(poly.edge(0)));
        assert!(!IObj::from(poly.vertex(0)).is_none());
        assert!(IObj::None.is_none());
    }

    #[test]
    fn vertex_contributes_surrounding_faces() {
        let poly = cube();
        let mut out = Vec::new();
        IObj::from(poly.vertex(0)).incident_faces(&mut out);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn edge_contributes_two_faces() {
        let poly = cube();
        let mut out = Vec::new();
        IObj::from(poly.edge(0)).incident_faces(&mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn boundary_edge_skips_empty_slot() {
        let quad = Polyhedron::build(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap();

        let mut out = Vec::new();
        IObj::from(quad.edge(0)).incident_faces(&mut out);
        assert_eq!(out, vec![quad.face(0)]);
    }

    #[test]
    fn face_contributes_itself_and_none_nothing() {
        let poly = cube();
        let mut out = Vec::new();
        IObj::from(poly.face(2)).incident_faces(&mut out);
        assert_eq!(out, vec![poly.face(2)]);

        let mut empty = Vec::new();
        IObj::None.incident_faces(&mut empty);
        assert!(empty.is_empty());
    }
}
