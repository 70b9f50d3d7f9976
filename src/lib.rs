//! Spatial core for boolean operations (CSG) on polyhedra.
//!
//! This crate provides the two data structures that drive boolean
//! operations between polyhedral meshes:
//!
//! - [`Octree`] - an adaptive spatial index over the vertices, edges and
//!   faces of the input polyhedra, with *lazy* subdivision during queries
//!   and tag-based deduplication of results
//! - [`Intersections`] - a symmetric store of computed intersections
//!   between primitives, with the incidence queries the CSG classifier
//!   consumes ("faces incident on anything intersecting this edge",
//!   "faces common to this vertex set")
//!
//! Supporting types: [`Polyhedron`] with its borrowed
//! [`VertRef`]/[`EdgeRef`]/[`FaceRef`] handles, the polymorphic [`IObj`]
//! handle, [`Aabb`]/[`Plane`]/[`Segment`] predicates and the
//! [`tag`] epoch source.
//!
//! # Ownership
//!
//! Polyhedra own their primitives; the octree and the store only borrow.
//! Both must be rebuilt when a mesh changes, and the borrow checker
//! enforces it.
//!
//! # Concurrency
//!
//! Queries are single-threaded by design: deduplication stamps epoch
//! cells on the primitives themselves, which makes everything involved
//! deliberately `!Sync`. The CSG driver serialises all access.
//!
//! # Quick Start
//!
//! ```
//! use csg_core::{Octree, Polyhedron, Segment};
//! use nalgebra::Point3;
//!
//! // A single triangle standing in for mesh A.
//! let mesh = Polyhedron::build(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ],
//!     vec![vec![0, 1, 2]],
//! )?;
//!
//! let mut tree = Octree::default();
//! tree.set_bounds_aabb(&mesh.aabb());
//! tree.add_faces(mesh.faces());
//! tree.add_edges(mesh.edges());
//!
//! // Candidate faces near a probe segment; exact tests come later.
//! let probe = Segment::new(Point3::new(0.2, 0.2, -1.0), Point3::new(0.2, 0.2, 1.0));
//! let mut candidates = Vec::new();
//! tree.find_faces_near_segment(&probe, &mut candidates);
//! assert_eq!(candidates.len(), 1);
//! # Ok::<(), csg_core::CsgError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that conflict with API design choices
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow single-char names in math-heavy code (standard in geometry algorithms)
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]
// Mesh tables are u32-indexed; sizes are validated at build time
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_const_for_fn)]

pub mod bounds;
pub mod config;
pub mod error;
pub mod geom;
pub mod intersections;
pub mod iobj;
pub mod octree;
pub mod poly;
pub mod tag;
pub mod traits;

pub use bounds::Aabb;
pub use config::OctreeConfig;
pub use error::{CsgError, CsgResult};
pub use geom::{Plane, Segment};
pub use intersections::Intersections;
pub use iobj::IObj;
pub use octree::{
    edge_in_front_of_plane, face_in_front_of_plane, Octree, OctreeStats,
    PLANE_FRONT_TOLERANCE, SLACK_FACTOR,
};
pub use poly::{Edge, EdgeRef, Face, FaceRef, PolyId, Polyhedron, VertRef, Vertex};
pub use traits::Inserter;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```ignore
/// use csg_core::prelude::*;
///
/// let mut tree = Octree::default();
/// ```
pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::config::OctreeConfig;
    pub use crate::error::{CsgError, CsgResult};
    pub use crate::geom::{Plane, Segment};
    pub use crate::intersections::Intersections;
    pub use crate::iobj::IObj;
    pub use crate::octree::Octree;
    pub use crate::poly::{EdgeRef, FaceRef, Polyhedron, VertRef};
    pub use crate::traits::Inserter;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    /// Axis-aligned cube spanning `[origin, origin + size]^3`.
    fn cube_at(origin: f64, size: f64) -> Polyhedron {
        let o = origin;
        let s = origin + size;
        Polyhedron::build(
            vec![
                Point3::new(o, o, o),
                Point3::new(s, o, o),
                Point3::new(s, s, o),
                Point3::new(o, s, o),
                Point3::new(o, o, s),
                Point3::new(s, o, s),
                Point3::new(s, s, s),
                Point3::new(o, s, s),
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
    fn octree_narrows_face_candidates_between_two_meshes() {
        let a = cube_at(0.0, 1.0);
        let b = cube_at(0.5, 1.0); // overlaps the +x/+y/+z corner of a

        let mut tree = Octree::new(
            OctreeConfig::default()
                .with_face_split_threshold(2)
                .with_max_split_depth(3),
        );
        let bounds = Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(2.0, 2.0, 2.0));
        tree.set_bounds_aabb(&bounds);
        tree.add_faces(a.faces());

        // Every edge of b gets a candidate set from a's faces.
        let mut total_candidates = 0;
        for edge in b.edges() {
            let mut candidates = Vec::new();
            tree.find_faces_near_edge(edge, &mut candidates);
            total_candidates += candidates.len();

            let mut unique: Vec<_> = candidates.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), candidates.len(), "duplicate candidates");
        }
        assert!(total_candidates > 0);
    }

    #[test]
    fn store_drives_shared_face_lookup() {
        let a = cube_at(0.0, 1.0);
        let b = cube_at(0.5, 1.0);
        let mut store = Intersections::new();

        // Pretend the corner vertex of b pierces the top face of a, and
        // two of its edges cross the same face.
        let corner = b.vertex(0);
        let top = a.face(1);
        store.record(IObj::from(corner), IObj::from(top), corner);
        store.record(IObj::from(b.edge(0)), IObj::from(top), corner);

        assert!(store.intersects_face(IObj::from(corner), top));

        let mut faces: HashSet<FaceRef<'_>> = HashSet::new();
        store.intersected_faces_of_vertex(corner, &mut faces);
        assert!(faces.contains(&top));

        // The corner vertex is the only queried vertex, so the common
        // set is exactly its own intersected-face set.
        let mut common = Vec::new();
        store.common_faces([corner], &mut common);
        assert_eq!(common, vec![top]);
    }

    #[test]
    fn end_to_end_candidates_then_relations() {
        let a = cube_at(0.0, 1.0);
        let b = cube_at(0.5, 1.0);

        let mut tree = Octree::default();
        let bounds = Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(2.0, 2.0, 2.0));
        tree.set_bounds_aabb(&bounds);
        tree.add_faces(a.faces());

        let mut store = Intersections::new();

        // Record one relation per candidate pair the octree surfaces.
        for edge in b.edges() {
            let mut candidates = Vec::new();
            tree.find_faces_near_edge(edge, &mut candidates);
            for face in candidates {
                store.record(IObj::from(edge), IObj::from(face), edge.v1());
            }
        }

        assert!(!store.is_empty());
        for edge in b.edges() {
            let mut candidates = Vec::new();
            tree.find_faces_near_edge(edge, &mut candidates);
            for face in candidates {
                assert!(store.intersects_exactly(IObj::from(face), IObj::from(edge)));
                assert!(store.edge_intersects_face(edge, face));
            }
        }
    }
}
