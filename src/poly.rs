//! Polyhedra and the handles the spatial index refers to.
//!
//! A [`Polyhedron`] owns its vertices, edges and faces in stable tables
//! together with the incidence maps the intersection queries need
//! (vertex → faces, edge → faces). The octree and the intersection store
//! never own primitives; they hold [`VertRef`]/[`EdgeRef`]/[`FaceRef`]
//! handles that borrow the polyhedron, so the borrow checker enforces that
//! both are rebuilt or dropped when the mesh changes.
//!
//! Handle identity is `(owner id, index)`: cheap to copy, hashable, and
//! totally ordered, which the sorted-merge set intersection in
//! [`common_faces`](crate::Intersections::common_faces) relies on.
//!
//! Faces are planar polygons given as ordered vertex loops, wound
//! counter-clockwise when viewed from the front; the edge table is derived
//! from the loops during [`Polyhedron::build`]. An edge bordering a single
//! face is a boundary edge and keeps `None` in its second face slot; an
//! edge bordering more than two faces is rejected.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use nalgebra::Point3;
use tracing::debug;

use crate::bounds::Aabb;
use crate::error::{CsgError, CsgResult};
use crate::geom::{Plane, Segment};
use crate::tag::{Epoch, Tag};

static NEXT_POLY_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identifier of a [`Polyhedron`].
///
/// Assigned from a monotone counter at construction; handle equality and
/// ordering are derived from it, so they are deterministic within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolyId(u64);

impl PolyId {
    fn next() -> Self {
        Self(NEXT_POLY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A point of a polyhedron.
#[derive(Debug)]
pub struct Vertex {
    /// Position in world coordinates.
    pub pos: Point3<f64>,
}

/// An undirected edge between two vertices of the owning polyhedron.
///
/// Carries the epoch stamp used for query deduplication.
#[derive(Debug)]
pub struct Edge {
    v1: u32,
    v2: u32,
    tag: Tag,
}

/// A planar polygonal face: an ordered vertex loop, its derived edge list,
/// plane equation and bounding box.
#[derive(Debug)]
pub struct Face {
    vertices: Vec<u32>,
    edges: Vec<u32>,
    plane: Plane,
    aabb: Aabb,
    tag: Tag,
}

/// A polyhedral mesh with incidence tables.
///
/// # Example
///
/// ```
/// use csg_core::Polyhedron;
/// use nalgebra::Point3;
///
/// // A single triangle.
/// let poly = Polyhedron::build(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![vec![0, 1, 2]],
/// )?;
///
/// assert_eq!(poly.vertex_count(), 3);
/// assert_eq!(poly.edge_count(), 3);
/// assert_eq!(poly.face_count(), 1);
/// # Ok::<(), csg_core::CsgError>(())
/// ```
#[derive(Debug)]
pub struct Polyhedron {
    id: PolyId,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    vertex_to_face: Vec<Vec<u32>>,
    edge_to_face: Vec<[Option<u32>; 2]>,
}

impl Polyhedron {
    /// Build a polyhedron from vertex positions and face loops.
    ///
    /// Each loop lists vertex indices counter-clockwise when viewed from
    /// the face's front. The edge table and both incidence maps are
    /// derived from the loops. Open meshes are accepted: an edge used by
    /// only one loop keeps a `None` in its second face slot.
    ///
    /// # Errors
    ///
    /// - [`CsgError::DegenerateFace`] if a loop has fewer than 3 vertices.
    /// - [`CsgError::VertexOutOfRange`] if a loop index is past the vertex
    ///   table.
    /// - [`CsgError::NonManifoldEdge`] if an edge is used by more than two
    ///   loops.
    /// - [`CsgError::DegenerateFaceNormal`] if a loop has no usable plane.
    pub fn build(
        positions: Vec<Point3<f64>>,
        face_loops: Vec<Vec<u32>>,
    ) -> CsgResult<Self> {
        let vertex_count = positions.len() as u32;

        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_to_face: Vec<[Option<u32>; 2]> = Vec::new();
        let mut vertex_to_face: Vec<Vec<u32>> = vec![Vec::new(); positions.len()];
        let mut edge_lookup: HashMap<(u32, u32), u32> = HashMap::new();
        let mut faces: Vec<Face> = Vec::with_capacity(face_loops.len());

        for (face_index, vloop) in face_loops.into_iter().enumerate() {
            if vloop.len() < 3 {
                return Err(CsgError::DegenerateFace { face: face_index });
            }
            if let Some(&bad) = vloop.iter().find(|&&v| v >= vertex_count) {
                return Err(CsgError::VertexOutOfRange {
                    face: face_index,
                    vertex: bad,
                });
            }

            let loop_points: Vec<Point3<f64>> =
                vloop.iter().map(|&v| positions[v as usize]).collect();
            let plane = Plane::from_loop(&loop_points)
                .ok_or(CsgError::DegenerateFaceNormal { face: face_index })?;
            let aabb = Aabb::from_points(loop_points.iter());

            let face_id = faces.len() as u32;
            let mut face_edges = Vec::with_capacity(vloop.len());

            for (i, &v1) in vloop.iter().enumerate() {
                let v2 = vloop[(i + 1) % vloop.len()];
                let key = (v1.min(v2), v1.max(v2));
                let edge_id = *edge_lookup.entry(key).or_insert_with(|| {
                    let id = edges.len() as u32;
                    edges.push(Edge {
                        v1,
                        v2,
                        tag: Tag::new(),
                    });
                    edge_to_face.push([None, None]);
                    id
                });
                face_edges.push(edge_id);

                let slots = &mut edge_to_face[edge_id as usize];
                if let Some(slot) = slots.iter_mut().find(|s| s.is_none()) {
                    *slot = Some(face_id);
                } else {
                    return Err(CsgError::NonManifoldEdge {
                        v1: key.0,
                        v2: key.1,
                    });
                }

                vertex_to_face[v1 as usize].push(face_id);
            }

            faces.push(Face {
                vertices: vloop,
                edges: face_edges,
                plane,
                aabb,
                tag: Tag::new(),
            });
        }

        let id = PolyId::next();
        debug!(
            poly = id.0,
            vertices = positions.len(),
            edges = edges.len(),
            faces = faces.len(),
            "built polyhedron"
        );

        Ok(Self {
            id,
            vertices: positions.into_iter().map(|pos| Vertex { pos }).collect(),
            edges,
            faces,
            vertex_to_face,
            edge_to_face,
        })
    }

    /// Process-unique id of this polyhedron.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PolyId {
        self.id
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Handle to vertex `index`. The index must be in range.
    #[inline]
    #[must_use]
    pub fn vertex(&self, index: u32) -> VertRef<'_> {
        debug_assert!((index as usize) < self.vertices.len());
        VertRef { poly: self, index }
    }

    /// Handle to edge `index`. The index must be in range.
    #[inline]
    #[must_use]
    pub fn edge(&self, index: u32) -> EdgeRef<'_> {
        debug_assert!((index as usize) < self.edges.len());
        EdgeRef { poly: self, index }
    }

    /// Handle to face `index`. The index must be in range.
    #[inline]
    #[must_use]
    pub fn face(&self, index: u32) -> FaceRef<'_> {
        debug_assert!((index as usize) < self.faces.len());
        FaceRef { poly: self, index }
    }

    /// Iterate over all vertex handles.
    pub fn vertices(&self) -> impl Iterator<Item = VertRef<'_>> {
        (0..self.vertices.len() as u32).map(move |index| VertRef { poly: self, index })
    }

    /// Iterate over all edge handles.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> {
        (0..self.edges.len() as u32).map(move |index| EdgeRef { poly: self, index })
    }

    /// Iterate over all face handles.
    pub fn faces(&self) -> impl Iterator<Item = FaceRef<'_>> {
        (0..self.faces.len() as u32).map(move |index| FaceRef { poly: self, index })
    }

    /// Faces incident on vertex `index`, in stable order.
    pub fn faces_of_vertex(&self, index: u32) -> impl Iterator<Item = FaceRef<'_>> {
        self.vertex_to_face[index as usize]
            .iter()
            .map(move |&f| FaceRef {
                poly: self,
                index: f,
            })
    }

    /// The up-to-two faces incident on edge `index`.
    ///
    /// A `None` entry marks a boundary edge.
    #[must_use]
    pub fn faces_of_edge(&self, index: u32) -> [Option<FaceRef<'_>>; 2] {
        let slots = self.edge_to_face[index as usize];
        slots.map(|s| {
            s.map(|f| FaceRef {
                poly: self,
                index: f,
            })
        })
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.pos))
    }
}

macro_rules! handle_identity {
    ($name:ident) => {
        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.poly.id == other.poly.id && self.index == other.index
            }
        }

        impl Eq for $name<'_> {}

        impl Hash for $name<'_> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.poly.id.hash(state);
                self.index.hash(state);
            }
        }

        impl PartialOrd for $name<'_> {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name<'_> {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                (self.poly.id, self.index).cmp(&(other.poly.id, other.index))
            }
        }

        impl std::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("poly", &self.poly.id)
                    .field("index", &self.index)
                    .finish()
            }
        }
    };
}

/// Borrowed handle to a vertex.
#[derive(Clone, Copy)]
pub struct VertRef<'a> {
    poly: &'a Polyhedron,
    index: u32,
}

handle_identity!(VertRef);

impl<'a> VertRef<'a> {
    /// Position of the vertex.
    #[inline]
    #[must_use]
    pub fn pos(&self) -> Point3<f64> {
        self.poly.vertices[self.index as usize].pos
    }

    /// The owning polyhedron.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &'a Polyhedron {
        self.poly
    }

    /// Index in the owner's vertex table.
    #[inline]
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Faces incident on this vertex, in stable order.
    pub fn faces(&self) -> impl Iterator<Item = FaceRef<'a>> {
        self.poly.faces_of_vertex(self.index)
    }
}

/// Borrowed handle to an edge.
#[derive(Clone, Copy)]
pub struct EdgeRef<'a> {
    poly: &'a Polyhedron,
    index: u32,
}

handle_identity!(EdgeRef);

impl<'a> EdgeRef<'a> {
    /// First endpoint.
    #[inline]
    #[must_use]
    pub fn v1(&self) -> VertRef<'a> {
        VertRef {
            poly: self.poly,
            index: self.poly.edges[self.index as usize].v1,
        }
    }

    /// Second endpoint.
    #[inline]
    #[must_use]
    pub fn v2(&self) -> VertRef<'a> {
        VertRef {
            poly: self.poly,
            index: self.poly.edges[self.index as usize].v2,
        }
    }

    /// The edge as a line segment from `v1` to `v2`.
    #[inline]
    #[must_use]
    pub fn segment(&self) -> Segment {
        Segment::new(self.v1().pos(), self.v2().pos())
    }

    /// The owning polyhedron.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &'a Polyhedron {
        self.poly
    }

    /// Index in the owner's edge table.
    #[inline]
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The up-to-two incident faces; `None` marks a boundary edge.
    #[must_use]
    pub fn faces(&self) -> [Option<FaceRef<'a>>; 2] {
        self.poly.faces_of_edge(self.index)
    }

    /// First-visit test for the given query epoch.
    #[inline]
    pub fn tag_once(&self, epoch: Epoch) -> bool {
        self.poly.edges[self.index as usize].tag.tag_once(epoch)
    }
}

/// Borrowed handle to a face.
#[derive(Clone, Copy)]
pub struct FaceRef<'a> {
    poly: &'a Polyhedron,
    index: u32,
}

handle_identity!(FaceRef);

impl<'a> FaceRef<'a> {
    /// The face's vertex loop, in winding order.
    pub fn vertices(&self) -> impl Iterator<Item = VertRef<'a>> {
        let poly = self.poly;
        poly.faces[self.index as usize]
            .vertices
            .iter()
            .map(move |&index| VertRef { poly, index })
    }

    /// The face's edges, one per loop segment.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'a>> {
        let poly = self.poly;
        poly.faces[self.index as usize]
            .edges
            .iter()
            .map(move |&index| EdgeRef { poly, index })
    }

    /// Number of vertices in the loop.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.poly.faces[self.index as usize].vertices.len()
    }

    /// The face's plane equation (unit normal + offset).
    #[inline]
    #[must_use]
    pub fn plane(&self) -> &'a Plane {
        &self.poly.faces[self.index as usize].plane
    }

    /// The face's bounding box.
    #[inline]
    #[must_use]
    pub fn aabb(&self) -> &'a Aabb {
        &self.poly.faces[self.index as usize].aabb
    }

    /// The owning polyhedron.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &'a Polyhedron {
        self.poly
    }

    /// Index in the owner's face table.
    #[inline]
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// First-visit test for the given query epoch.
    #[inline]
    pub fn tag_once(&self, epoch: Epoch) -> bool {
        self.poly.faces[self.index as usize].tag.tag_once(epoch)
    }
}
