//! Storage for computed intersections between vertices, edges and faces.
//!
//! The CSG driver records every intersection it computes as a symmetric
//! relation: `record(a, b, p)` stores the intersection point `p` under
//! both `(a, b)` and `(b, a)`. On top of the raw relation the store
//! answers the containment-style queries the classifier needs: does an
//! object intersect an edge *or either of its endpoints*, which faces are
//! incident on anything intersecting an edge, which faces are common to a
//! set of vertices.
//!
//! Most objects intersect only a handful of others, so the per-object
//! map is a small linear-probed vector rather than a hash map.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::iobj::IObj;
use crate::poly::{EdgeRef, FaceRef, VertRef};
use crate::traits::Inserter;

/// Vector-backed map from partner object to intersection point.
///
/// Linear scan; inserts are last-writer-wins.
#[derive(Debug, Default, Clone)]
struct PointMap<'a> {
    entries: SmallVec<[(IObj<'a>, VertRef<'a>); 4]>,
}

impl<'a> PointMap<'a> {
    fn insert(&mut self, key: IObj<'a>, point: VertRef<'a>) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = point;
        } else {
            self.entries.push((key, point));
        }
    }

    fn get(&self, key: &IObj<'a>) -> Option<VertRef<'a>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| *p)
    }

    fn contains(&self, key: &IObj<'a>) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    fn iter(&self) -> impl Iterator<Item = &(IObj<'a>, VertRef<'a>)> {
        self.entries.iter()
    }
}

/// Symmetric store of intersections between pairs of objects.
///
/// # Example
///
/// ```
/// use csg_core::{Intersections, IObj, Polyhedron};
/// use nalgebra::Point3;
///
/// let poly = Polyhedron::build(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     vec![vec![0, 1, 2]],
/// )?;
///
/// let mut store = Intersections::new();
/// let a = IObj::from(poly.vertex(0));
/// let b = IObj::from(poly.face(0));
/// store.record(a, b, poly.vertex(0));
///
/// // Symmetric by construction.
/// assert!(store.intersects_exactly(a, b));
/// assert!(store.intersects_exactly(b, a));
/// # Ok::<(), csg_core::CsgError>(())
/// ```
#[derive(Debug, Default)]
pub struct Intersections<'a> {
    map: HashMap<IObj<'a>, PointMap<'a>>,
}

impl<'a> Intersections<'a> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the intersection of `a` and `b` at point `p`.
    ///
    /// Both directions are written. Re-recording a pair overwrites the
    /// previous point; callers are expected not to record conflicting
    /// points for one pair.
    pub fn record(&mut self, a: IObj<'a>, b: IObj<'a>, p: VertRef<'a>) {
        self.map.entry(a).or_default().insert(b, p);
        self.map.entry(b).or_default().insert(a, p);
    }

    /// True iff the pair `(a, b)` itself has been recorded.
    #[must_use]
    pub fn intersects_exactly(&self, a: IObj<'a>, b: IObj<'a>) -> bool {
        self.map.get(&a).is_some_and(|m| m.contains(&b))
    }

    /// The recorded intersection point of `(a, b)`, if any.
    #[must_use]
    pub fn point_of(&self, a: IObj<'a>, b: IObj<'a>) -> Option<VertRef<'a>> {
        self.map.get(&a).and_then(|m| m.get(&b))
    }

    /// True iff `a` intersects vertex `v`.
    #[must_use]
    pub fn intersects_vertex(&self, a: IObj<'a>, v: VertRef<'a>) -> bool {
        self.map
            .get(&a)
            .is_some_and(|m| m.contains(&IObj::Vertex(v)))
    }

    /// True iff `a` intersects edge `e`, on the edge or at either
    /// endpoint.
    #[must_use]
    pub fn intersects_edge(&self, a: IObj<'a>, e: EdgeRef<'a>) -> bool {
        let Some(m) = self.map.get(&a) else {
            return false;
        };
        m.contains(&IObj::Edge(e))
            || m.contains(&IObj::Vertex(e.v1()))
            || m.contains(&IObj::Vertex(e.v2()))
    }

    /// True iff `a` intersects face `f`, on the face or at any of its
    /// edges or vertices.
    #[must_use]
    pub fn intersects_face(&self, a: IObj<'a>, f: FaceRef<'a>) -> bool {
        let Some(m) = self.map.get(&a) else {
            return false;
        };
        if m.contains(&IObj::Face(f)) {
            return true;
        }
        if f.edges().any(|e| m.contains(&IObj::Edge(e))) {
            return true;
        }
        f.vertices().any(|v| m.contains(&IObj::Vertex(v)))
    }

    /// True iff edge `e1` intersects edge `e2`, through the edges
    /// themselves or any of their endpoints.
    #[must_use]
    pub fn edge_intersects_edge(&self, e1: EdgeRef<'a>, e2: EdgeRef<'a>) -> bool {
        self.intersects_edge(IObj::Vertex(e1.v1()), e2)
            || self.intersects_edge(IObj::Vertex(e1.v2()), e2)
            || self.intersects_edge(IObj::Edge(e1), e2)
    }

    /// True iff edge `e` intersects face `f`, through the edge itself or
    /// either endpoint.
    #[must_use]
    pub fn edge_intersects_face(&self, e: EdgeRef<'a>, f: FaceRef<'a>) -> bool {
        self.intersects_face(IObj::Vertex(e.v1()), f)
            || self.intersects_face(IObj::Vertex(e.v2()), f)
            || self.intersects_face(IObj::Edge(e), f)
    }

    /// Route every recorded partner of `obj` into the per-kind outputs.
    pub fn collect(
        &self,
        obj: IObj<'a>,
        out_v: &mut Vec<VertRef<'a>>,
        out_e: &mut Vec<EdgeRef<'a>>,
        out_f: &mut Vec<FaceRef<'a>>,
    ) {
        if let Some(m) = self.map.get(&obj) {
            for (partner, _) in m.iter() {
                match *partner {
                    IObj::Vertex(v) => out_v.push(v),
                    IObj::Edge(e) => out_e.push(e),
                    IObj::Face(f) => out_f.push(f),
                    IObj::None => {}
                }
            }
        }
    }

    /// The faces intersected by edge `e`: faces incident on every
    /// intersecting vertex and edge, plus directly intersecting faces.
    ///
    /// No deduplication beyond what `out` itself provides.
    pub fn intersected_faces_of_edge<C: Inserter<FaceRef<'a>>>(
        &self,
        e: EdgeRef<'a>,
        out: &mut C,
    ) {
        self.intersected_faces(IObj::Edge(e), out);
    }

    /// The faces intersected by vertex `v`; see
    /// [`intersected_faces_of_edge`](Self::intersected_faces_of_edge).
    pub fn intersected_faces_of_vertex<C: Inserter<FaceRef<'a>>>(
        &self,
        v: VertRef<'a>,
        out: &mut C,
    ) {
        self.intersected_faces(IObj::Vertex(v), out);
    }

    fn intersected_faces<C: Inserter<FaceRef<'a>>>(&self, obj: IObj<'a>, out: &mut C) {
        let mut verts = Vec::new();
        let mut edges = Vec::new();
        let mut faces = Vec::new();
        self.collect(obj, &mut verts, &mut edges, &mut faces);

        for v in verts {
            IObj::Vertex(v).incident_faces(out);
        }
        for e in edges {
            IObj::Edge(e).incident_faces(out);
        }
        for f in faces {
            out.add(f);
        }
    }

    /// The faces common to the intersected-face sets of every vertex in
    /// `verts`.
    ///
    /// The working sets are ordered and the per-step intersection is a
    /// sorted merge, so the result is stable regardless of the output
    /// container. Empty input yields empty output.
    pub fn common_faces<I, C>(&self, verts: I, out: &mut C)
    where
        I: IntoIterator<Item = VertRef<'a>>,
        C: Inserter<FaceRef<'a>>,
    {
        let mut iter = verts.into_iter();
        let Some(first) = iter.next() else {
            return;
        };

        let mut working: BTreeSet<FaceRef<'a>> = BTreeSet::new();
        self.intersected_faces_of_vertex(first, &mut working);

        for v in iter {
            let mut next: BTreeSet<FaceRef<'a>> = BTreeSet::new();
            self.intersected_faces_of_vertex(v, &mut next);
            working = working.intersection(&next).copied().collect();
        }

        for f in working {
            out.add(f);
        }
    }

    /// Forget all recorded intersections.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of objects with at least one recorded partner.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True iff nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
