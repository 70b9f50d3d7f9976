//! Adaptive octree over polyhedron primitives.
//!
//! The tree indexes borrowed vertex, edge and face handles of one or more
//! polyhedra inside a bounded region. Geometry lives only in leaves, in
//! three per-kind bags; internal nodes route queries. Subdivision is
//! *lazy*: bulk inserts land everything in the root, and a leaf is split
//! only when a query visits it while its relevant bag exceeds the
//! configured threshold (and the depth bound permits).
//!
//! Each node's box is enlarged by [`SLACK_FACTOR`] about its centre so
//! primitives on a cell boundary register in at least one cell despite
//! roundoff. Because a primitive may straddle several cells, the
//! deduplicating queries stamp primitives with a fresh
//! [tag epoch](crate::tag) per query and report each one exactly once.
//!
//! Queries are conservative candidate generators: they return every
//! primitive sharing a visited leaf with the query volume. Exact
//! geometric tests are the caller's job.

use nalgebra::Point3;
use tracing::{debug, warn};

use crate::bounds::Aabb;
use crate::config::OctreeConfig;
use crate::geom::{Plane, Segment};
use crate::poly::{EdgeRef, FaceRef, VertRef};
use crate::tag::{self, Epoch};

/// Enlargement factor applied to every node's box about its centre.
pub const SLACK_FACTOR: f64 = 1.1;

/// World-unit tolerance of the in-front-of-plane predicates: a primitive
/// up to this far behind the plane still counts as in front.
pub const PLANE_FRONT_TOLERANCE: f64 = 0.01;

/// True if every vertex of `face` is in front of `plane`, within
/// [`PLANE_FRONT_TOLERANCE`].
#[must_use]
pub fn face_in_front_of_plane(plane: &Plane, face: FaceRef<'_>) -> bool {
    face.vertices()
        .all(|v| plane.signed_distance(&v.pos()) > -PLANE_FRONT_TOLERANCE)
}

/// True if both endpoints of `edge` are in front of `plane`, within
/// [`PLANE_FRONT_TOLERANCE`].
#[must_use]
pub fn edge_in_front_of_plane(plane: &Plane, edge: EdgeRef<'_>) -> bool {
    plane.signed_distance(&edge.v1().pos()) > -PLANE_FRONT_TOLERANCE
        && plane.signed_distance(&edge.v2().pos()) > -PLANE_FRONT_TOLERANCE
}

struct Node<'a> {
    min: Point3<f64>,
    max: Point3<f64>,
    /// Box enlarged by [`SLACK_FACTOR`]; all inclusion predicates use it.
    aabb: Aabb,
    /// All eight children in one allocation; `None` marks a leaf.
    children: Option<Box<[Node<'a>; 8]>>,
    vertices: Vec<VertRef<'a>>,
    edges: Vec<EdgeRef<'a>>,
    faces: Vec<FaceRef<'a>>,
}

impl<'a> Node<'a> {
    fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min,
            max,
            aabb: Aabb::new(min, max).scaled(SLACK_FACTOR),
            children: None,
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
        }
    }

    fn has_geometry(&self) -> bool {
        !self.vertices.is_empty() || !self.edges.is_empty() || !self.faces.is_empty()
    }

    /// Subdivide a populated leaf into eight octants, redistributing each
    /// bag by the kind-specific inclusion test. A primitive may land in
    /// several children. No-op on internal nodes and on leaves without
    /// geometry; returns whether subdivision happened.
    fn split(&mut self) -> bool {
        if self.children.is_some() || !self.has_geometry() {
            return false;
        }

        let lo = self.min;
        let hi = self.max;
        let mid = Point3::new(
            (lo.x + hi.x) * 0.5,
            (lo.y + hi.y) * 0.5,
            (lo.z + hi.z) * 0.5,
        );

        // Child i occupies the octant selected by the three bits of i.
        let mut children: Box<[Node<'a>; 8]> = Box::new(std::array::from_fn(|i| {
            let (x0, x1) = if i & 1 == 0 { (lo.x, mid.x) } else { (mid.x, hi.x) };
            let (y0, y1) = if i & 2 == 0 { (lo.y, mid.y) } else { (mid.y, hi.y) };
            let (z0, z1) = if i & 4 == 0 { (lo.z, mid.z) } else { (mid.z, hi.z) };
            Node::new(Point3::new(x0, y0, z0), Point3::new(x1, y1, z1))
        }));

        for child in children.iter_mut() {
            child.vertices = self
                .vertices
                .iter()
                .copied()
                .filter(|v| child.aabb.contains(&v.pos()))
                .collect();
            child.edges = self
                .edges
                .iter()
                .copied()
                .filter(|e| child.aabb.intersects_segment(&e.segment()))
                .collect();
            child.faces = self
                .faces
                .iter()
                .copied()
                .filter(|f| child.aabb.intersects(f.aabb()))
                .collect();
        }

        debug!(
            vertices = self.vertices.len(),
            edges = self.edges.len(),
            faces = self.faces.len(),
            "split octree node"
        );

        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.children = Some(children);
        true
    }
}

/// Spatial index accelerating near-neighbour queries during CSG.
///
/// # Example
///
/// ```
/// use csg_core::{Octree, Polyhedron, Segment};
/// use nalgebra::Point3;
///
/// let poly = Polyhedron::build(
///     vec![
///         Point3::new(0.1, 0.1, 0.1),
///         Point3::new(0.2, 0.1, 0.1),
///         Point3::new(0.2, 0.2, 0.1),
///         Point3::new(0.1, 0.2, 0.1),
///     ],
///     vec![vec![0, 1, 2, 3]],
/// )?;
///
/// let mut tree = Octree::default();
/// tree.set_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
/// tree.add_faces(poly.faces());
///
/// let mut found = Vec::new();
/// let diagonal = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
/// tree.find_faces_near_segment(&diagonal, &mut found);
/// assert_eq!(found.len(), 1);
/// # Ok::<(), csg_core::CsgError>(())
/// ```
#[derive(Default)]
pub struct Octree<'a> {
    root: Option<Box<Node<'a>>>,
    config: OctreeConfig,
}

impl<'a> Octree<'a> {
    /// Create an empty, unbounded tree with the given configuration.
    ///
    /// Queries on an unbounded tree return nothing; call
    /// [`set_bounds`](Self::set_bounds) first.
    #[must_use]
    pub fn new(config: OctreeConfig) -> Self {
        Self { root: None, config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Replace the indexed region with a fresh root leaf spanning
    /// `[min, max]`, discarding any existing tree and its contents.
    pub fn set_bounds(&mut self, min: Point3<f64>, max: Point3<f64>) {
        debug!(?min, ?max, "octree bounds set");
        self.root = Some(Box::new(Node::new(min, max)));
    }

    /// Replace the indexed region with a fresh root leaf spanning `aabb`
    /// grown by [`SLACK_FACTOR`] about its centre, so geometry on the
    /// outer surface is comfortably interior.
    pub fn set_bounds_aabb(&mut self, aabb: &Aabb) {
        let grown = aabb.scaled(SLACK_FACTOR);
        self.set_bounds(grown.min, grown.max);
    }

    /// Append vertex handles into the root. No subdivision happens at
    /// insert time. Without bounds the input is dropped with a warning.
    ///
    /// Bulk inserts are expected before the first query; to re-populate
    /// an already-queried tree, call [`set_bounds`](Self::set_bounds)
    /// again first.
    pub fn add_vertices(&mut self, vertices: impl IntoIterator<Item = VertRef<'a>>) {
        match self.root.as_deref_mut() {
            Some(root) => root.vertices.extend(vertices),
            None => warn!("add_vertices on an unbounded octree; input dropped"),
        }
    }

    /// Append edge handles into the root. See [`add_vertices`](Self::add_vertices).
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = EdgeRef<'a>>) {
        match self.root.as_deref_mut() {
            Some(root) => root.edges.extend(edges),
            None => warn!("add_edges on an unbounded octree; input dropped"),
        }
    }

    /// Append face handles into the root. See [`add_vertices`](Self::add_vertices).
    pub fn add_faces(&mut self, faces: impl IntoIterator<Item = FaceRef<'a>>) {
        match self.root.as_deref_mut() {
            Some(root) => root.faces.extend(faces),
            None => warn!("add_faces on an unbounded octree; input dropped"),
        }
    }

    /// Eagerly pre-subdivide the tree down to
    /// [`eager_split_depth`](OctreeConfig::eager_split_depth) levels,
    /// splitting nodes that hold at least
    /// [`eager_split_min`](OctreeConfig::eager_split_min) edges or faces.
    ///
    /// With the default depth of 0 this is a no-op; lazy subdivision
    /// during queries is sufficient on its own.
    pub fn split_tree(&mut self) {
        let depth = self.config.eager_split_depth;
        let min_occupancy = self.config.eager_split_min;
        if let Some(root) = self.root.as_deref_mut() {
            Self::eager_split(root, depth, min_occupancy);
        }
    }

    fn eager_split(node: &mut Node<'a>, remaining: u32, min_occupancy: usize) {
        if remaining == 0
            || (node.edges.len() < min_occupancy && node.faces.len() < min_occupancy)
        {
            return;
        }
        node.split();
        if let Some(children) = node.children.as_deref_mut() {
            for child in children {
                Self::eager_split(child, remaining - 1, min_occupancy);
            }
        }
    }

    /// Collect edges in cells traversed by `segment`, each at most once.
    pub fn find_edges_near_segment(&mut self, segment: &Segment, out: &mut Vec<EdgeRef<'a>>) {
        let Some(root) = self.root.as_deref_mut() else {
            return;
        };
        let epoch = tag::begin();
        let pred = |aabb: &Aabb| aabb.intersects_segment(segment);
        Self::descend_edges(root, &pred, 0, &self.config, epoch, out);
    }

    /// Collect edges in cells traversed by `edge`'s own segment, each at
    /// most once. The queried edge itself is among the results.
    pub fn find_edges_near_edge(&mut self, edge: EdgeRef<'a>, out: &mut Vec<EdgeRef<'a>>) {
        self.find_edges_near_segment(&edge.segment(), out);
    }

    /// Collect edges in cells containing `point`, each at most once.
    pub fn find_edges_near_point(&mut self, point: &Point3<f64>, out: &mut Vec<EdgeRef<'a>>) {
        let Some(root) = self.root.as_deref_mut() else {
            return;
        };
        let epoch = tag::begin();
        let pred = |aabb: &Aabb| aabb.contains(point);
        Self::descend_edges(root, &pred, 0, &self.config, epoch, out);
    }

    /// Collect faces in cells traversed by `segment`, each at most once.
    pub fn find_faces_near_segment(&mut self, segment: &Segment, out: &mut Vec<FaceRef<'a>>) {
        let Some(root) = self.root.as_deref_mut() else {
            return;
        };
        let epoch = tag::begin();
        let pred = |aabb: &Aabb| aabb.intersects_segment(segment);
        Self::descend_faces(root, &pred, 0, &self.config, epoch, out);
    }

    /// Collect faces in cells traversed by `edge`'s own segment, each at
    /// most once.
    pub fn find_faces_near_edge(&mut self, edge: EdgeRef<'a>, out: &mut Vec<FaceRef<'a>>) {
        self.find_faces_near_segment(&edge.segment(), out);
    }

    /// Collect vertices in cells containing `point`.
    ///
    /// Unlike the other queries this performs no deduplication: a vertex
    /// registered in several cells is reported once per cell.
    pub fn find_vertices_near_allow_dupes(
        &mut self,
        point: &Point3<f64>,
        out: &mut Vec<VertRef<'a>>,
    ) {
        let Some(root) = self.root.as_deref_mut() else {
            return;
        };
        let pred = |aabb: &Aabb| aabb.contains(point);
        Self::descend_vertices(root, &pred, 0, &self.config, out);
    }

    fn descend_edges<F: Fn(&Aabb) -> bool>(
        node: &mut Node<'a>,
        pred: &F,
        depth: u32,
        config: &OctreeConfig,
        epoch: Epoch,
        out: &mut Vec<EdgeRef<'a>>,
    ) {
        if !pred(&node.aabb) {
            return;
        }
        if node.children.is_none()
            && depth < config.max_split_depth
            && node.edges.len() > config.edge_split_threshold
        {
            node.split();
        }
        if let Some(children) = node.children.as_deref_mut() {
            for child in children {
                Self::descend_edges(child, pred, depth + 1, config, epoch, out);
            }
            return;
        }
        for e in &node.edges {
            if e.tag_once(epoch) {
                out.push(*e);
            }
        }
    }

    fn descend_faces<F: Fn(&Aabb) -> bool>(
        node: &mut Node<'a>,
        pred: &F,
        depth: u32,
        config: &OctreeConfig,
        epoch: Epoch,
        out: &mut Vec<FaceRef<'a>>,
    ) {
        if !pred(&node.aabb) {
            return;
        }
        if node.children.is_none()
            && depth < config.max_split_depth
            && node.faces.len() > config.face_split_threshold
        {
            node.split();
        }
        if let Some(children) = node.children.as_deref_mut() {
            for child in children {
                Self::descend_faces(child, pred, depth + 1, config, epoch, out);
            }
            return;
        }
        for f in &node.faces {
            if f.tag_once(epoch) {
                out.push(*f);
            }
        }
    }

    fn descend_vertices<F: Fn(&Aabb) -> bool>(
        node: &mut Node<'a>,
        pred: &F,
        depth: u32,
        config: &OctreeConfig,
        out: &mut Vec<VertRef<'a>>,
    ) {
        if !pred(&node.aabb) {
            return;
        }
        if node.children.is_none()
            && depth < config.max_split_depth
            && node.vertices.len() > config.point_split_threshold
        {
            node.split();
        }
        if let Some(children) = node.children.as_deref_mut() {
            for child in children {
                Self::descend_vertices(child, pred, depth + 1, config, out);
            }
            return;
        }
        out.extend(node.vertices.iter().copied());
    }

    /// Structural statistics, mainly for diagnostics and tests.
    #[must_use]
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats::default();
        if let Some(root) = self.root.as_deref() {
            Self::collect_stats(root, 0, &mut stats);
        }
        stats
    }

    fn collect_stats(node: &Node<'a>, depth: u32, stats: &mut OctreeStats) {
        stats.max_depth = stats.max_depth.max(depth);
        match node.children.as_deref() {
            Some(children) => {
                stats.internal_count += 1;
                stats.internal_bag_refs +=
                    node.vertices.len() + node.edges.len() + node.faces.len();
                for child in children {
                    Self::collect_stats(child, depth + 1, stats);
                }
            }
            None => {
                stats.leaf_count += 1;
                stats.vertex_refs += node.vertices.len();
                stats.edge_refs += node.edges.len();
                stats.face_refs += node.faces.len();
            }
        }
    }
}

/// Statistics about octree structure.
#[derive(Debug, Default, Clone)]
pub struct OctreeStats {
    /// Number of internal (routing) nodes.
    pub internal_count: usize,
    /// Number of leaf nodes.
    pub leaf_count: usize,
    /// Maximum node depth (root = 0).
    pub max_depth: u32,
    /// Vertex handles across all leaf bags.
    pub vertex_refs: usize,
    /// Edge handles across all leaf bags.
    pub edge_refs: usize,
    /// Face handles across all leaf bags (a straddling face counts once
    /// per leaf holding it).
    pub face_refs: usize,
    /// Geometry handles still sitting on internal nodes; zero whenever
    /// inserts precede the first query.
    pub internal_bag_refs: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::poly::Polyhedron;
    use nalgebra::Vector3;

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

    /// `n` disjoint small quads stacked inside [0.1, 0.2]^3.
    fn quad_cluster(n: usize) -> Polyhedron {
        let mut positions = Vec::new();
        let mut loops = Vec::new();
        for i in 0..n {
            let z = 0.1 + 0.1 * (i as f64 + 0.5) / n as f64;
            let base = positions.len() as u32;
            positions.push(Point3::new(0.1, 0.1, z));
            positions.push(Point3::new(0.2, 0.1, z));
            positions.push(Point3::new(0.2, 0.2, z));
            positions.push(Point3::new(0.1, 0.2, z));
            loops.push(vec![base, base + 1, base + 2, base + 3]);
        }
        Polyhedron::build(positions, loops).unwrap()
    }

    fn unit_root_tree<'a>(config: OctreeConfig) -> Octree<'a> {
        let mut tree = Octree::new(config);
        tree.set_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        tree
    }

    #[test]
    fn query_before_set_bounds_is_empty() {
        let poly = cube();
        let mut tree = Octree::default();
        let mut out = Vec::new();
        tree.find_faces_near_segment(
            &Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            &mut out,
        );
        assert!(out.is_empty());

        // Adds without bounds are dropped, not buffered.
        tree.add_faces(poly.faces());
        tree.set_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(2.0, 2.0, 2.0));
        tree.find_faces_near_segment(
            &Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn single_face_found_once_by_crossing_segment() {
        let poly = quad_cluster(1);
        let mut tree = unit_root_tree(OctreeConfig::default());
        tree.add_faces(poly.faces());

        let mut out = Vec::new();
        tree.find_faces_near_segment(
            &Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            &mut out,
        );
        assert_eq!(out, vec![poly.face(0)]);
    }

    #[test]
    fn disjoint_segment_finds_nothing_after_subdivision() {
        let poly = quad_cluster(1);
        let mut tree = unit_root_tree(OctreeConfig::default().with_face_split_threshold(0));
        tree.add_faces(poly.faces());

        let mut out = Vec::new();
        tree.find_faces_near_segment(
            &Segment::new(
                Point3::new(-0.9, -0.9, -0.9),
                Point3::new(-0.8, -0.8, -0.8),
            ),
            &mut out,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn threshold_crossing_query_splits_leaf() {
        let threshold = 4;
        let poly = quad_cluster(threshold + 1);
        let mut tree = unit_root_tree(
            OctreeConfig::default()
                .with_face_split_threshold(threshold)
                .with_max_split_depth(1),
        );
        tree.add_faces(poly.faces());

        let before = tree.stats();
        assert_eq!(before.leaf_count, 1);
        assert_eq!(before.face_refs, threshold + 1);

        let mut out = Vec::new();
        tree.find_faces_near_segment(
            &Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            &mut out,
        );
        assert_eq!(out.len(), threshold + 1);

        let after = tree.stats();
        assert_eq!(after.internal_count, 1);
        assert_eq!(after.leaf_count, 8);
        // The old leaf handed everything down; the cluster fits one octant.
        assert_eq!(after.internal_bag_refs, 0);
        assert_eq!(after.face_refs, threshold + 1);
    }

    #[test]
    fn straddling_face_reported_once() {
        // One quad spanning all four xy-octants around the centre.
        let poly = Polyhedron::build(
            vec![
                Point3::new(-0.5, -0.5, 0.1),
                Point3::new(0.5, -0.5, 0.1),
                Point3::new(0.5, 0.5, 0.1),
                Point3::new(-0.5, 0.5, 0.1),
            ],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap();

        let mut tree = unit_root_tree(
            OctreeConfig::default()
                .with_face_split_threshold(0)
                .with_max_split_depth(1),
        );
        tree.add_faces(poly.faces());

        let mut out = Vec::new();
        tree.find_faces_near_segment(
            &Segment::new(Point3::new(0.0, 0.0, -1.0), Point3::new(0.0, 0.0, 1.0)),
            &mut out,
        );
        assert_eq!(out, vec![poly.face(0)]);

        // The face really is registered in several leaves.
        assert!(tree.stats().face_refs >= 4);
    }

    #[test]
    fn repeated_queries_get_fresh_epochs() {
        let poly = quad_cluster(1);
        let mut tree = unit_root_tree(OctreeConfig::default());
        tree.add_faces(poly.faces());

        let segment = Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        for _ in 0..3 {
            let mut out = Vec::new();
            tree.find_faces_near_segment(&segment, &mut out);
            assert_eq!(out.len(), 1);
        }
    }

    #[test]
    fn edges_near_segment_and_point() {
        let poly = cube();
        let mut tree = Octree::default();
        tree.set_bounds_aabb(&poly.aabb());
        tree.add_edges(poly.edges());

        let mut near_all = Vec::new();
        tree.find_edges_near_segment(
            &Segment::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(2.0, 2.0, 2.0)),
            &mut near_all,
        );
        assert_eq!(near_all.len(), 12);

        let mut near_corner = Vec::new();
        tree.find_edges_near_point(&Point3::new(0.0, 0.0, 0.0), &mut near_corner);
        assert_eq!(near_corner.len(), 12); // unsplit root: whole bag

        // No duplicates in either result.
        let mut seen = near_all.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), near_all.len());
    }

    #[test]
    fn edge_query_by_edge_includes_itself() {
        let poly = cube();
        let mut tree = Octree::default();
        tree.set_bounds_aabb(&poly.aabb());
        tree.add_edges(poly.edges());

        let probe = poly.edge(3);
        let mut out = Vec::new();
        tree.find_edges_near_edge(probe, &mut out);
        assert!(out.contains(&probe));
    }

    #[test]
    fn vertex_query_allows_duplicates() {
        let poly = Polyhedron::build(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.3, 0.0, 0.0),
                Point3::new(0.0, 0.3, 0.0),
            ],
            vec![vec![0, 1, 2]],
        )
        .unwrap();

        let mut tree = unit_root_tree(
            OctreeConfig::default()
                .with_point_split_threshold(0)
                .with_max_split_depth(1),
        );
        tree.add_vertices(poly.vertices());

        // The origin vertex sits on the shared corner of all eight
        // octants, so after the forced split it registers in every slack
        // box and is reported once per containing leaf.
        let mut out = Vec::new();
        tree.find_vertices_near_allow_dupes(&Point3::new(0.0, 0.0, 0.0), &mut out);
        let origin_hits = out.iter().filter(|v| **v == poly.vertex(0)).count();
        assert!(origin_hits > 1);
    }

    #[test]
    fn completeness_for_segment_face_query() {
        // A sheet of quads; every face whose box meets the probe segment
        // must be reported, however deep the tree subdivides.
        let mut positions = Vec::new();
        let mut loops = Vec::new();
        for ix in 0..6 {
            for iy in 0..6 {
                let x = -0.9 + 0.3 * f64::from(ix);
                let y = -0.9 + 0.3 * f64::from(iy);
                let base = positions.len() as u32;
                positions.push(Point3::new(x, y, 0.0));
                positions.push(Point3::new(x + 0.28, y, 0.0));
                positions.push(Point3::new(x + 0.28, y + 0.28, 0.0));
                positions.push(Point3::new(x, y + 0.28, 0.0));
                loops.push(vec![base, base + 1, base + 2, base + 3]);
            }
        }
        let sheet = Polyhedron::build(positions, loops).unwrap();

        let mut tree = unit_root_tree(
            OctreeConfig::default()
                .with_face_split_threshold(2)
                .with_max_split_depth(4),
        );
        tree.add_faces(sheet.faces());

        let probe = Segment::new(Point3::new(-1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let mut out = Vec::new();
        tree.find_faces_near_segment(&probe, &mut out);

        for f in sheet.faces() {
            if f.aabb().intersects_segment(&probe) {
                assert!(out.contains(&f), "face {} missing", f.index());
            }
        }

        // Dedup also held under heavy subdivision.
        let mut seen = out.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), out.len());
        assert_eq!(tree.stats().internal_bag_refs, 0);
    }

    #[test]
    fn saturated_leaf_accepts_large_bag() {
        let poly = quad_cluster(10);
        let mut tree = unit_root_tree(
            OctreeConfig::default()
                .with_face_split_threshold(1)
                .with_max_split_depth(0),
        );
        tree.add_faces(poly.faces());

        let mut out = Vec::new();
        tree.find_faces_near_segment(
            &Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            &mut out,
        );
        assert_eq!(out.len(), 10);
        assert_eq!(tree.stats().leaf_count, 1);
    }

    #[test]
    fn eager_split_tree_defaults_to_noop() {
        let poly = cube();
        let mut tree = Octree::default();
        tree.set_bounds_aabb(&poly.aabb());
        tree.add_faces(poly.faces());

        tree.split_tree();
        assert_eq!(tree.stats().leaf_count, 1);
    }

    #[test]
    fn eager_split_tree_with_depth_subdivides() {
        let poly = cube();
        let mut tree = Octree::new(OctreeConfig::default().with_eager_split_depth(2));
        tree.set_bounds_aabb(&poly.aabb());
        tree.add_faces(poly.faces());

        tree.split_tree();
        let stats = tree.stats();
        assert!(stats.internal_count >= 1);
        assert_eq!(stats.internal_bag_refs, 0);
    }

    #[test]
    fn set_bounds_discards_previous_tree() {
        let poly = cube();
        let mut tree = Octree::default();
        tree.set_bounds_aabb(&poly.aabb());
        tree.add_faces(poly.faces());
        assert_eq!(tree.stats().face_refs, 6);

        tree.set_bounds(Point3::new(-2.0, -2.0, -2.0), Point3::new(2.0, 2.0, 2.0));
        assert_eq!(tree.stats().face_refs, 0);
    }

    #[test]
    fn plane_front_predicates_tolerate_small_overlap() {
        let poly = cube();
        // Cube spans z in [0, 1].
        let slightly_above = Plane::new(Vector3::z(), -0.005);
        let well_above = Plane::new(Vector3::z(), -0.02);

        let bottom = poly.face(0);
        assert!(face_in_front_of_plane(&slightly_above, bottom));
        assert!(!face_in_front_of_plane(&well_above, bottom));

        let bottom_edge = bottom
            .edges()
            .next()
            .unwrap();
        assert!(edge_in_front_of_plane(&slightly_above, bottom_edge));
        assert!(!edge_in_front_of_plane(&well_above, bottom_edge));

        let below = Plane::new(Vector3::z(), 0.5);
        assert!(face_in_front_of_plane(&below, poly.face(1)));
    }
}
