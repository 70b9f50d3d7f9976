//! Octree tuning knobs.
//!
//! [`OctreeConfig`] carries the depth bound and the per-kind leaf-size
//! thresholds that trigger lazy subdivision during queries, plus the
//! bounds of the optional eager pre-split pass. The defaults suit meshes
//! in the thousands-of-faces range; tests and unusual workloads can dial
//! the thresholds down with the builder methods.
//!
//! # Example
//!
//! ```
//! use csg_core::OctreeConfig;
//!
//! let config = OctreeConfig::default()
//!     .with_max_split_depth(6)
//!     .with_face_split_threshold(16);
//!
//! assert_eq!(config.max_split_depth, 6);
//! assert_eq!(config.face_split_threshold, 16);
//! ```

/// Configuration for [`Octree`](crate::Octree).
#[derive(Debug, Clone)]
pub struct OctreeConfig {
    /// Maximum subdivision depth; leaves at this depth accept any bag
    /// size.
    pub max_split_depth: u32,

    /// Edge-bag size above which a query splits a leaf.
    pub edge_split_threshold: usize,

    /// Face-bag size above which a query splits a leaf.
    pub face_split_threshold: usize,

    /// Vertex-bag size above which a query splits a leaf.
    pub point_split_threshold: usize,

    /// Depth bound of the eager [`split_tree`](crate::Octree::split_tree)
    /// pre-pass. The default of 0 makes the pre-pass a no-op: lazy
    /// subdivision during queries is sufficient on its own.
    pub eager_split_depth: u32,

    /// Minimum edge- or face-bag occupancy for the eager pass to subdivide
    /// a node.
    pub eager_split_min: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_split_depth: 8,
            edge_split_threshold: 50,
            face_split_threshold: 50,
            point_split_threshold: 50,
            eager_split_depth: 0,
            eager_split_min: 5,
        }
    }
}

impl OctreeConfig {
    /// Set the maximum subdivision depth.
    #[must_use]
    pub fn with_max_split_depth(mut self, depth: u32) -> Self {
        self.max_split_depth = depth;
        self
    }

    /// Set the edge-bag split threshold.
    #[must_use]
    pub fn with_edge_split_threshold(mut self, threshold: usize) -> Self {
        self.edge_split_threshold = threshold;
        self
    }

    /// Set the face-bag split threshold.
    #[must_use]
    pub fn with_face_split_threshold(mut self, threshold: usize) -> Self {
        self.face_split_threshold = threshold;
        self
    }

    /// Set the vertex-bag split threshold.
    #[must_use]
    pub fn with_point_split_threshold(mut self, threshold: usize) -> Self {
        self.point_split_threshold = threshold;
        self
    }

    /// Set the eager pre-split depth bound.
    ///
    /// Zero disables the pre-pass entirely.
    #[must_use]
    pub fn with_eager_split_depth(mut self, depth: u32) -> Self {
        self.eager_split_depth = depth;
        self
    }
}
