//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

use crate::geom::Segment;

/// An axis-aligned bounding box (AABB).
///
/// Defined by minimum and maximum corner points. The octree enlarges each
/// node's box slightly (see [`SLACK_FACTOR`](crate::octree::SLACK_FACTOR))
/// so that primitives sitting exactly on a cell boundary are comfortably
/// inside at least one cell despite floating-point roundoff.
///
/// # Example
///
/// ```
/// use csg_core::Aabb;
/// use nalgebra::Point3;
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// );
///
/// assert!(aabb.contains(&Point3::new(5.0, 5.0, 5.0)));
/// assert!(!aabb.contains(&Point3::new(11.0, 5.0, 5.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f64>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a new AABB from minimum and maximum corners.
    ///
    /// The corners are swapped per-axis if min > max.
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Create an AABB from its centre and half-extent along each axis.
    #[must_use]
    pub fn from_center_half_extent(center: Point3<f64>, half: Vector3<f64>) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Create an empty (inverted) AABB, useful as a fold seed.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create an AABB enclosing an iterator of points.
    ///
    /// Returns an empty AABB if the iterator is empty.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to_include(point);
        }
        aabb
    }

    /// Check if the AABB has no valid volume (min > max on some axis).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Centre of the AABB.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Size (dimensions) of the AABB.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Half-extent along each axis.
    #[inline]
    #[must_use]
    pub fn half_extent(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    /// Grow the AABB in place to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Return a copy scaled by `factor` about the centre.
    ///
    /// # Example
    ///
    /// ```
    /// use csg_core::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// let grown = aabb.scaled(1.1);
    /// assert!((grown.min.x - (-1.1)).abs() < 1e-12);
    /// assert!((grown.max.x - 1.1).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let half = self.half_extent() * factor;
        Self::from_center_half_extent(self.center(), half)
    }

    /// Check if the AABB contains a point. Boundary points count as inside.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this AABB intersects another. Touching boxes intersect.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Check if a line segment passes through the AABB.
    ///
    /// Slab clipping: the parameter interval `[0, 1]` along the segment is
    /// clipped against each axis-aligned slab; the segment intersects iff
    /// the interval stays non-empty.
    #[must_use]
    pub fn intersects_segment(&self, segment: &Segment) -> bool {
        let dir = segment.b - segment.a;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;

        for axis in 0..3 {
            let origin = segment.a[axis];
            let d = dir[axis];
            if d.abs() < f64::EPSILON {
                // Parallel to the slab: inside or out for the whole segment.
                if origin < self.min[axis] || origin > self.max[axis] {
                    return false;
                }
            } else {
                let inv = 1.0 / d;
                let mut near = (self.min[axis] - origin) * inv;
                let mut far = (self.max[axis] - origin) * inv;
                if near > far {
                    std::mem::swap(&mut near, &mut far);
                }
                t0 = t0.max(near);
                t1 = t1.min(far);
                if t0 > t1 {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
