//! Planes and line segments.
//!
//! Small geometric value types shared by the octree predicates and the
//! polyhedron face data: an infinite oriented [`Plane`] in Hessian normal
//! form and a finite [`Segment`] between two points.

use nalgebra::{Point3, Vector3};

/// A line segment between two points.
///
/// Used as the query volume for edge and face proximity searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point.
    pub a: Point3<f64>,
    /// End point.
    pub b: Point3<f64>,
}

impl Segment {
    /// Create a segment from its endpoints.
    #[inline]
    #[must_use]
    pub const fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self { a, b }
    }

    /// Length of the segment.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.b - self.a).norm()
    }

    /// Midpoint of the segment.
    #[inline]
    #[must_use]
    pub fn midpoint(&self) -> Point3<f64> {
        Point3::new(
            (self.a.x + self.b.x) * 0.5,
            (self.a.y + self.b.y) * 0.5,
            (self.a.z + self.b.z) * 0.5,
        )
    }
}

/// An oriented plane `n · x + offset = 0` with unit normal `n`.
///
/// Points with positive [`signed_distance`](Plane::signed_distance) lie on
/// the side the normal points into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Signed offset from the origin along the normal.
    pub offset: f64,
}

impl Plane {
    /// Create a plane from a unit normal and offset.
    ///
    /// The normal is assumed to already be unit length.
    #[inline]
    #[must_use]
    pub const fn new(normal: Vector3<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Create a plane through `point` with the given unit normal.
    #[inline]
    #[must_use]
    pub fn from_point_normal(point: &Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            normal,
            offset: -normal.dot(&point.coords),
        }
    }

    /// Fit a plane to a closed polygon loop using Newell's method.
    ///
    /// The winding of the loop determines the normal direction
    /// (counter-clockwise seen from the front). Returns `None` when the
    /// loop is degenerate (collinear or coincident points).
    #[must_use]
    pub fn from_loop(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let mut normal = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
            centroid += p.coords;
        }

        let len = normal.norm();
        if len < 1e-12 {
            return None;
        }
        normal /= len;
        centroid /= points.len() as f64;

        Some(Self {
            normal,
            offset: -normal.dot(&centroid),
        })
    }

    /// Signed distance from `point` to the plane.
    ///
    /// Positive on the side the normal points into, negative behind.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.offset
    }
}
