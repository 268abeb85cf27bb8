//! Oriented plane (half-space boundary) representation.

use nalgebra::{Point3, Vector3};

/// Default tolerance for containment and incidence tests.
/// Points within this distance of a plane are considered "on" the plane.
pub const PLANE_EPSILON: f64 = 0.01;

/// Normals shorter than this cannot be turned into a tangent frame.
pub const DEGENERATE_NORMAL_LENGTH: f64 = 1e-6;

/// A plane in 3D space, represented as `normal · point = offset`.
///
/// Normals of brush planes point out of the solid: a point is inside the
/// half-space when its signed distance is at most the tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3<f64>,
    offset: f64,
}

impl Plane {
    /// Creates a plane from a normal vector and offset, taken as given.
    ///
    /// The caller is expected to supply a unit normal.
    pub fn new(normal: Vector3<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Creates a plane from three points as written in a `.map` brush face.
    ///
    /// The normal is `(p1 - p2) × (p3 - p2)`, which points out of the brush
    /// for faces written in the usual clockwise order.
    ///
    /// Collinear points yield a zero normal that is kept as is; meshing the
    /// owning brush then fails with
    /// [`MeshError::DegenerateNormal`](crate::MeshError::DegenerateNormal).
    pub fn from_three_points(p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>) -> Self {
        let normal = (p1 - p2).cross(&(p3 - p2));
        let norm = normal.norm();
        let normal = if norm > f64::EPSILON {
            normal / norm
        } else {
            normal
        };
        Self {
            normal,
            offset: normal.dot(&p1.coords),
        }
    }

    /// Returns the normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Returns `true` if the normal is too short (or not finite) to orient the plane.
    pub fn is_degenerate(&self) -> bool {
        let norm = self.normal.norm();
        !(norm.is_finite() && norm >= DEGENERATE_NORMAL_LENGTH)
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (outside)
    /// - Negative: point is behind (inside)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Returns `true` if the point is behind or on the plane, within `epsilon`.
    #[inline]
    pub fn contains(&self, point: &Point3<f64>, epsilon: f64) -> bool {
        self.signed_distance(point) <= epsilon
    }

    /// Returns `true` if both planes bound the same half-space, comparing
    /// normals component-wise and offsets within `epsilon`.
    pub fn coincides(&self, other: &Plane, epsilon: f64) -> bool {
        (self.offset - other.offset).abs() <= epsilon
            && (self.normal - other.normal).amax() <= epsilon
    }
}
