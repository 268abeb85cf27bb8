//! Convex brush: an ordered intersection of half-spaces.

use log::debug;
use nalgebra::Point3;

use crate::{Plane, PLANE_EPSILON};

/// Metadata carried along with a brush. Irrelevant to the geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrushFlags {
    /// Non-structural brush that may be filtered out by consumers.
    pub detail: bool,
}

/// A convex solid described as the intersection of the half-spaces behind
/// each of its planes.
///
/// Planes are unique: construction drops any plane that coincides with an
/// earlier one within [`PLANE_EPSILON`], so a repeated face yields a single
/// polygon. The order of the remaining planes is preserved, and the index of
/// a plane is the index of the face it produces in a
/// [`BrushMesh`](crate::BrushMesh).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Brush {
    planes: Vec<Plane>,
    flags: BrushFlags,
}

impl Brush {
    /// Creates a structural brush from its planes, keeping the first of any
    /// coincident planes.
    pub fn new(planes: Vec<Plane>) -> Self {
        let mut unique: Vec<Plane> = Vec::with_capacity(planes.len());
        for (index, plane) in planes.into_iter().enumerate() {
            if unique.iter().any(|kept| kept.coincides(&plane, PLANE_EPSILON)) {
                debug!("dropping plane {index}: coincides with an earlier plane");
                continue;
            }
            unique.push(plane);
        }
        Self {
            planes: unique,
            flags: BrushFlags::default(),
        }
    }

    /// Sets the brush metadata.
    pub fn with_flags(mut self, flags: BrushFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the planes of the brush in input order.
    #[inline]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Returns the number of planes.
    #[inline]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// Returns true if the brush has no planes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    #[inline]
    pub fn flags(&self) -> BrushFlags {
        self.flags
    }

    #[inline]
    pub fn is_detail(&self) -> bool {
        self.flags.detail
    }

    /// Containment predicate: the point lies inside or on every plane,
    /// within `epsilon`.
    pub fn contains_point(&self, point: &Point3<f64>, epsilon: f64) -> bool {
        self.planes.iter().all(|plane| plane.contains(point, epsilon))
    }
}

impl FromIterator<Plane> for Brush {
    fn from_iter<I: IntoIterator<Item = Plane>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
