//! Tangent/binormal frame construction for flattening face vertices.

use nalgebra::Vector3;

use crate::plane::DEGENERATE_NORMAL_LENGTH;
use crate::{MeshError, Result};

/// Seeds whose projection onto the normal is at most this are used unchanged.
const PROJECTION_EPSILON: f64 = 0.01;

/// Orthonormal 2D basis lying in the plane perpendicular to a normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vector3<f64>,
    pub binormal: Vector3<f64>,
}

/// Builds a tangent/binormal frame for a unit normal.
///
/// The result depends on the normal alone. The seed vector copies the
/// normal, then its smallest-magnitude component is set to 1 and its
/// largest-magnitude component to 0, so it can never be parallel to the
/// normal. With the returned frame, `(tangent, binormal, normal)` is
/// right-handed.
///
/// Fails with [`MeshError::DegenerateNormal`] if the normal has near-zero
/// length or is not finite.
pub fn tangent_binormal(normal: &Vector3<f64>) -> Result<Frame> {
    let length = normal.norm();
    if !(length.is_finite() && length >= DEGENERATE_NORMAL_LENGTH) {
        return Err(MeshError::DegenerateNormal { normal: *normal });
    }

    let mut seed = *normal;
    let mut max_idx = 0;
    let mut min_idx = 0;
    for i in 1..3 {
        if seed[i].abs() > seed[max_idx].abs() {
            max_idx = i;
        } else if seed[i].abs() < seed[min_idx].abs() {
            min_idx = i;
        }
    }
    seed[min_idx] = 1.0;
    seed[max_idx] = 0.0;

    let projection = seed.dot(normal);
    let binormal = if projection.abs() > PROJECTION_EPSILON {
        (seed - normal * projection).normalize()
    } else {
        seed
    };

    let tangent = binormal.cross(normal).normalize();
    let binormal = normal.cross(&tangent).normalize();

    Ok(Frame { tangent, binormal })
}
