//! Error types for brush meshing.

use nalgebra::Vector3;
use thiserror::Error;

/// Result type for meshing operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while meshing a brush.
///
/// Singular plane triples and faces with fewer than three incident vertices
/// are expected outcomes, not errors; they are counted in
/// [`MeshStats`](crate::MeshStats) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A plane normal of (near) zero length reached frame construction.
    /// Fatal for the brush that owns the plane only.
    #[error("degenerate plane normal ({}, {}, {})", normal.x, normal.y, normal.z)]
    DegenerateNormal { normal: Vector3<f64> },

    /// The brush has more planes than the configured ceiling.
    /// Fatal for the whole run.
    #[error("brush has {planes} planes, limit is {limit}")]
    ResourceLimitExceeded { planes: usize, limit: usize },
}

impl MeshError {
    /// Returns `true` if the error only invalidates the brush that raised it.
    pub fn is_per_brush(&self) -> bool {
        matches!(self, MeshError::DegenerateNormal { .. })
    }
}
