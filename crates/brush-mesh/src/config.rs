//! Tolerances and limits for brush meshing.

use crate::PLANE_EPSILON;

/// Default ceiling on the number of planes in one brush.
pub const DEFAULT_MAX_PLANES: usize = 128;

/// Tuning knobs for [`mesh_brush`](crate::mesh_brush).
///
/// The defaults match the units of Quake-style level files, where one unit
/// is roughly an inch and coordinates are usually integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// Plane triples whose normal matrix has a determinant below this
    /// magnitude are treated as parallel and skipped.
    pub singular_epsilon: f64,
    /// Tolerance of the containment predicate and of face incidence.
    pub plane_epsilon: f64,
    /// Candidate vertices closer than this to an accepted vertex are merged into it.
    pub weld_distance: f64,
    /// Brushes with more planes fail with
    /// [`MeshError::ResourceLimitExceeded`](crate::MeshError::ResourceLimitExceeded).
    pub max_planes: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            singular_epsilon: 1e-3,
            plane_epsilon: PLANE_EPSILON,
            weld_distance: 0.01,
            max_planes: DEFAULT_MAX_PLANES,
        }
    }
}

impl MeshConfig {
    /// Returns the configuration with a different plane ceiling.
    pub fn with_max_planes(mut self, max_planes: usize) -> Self {
        self.max_planes = max_planes;
        self
    }
}
