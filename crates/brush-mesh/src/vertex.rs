//! Brush vertex enumeration by triple-plane intersection.
//!
//! Every unordered triple of planes is intersected. A candidate point is kept
//! when it lies inside the whole brush and is not a duplicate of a point
//! found earlier. This is O(n³) intersections with an O(n) containment test
//! each, which is fine for the plane counts found in level brushes.

use log::trace;
use nalgebra::{Matrix3, Point3, Vector3};

use crate::{Brush, MeshConfig, Plane};

/// Minimum number of planes that can bound a solid.
pub const MIN_SOLID_PLANES: usize = 4;

/// Counters collected while enumerating vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexStats {
    /// Triples skipped because their planes are parallel or coincident.
    pub singular_triples: usize,
    /// Intersection points rejected because they lie outside the brush.
    pub outside: usize,
    /// Intersection points merged into an already accepted vertex.
    pub merged: usize,
}

/// Intersects three planes using Cramer's rule.
///
/// Returns `None` if the determinant of the normal matrix has a magnitude
/// below `singular_epsilon` (two or more planes are parallel, or the three
/// share a line).
pub fn intersect_three_planes(
    a: &Plane,
    b: &Plane,
    c: &Plane,
    singular_epsilon: f64,
) -> Option<Point3<f64>> {
    let normals = Matrix3::from_rows(&[
        a.normal().transpose(),
        b.normal().transpose(),
        c.normal().transpose(),
    ]);
    let det = normals.determinant();
    if !(det.abs() >= singular_epsilon) {
        return None;
    }

    let offsets = Vector3::new(a.offset(), b.offset(), c.offset());
    let mut solution = Vector3::zeros();
    for axis in 0..3 {
        let mut replaced = normals;
        replaced.set_column(axis, &offsets);
        solution[axis] = replaced.determinant() / det;
    }

    Some(Point3::from(solution))
}

/// Returns `true` if `point` is within `weld_distance` of any point in `accepted`.
fn is_duplicate(accepted: &[Point3<f64>], point: &Point3<f64>, weld_distance: f64) -> bool {
    accepted
        .iter()
        .any(|existing| nalgebra::distance(existing, point) < weld_distance)
}

/// Enumerates the vertices of a convex brush.
///
/// Triples are visited in lexicographic index order, so the output order is
/// deterministic and the first point found wins when two candidates merge.
/// Fewer than [`MIN_SOLID_PLANES`] half-spaces cannot enclose a volume, so
/// such brushes produce no vertices.
pub fn enumerate_vertices(brush: &Brush, config: &MeshConfig) -> Vec<Point3<f64>> {
    enumerate_vertices_with_stats(brush, config).0
}

/// Same as [`enumerate_vertices`], also returning diagnostic counters.
pub fn enumerate_vertices_with_stats(
    brush: &Brush,
    config: &MeshConfig,
) -> (Vec<Point3<f64>>, VertexStats) {
    let planes = brush.planes();
    let n = planes.len();
    let mut vertices = Vec::new();
    let mut stats = VertexStats::default();

    if n < MIN_SOLID_PLANES {
        return (vertices, stats);
    }

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let Some(point) = intersect_three_planes(
                    &planes[i],
                    &planes[j],
                    &planes[k],
                    config.singular_epsilon,
                ) else {
                    stats.singular_triples += 1;
                    continue;
                };

                if !brush.contains_point(&point, config.plane_epsilon) {
                    stats.outside += 1;
                    continue;
                }

                if is_duplicate(&vertices, &point, config.weld_distance) {
                    stats.merged += 1;
                    continue;
                }

                trace!("vertex {} from planes ({}, {}, {})", vertices.len(), i, j, k);
                vertices.push(point);
            }
        }
    }

    (vertices, stats)
}
