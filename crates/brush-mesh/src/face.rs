//! Face assembly: incident vertex selection and angular winding.

use std::cmp::Ordering;

use nalgebra::{Point3, Vector3};

use crate::frame::tangent_binormal;
use crate::{Brush, MeshConfig, Plane, Result};

/// A convex face of a brush mesh.
///
/// The face stores indices into the vertex list of the owning
/// [`BrushMesh`](crate::BrushMesh) rather than copies of the points.
///
/// Vertices are ordered clockwise when viewed from outside the solid
/// (looking against the plane normal).
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    plane_index: usize,
    plane: Plane,
    indices: Vec<usize>,
}

impl Face {
    /// Creates a face from its source plane and ordered vertex indices.
    ///
    /// # Panics (debug builds only)
    /// Panics if fewer than 3 indices are provided.
    pub fn new(plane_index: usize, plane: Plane, indices: Vec<usize>) -> Self {
        debug_assert!(indices.len() >= 3, "Face must have at least 3 vertices");
        Self {
            plane_index,
            plane,
            indices,
        }
    }

    /// Index of the brush plane this face lies on.
    #[inline]
    pub fn plane_index(&self) -> usize {
        self.plane_index
    }

    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the ordered vertex indices.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the face has no vertices (always false for assembled faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resolves the face's vertices against the vertex list they index into.
    pub fn points<'a>(
        &'a self,
        vertices: &'a [Point3<f64>],
    ) -> impl ExactSizeIterator<Item = Point3<f64>> + 'a {
        self.indices.iter().map(move |&i| vertices[i])
    }
}

fn centroid(points: impl ExactSizeIterator<Item = Point3<f64>>) -> Point3<f64> {
    let count = points.len() as f64;
    let sum: Vector3<f64> = points.map(|p| p.coords).sum();
    Point3::from(sum / count)
}

/// Orders angles numerically; `-0.0` and `+0.0` compare equal.
fn compare_angles(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Builds the face lying on `brush.planes()[plane_index]`, if any.
///
/// Returns `Ok(None)` when fewer than three vertices touch the plane: the
/// plane then bounds the solid only at a point or an edge, or not at all.
pub fn assemble_face(
    brush: &Brush,
    plane_index: usize,
    vertices: &[Point3<f64>],
    config: &MeshConfig,
) -> Result<Option<Face>> {
    let plane = brush.planes()[plane_index];

    let incident: Vec<usize> = vertices
        .iter()
        .enumerate()
        .filter(|(_, v)| plane.signed_distance(v).abs() < config.plane_epsilon)
        .map(|(i, _)| i)
        .collect();

    if incident.len() < 3 {
        return Ok(None);
    }

    let center = centroid(incident.iter().map(|&i| vertices[i]));
    let frame = tangent_binormal(&plane.normal())?;

    // Angle from the binormal towards the tangent. Since binormal × tangent
    // is the inward normal, ascending angles run clockwise seen from outside.
    let mut by_angle: Vec<(usize, f64)> = incident
        .into_iter()
        .map(|i| {
            let local = vertices[i] - center;
            let x = local.dot(&frame.binormal);
            let y = local.dot(&frame.tangent);
            (i, y.atan2(x))
        })
        .collect();

    // Stable: equal angles keep enumeration order
    by_angle.sort_by(|a, b| compare_angles(a.1, b.1));

    let indices = by_angle.into_iter().map(|(i, _)| i).collect();
    Ok(Some(Face::new(plane_index, plane, indices)))
}

/// Assembles one optional face per brush plane, in plane order.
///
/// Fails with [`MeshError::DegenerateNormal`](crate::MeshError::DegenerateNormal)
/// if a plane with a near-zero normal has incident vertices.
pub fn assemble_faces(
    brush: &Brush,
    vertices: &[Point3<f64>],
    config: &MeshConfig,
) -> Result<Vec<Option<Face>>> {
    (0..brush.len())
        .map(|plane_index| assemble_face(brush, plane_index, vertices, config))
        .collect()
}
