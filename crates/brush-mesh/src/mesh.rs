//! Brush meshing: vertex enumeration followed by face assembly.

use log::trace;
use nalgebra::Point3;

use crate::face::assemble_faces;
use crate::vertex::{enumerate_vertices_with_stats, VertexStats};
use crate::{Brush, Face, MeshConfig, MeshError, Result};

/// Diagnostic counters for one meshed brush.
///
/// None of these are errors: parallel plane triples and planes that only
/// touch the solid at a point or an edge are normal in level geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Plane triples skipped as parallel or coincident.
    pub singular_triples: usize,
    /// Intersection points rejected as outside the brush.
    pub outside_points: usize,
    /// Intersection points merged into an existing vertex.
    pub merged_points: usize,
    /// Planes with fewer than three incident vertices.
    pub dropped_faces: usize,
}

/// The boundary representation of a brush.
///
/// Holds exactly one face slot per input plane; a slot is `None` when the
/// plane contributes no polygon. Faces index into [`BrushMesh::vertices`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrushMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Option<Face>>,
    stats: MeshStats,
}

impl BrushMesh {
    /// Returns the deduplicated vertex set.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Returns one optional face per input plane, in plane order.
    #[inline]
    pub fn face_slots(&self) -> &[Option<Face>] {
        &self.faces
    }

    /// Iterates the faces that are present, in plane order.
    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.iter().flatten()
    }

    /// Returns the number of faces that are present.
    pub fn face_count(&self) -> usize {
        self.faces().count()
    }

    /// Returns `true` if the mesh has no faces.
    pub fn is_empty(&self) -> bool {
        self.face_count() == 0
    }

    /// Returns the face's vertices as points, in winding order.
    pub fn face_points<'a>(
        &'a self,
        face: &'a Face,
    ) -> impl ExactSizeIterator<Item = Point3<f64>> + 'a {
        face.points(&self.vertices)
    }

    #[inline]
    pub fn stats(&self) -> MeshStats {
        self.stats
    }
}

/// Meshes a single brush.
///
/// The result is deterministic: meshing the same brush twice yields
/// bit-identical vertices and windings.
///
/// # Errors
/// - [`MeshError::ResourceLimitExceeded`] if the brush has more than
///   `config.max_planes` planes.
/// - [`MeshError::DegenerateNormal`] if a plane with a near-zero normal has
///   incident vertices.
pub fn mesh_brush(brush: &Brush, config: &MeshConfig) -> Result<BrushMesh> {
    if brush.len() > config.max_planes {
        return Err(MeshError::ResourceLimitExceeded {
            planes: brush.len(),
            limit: config.max_planes,
        });
    }

    let (vertices, vertex_stats) = enumerate_vertices_with_stats(brush, config);
    let faces = assemble_faces(brush, &vertices, config)?;

    let stats = stats_from(vertex_stats, &faces);
    trace!(
        "meshed brush: {} planes, {} vertices, {} faces ({:?})",
        brush.len(),
        vertices.len(),
        faces.len() - stats.dropped_faces,
        stats
    );

    Ok(BrushMesh {
        vertices,
        faces,
        stats,
    })
}

fn stats_from(vertex_stats: VertexStats, faces: &[Option<Face>]) -> MeshStats {
    MeshStats {
        singular_triples: vertex_stats.singular_triples,
        outside_points: vertex_stats.outside,
        merged_points: vertex_stats.merged,
        dropped_faces: faces.iter().filter(|f| f.is_none()).count(),
    }
}
