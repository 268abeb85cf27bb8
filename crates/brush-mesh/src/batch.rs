//! Meshing many brushes with per-brush failure isolation.

use log::{debug, warn};

use crate::{mesh_brush, Brush, BrushMesh, MeshConfig, MeshError, Result};

/// A brush that could not be meshed and was left out of the output.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBrush {
    /// Position of the brush in the input sequence.
    pub index: usize,
    pub error: MeshError,
}

/// Outcome of meshing a sequence of brushes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Successfully meshed brushes with their input positions, in input order.
    /// Includes meshes without faces.
    pub meshes: Vec<(usize, BrushMesh)>,
    /// Brushes skipped because of a per-brush error.
    pub skipped: Vec<SkippedBrush>,
}

impl BatchReport {
    /// Number of meshed brushes that produced no faces.
    pub fn empty_count(&self) -> usize {
        self.meshes.iter().filter(|(_, mesh)| mesh.is_empty()).count()
    }

    /// Total number of faces across all meshes.
    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|(_, mesh)| mesh.face_count()).sum()
    }
}

/// Meshes each brush in turn.
///
/// Brushes are independent: a brush that fails with a per-brush error
/// (see [`MeshError::is_per_brush`]) is recorded in
/// [`BatchReport::skipped`] and processing continues. Any other error stops
/// the run and is returned.
pub fn mesh_brushes<'a, I>(brushes: I, config: &MeshConfig) -> Result<BatchReport>
where
    I: IntoIterator<Item = &'a Brush>,
{
    let mut report = BatchReport::default();

    for (index, brush) in brushes.into_iter().enumerate() {
        match mesh_brush(brush, config) {
            Ok(mesh) => {
                if mesh.is_empty() {
                    debug!("brush {index} has no faces ({:?})", mesh.stats());
                }
                report.meshes.push((index, mesh));
            }
            Err(error) if error.is_per_brush() => {
                warn!("skipping brush {index}: {error}");
                report.skipped.push(SkippedBrush { index, error });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(report)
}
