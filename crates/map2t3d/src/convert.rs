//! Conversion pipeline: scan, mesh, emit.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use brush_mesh::{mesh_brushes, MeshError};
use log::{info, warn};

use crate::config::{ConvertConfig, ConvertOptions};
use crate::parser::{parse_map, SourceBrush};
use crate::t3d::BatchedWriter;
use crate::Result;

/// A brush that was left out of the output because it could not be meshed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSource {
    /// Line of the brush's opening brace in the input.
    pub line: usize,
    pub entity: usize,
    pub error: MeshError,
}

/// What a conversion run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertSummary {
    pub entities: usize,
    pub brushes_read: usize,
    pub detail_filtered: usize,
    /// Brushes written to the output as actors.
    pub brushes_written: usize,
    /// Brushes that were meshed but produced no faces.
    pub empty_brushes: usize,
    pub faces: usize,
    pub skipped: Vec<SkippedSource>,
    pub streams: usize,
}

/// Converts map text into T3D documents written to streams from `open`.
///
/// `open` is called with the 0-based stream number each time a new output
/// document starts; see [`BatchedWriter`].
pub fn convert_text<W, F>(
    text: &str,
    map_name: &str,
    options: &ConvertOptions,
    open: F,
) -> Result<ConvertSummary>
where
    W: Write,
    F: FnMut(usize) -> io::Result<W>,
{
    let map = parse_map(text)?;
    let brushes_read = map.brushes.len();

    let (kept, filtered): (Vec<SourceBrush>, Vec<SourceBrush>) = map
        .brushes
        .into_iter()
        .partition(|source| !(options.skip_detail && source.brush.is_detail()));
    if !filtered.is_empty() {
        info!("leaving out {} detail brushes", filtered.len());
    }

    let report = mesh_brushes(kept.iter().map(|source| &source.brush), &options.mesh)?;

    let skipped: Vec<SkippedSource> = report
        .skipped
        .iter()
        .map(|skip| {
            let source = &kept[skip.index];
            SkippedSource {
                line: source.line,
                entity: source.entity,
                error: skip.error.clone(),
            }
        })
        .collect();
    for skip in &skipped {
        warn!(
            "brush at line {} (entity {}) skipped: {}",
            skip.line, skip.entity, skip.error
        );
    }

    // Brushes without faces contribute no geometry and get no actor
    let meshes: Vec<_> = report
        .meshes
        .iter()
        .map(|(_, mesh)| mesh)
        .filter(|mesh| !mesh.is_empty())
        .collect();

    let mut writer = BatchedWriter::new(map_name, options.mirror, options.brushes_per_file, open);
    for (actor, mesh) in meshes.iter().enumerate() {
        writer.write_brush(actor, mesh)?;
    }
    let streams = writer.finish()?;

    Ok(ConvertSummary {
        entities: map.entity_count,
        brushes_read,
        detail_filtered: filtered.len(),
        brushes_written: meshes.len(),
        empty_brushes: report.empty_count(),
        faces: report.face_count(),
        skipped,
        streams,
    })
}

/// Converts the input file named by `config` into one or more T3D files.
///
/// Returns the summary and the paths of the files written.
pub fn convert_file(config: &ConvertConfig) -> Result<(ConvertSummary, Vec<PathBuf>)> {
    let text = fs::read_to_string(&config.input)?;
    let map_name = config.map_name();
    info!(
        "converting {} -> {} (map '{}')",
        config.input.display(),
        config.output.display(),
        map_name
    );

    let mut paths = Vec::new();
    let summary = convert_text(&text, &map_name, &config.options, |n| {
        let path = config.output_path(n);
        let file = File::create(&path)?;
        paths.push(path);
        Ok(BufWriter::new(file))
    })?;

    Ok((summary, paths))
}
