//! Scanner for Quake-style `.map` files.
//!
//! A `.map` file is a list of entity blocks, each holding `"key" "value"`
//! pairs and brush blocks. A brush block lists one face per line as three
//! points followed by texture parameters:
//!
//! ```text
//! {
//! "classname" "worldspawn"
//! {
//! ( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) base/wall 0 0 0 1 1 0 0 0
//! ...
//! }
//! }
//! ```
//!
//! Quake 3 brush primitives (`brushDef { ... }`) are read the same way.
//! Patch and terrain definitions inside an entity are skipped. Only the
//! planes are kept; texture information is ignored.

use brush_mesh::{Brush, BrushFlags, Plane, PLANE_EPSILON};
use log::{debug, warn};
use nalgebra::Point3;

use crate::{ConvertError, Result};

/// Quake 3 content flag marking a brush as detail (non-structural).
pub const CONTENTS_DETAIL: u32 = 0x0800_0000;

/// A brush read from a map file, with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBrush {
    /// Index of the owning entity in file order.
    pub entity: usize,
    /// `classname` of the owning entity, if it was given before the brush.
    pub classname: Option<String>,
    /// 1-based line of the brush's opening brace.
    pub line: usize,
    pub brush: Brush,
}

/// Everything the scanner extracts from a map file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapFile {
    pub brushes: Vec<SourceBrush>,
    pub entity_count: usize,
}

/// Scanner position in the block structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Global,
    Entity,
    Brush,
    /// Inside a `brushDef` block, whose face lines belong to the enclosing
    /// brush; `open` is false until its brace is seen.
    BrushDef { open: bool },
    /// Inside a skipped sub-block; `depth` counts open braces, 0 while
    /// waiting for the block to open.
    SkipBlock { depth: usize },
}

/// Coarse classification of a line with comments removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    Open,
    Close,
    KeyValue(&'a str, &'a str),
    PlaneDef(&'a str),
    BrushDefHeader,
    SkipHeader,
    Other,
}

/// Removes a trailing `//` comment, ignoring slashes inside quotes.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_quotes = false;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'/' if !in_quotes && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split('"');
    // "key" "value" splits into ["", key, " ", value, ""]
    parts.next()?;
    let key = parts.next()?;
    parts.next()?;
    let value = parts.next()?;
    Some((key, value))
}

fn classify_line(raw: &str) -> LineKind<'_> {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
        return LineKind::Blank;
    }

    match line.as_bytes()[0] {
        b'{' => LineKind::Open,
        b'}' => LineKind::Close,
        b'(' => LineKind::PlaneDef(line),
        b'"' => match parse_key_value(line) {
            Some((key, value)) => LineKind::KeyValue(key, value),
            None => LineKind::Other,
        },
        _ => {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("brushdef") {
                LineKind::BrushDefHeader
            } else if lower.starts_with("patchdef") || lower.starts_with("terraindef") {
                LineKind::SkipHeader
            } else {
                LineKind::Other
            }
        }
    }
}

/// Parses one brush face line into its plane and content flags.
///
/// The three points sit at fixed token positions:
/// `( x y z ) ( x y z ) ( x y z ) texture ...`.
fn parse_plane_line(line_no: usize, line: &str) -> Result<(Plane, u32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 15 {
        return Err(ConvertError::parse(
            line_no,
            format!("expected three points, found {} tokens", tokens.len()),
        ));
    }

    let mut points = [Point3::origin(); 3];
    for (p, point) in points.iter_mut().enumerate() {
        let base = p * 5;
        if tokens[base] != "(" || tokens[base + 4] != ")" {
            return Err(ConvertError::parse(
                line_no,
                format!("point {} is not enclosed in parentheses", p + 1),
            ));
        }
        for axis in 0..3 {
            let token = tokens[base + 1 + axis];
            point[axis] = token.parse::<f64>().map_err(|_| {
                ConvertError::parse(line_no, format!("invalid coordinate '{token}'"))
            })?;
        }
    }

    let plane = Plane::from_three_points(points[0], points[1], points[2]);
    Ok((plane, content_flags(&tokens)))
}

/// Reads the Quake 3 content flags that follow the texture name and its five
/// parameters, or in brush primitives the texture matrix and name. Formats
/// without them (Quake, Valve 220) yield 0.
fn content_flags(tokens: &[&str]) -> u32 {
    let position = match (tokens.get(15), tokens.get(16)) {
        (Some(&"("), _) => 28,
        (_, Some(&"[")) => return 0,
        _ => 21,
    };
    tokens
        .get(position)
        .and_then(|t| t.parse::<i64>().ok())
        .map_or(0, |flags| flags as u32)
}

/// Line-driven state machine that collects brushes from a map file.
#[derive(Debug)]
pub struct MapScanner {
    state: ScanState,
    entity_count: usize,
    classname: Option<String>,
    planes: Vec<Plane>,
    flags: BrushFlags,
    brush_line: usize,
    brushes: Vec<SourceBrush>,
    finished: bool,
}

impl Default for MapScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MapScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Global,
            entity_count: 0,
            classname: None,
            planes: Vec::new(),
            flags: BrushFlags::default(),
            brush_line: 0,
            brushes: Vec::new(),
            finished: false,
        }
    }

    /// Feeds one line (1-based `line_no`) to the scanner.
    pub fn feed_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        let kind = classify_line(line);
        self.state = match (self.state, kind) {
            (state, LineKind::Blank) => state,

            (ScanState::Global, LineKind::Open) => {
                self.entity_count += 1;
                self.classname = None;
                ScanState::Entity
            }
            (ScanState::Global, LineKind::Close) => {
                warn!("line {line_no}: unbalanced '}}' at top level, ignoring the rest");
                self.finished = true;
                ScanState::Global
            }
            (ScanState::Global, _) => ScanState::Global,

            (ScanState::Entity, LineKind::Open) => {
                self.planes.clear();
                self.flags = BrushFlags::default();
                self.brush_line = line_no;
                ScanState::Brush
            }
            (ScanState::Entity, LineKind::Close) => ScanState::Global,
            (ScanState::Entity, LineKind::KeyValue(key, value)) => {
                if key == "classname" {
                    self.classname = Some(value.to_string());
                }
                ScanState::Entity
            }
            (ScanState::Entity, _) => ScanState::Entity,

            (ScanState::Brush, LineKind::PlaneDef(def)) => {
                self.add_plane(line_no, def)?;
                ScanState::Brush
            }
            (ScanState::Brush, LineKind::BrushDefHeader) => ScanState::BrushDef { open: false },
            (ScanState::Brush, LineKind::SkipHeader) => {
                debug!("line {line_no}: skipping '{}'", line.trim());
                ScanState::SkipBlock { depth: 0 }
            }
            (ScanState::Brush, LineKind::Close) => {
                self.finish_brush();
                ScanState::Entity
            }
            (ScanState::Brush, LineKind::Open) => {
                return Err(ConvertError::parse(
                    line_no,
                    "unexpected '{' inside a brush \
                     (expected brushDef, patchDef or terrainDef before a nested block)",
                ));
            }
            (ScanState::Brush, _) => ScanState::Brush,

            (ScanState::BrushDef { open: false }, LineKind::Open) => {
                ScanState::BrushDef { open: true }
            }
            (ScanState::BrushDef { open: false }, LineKind::Close) => {
                return Err(ConvertError::parse(
                    line_no,
                    "unexpected '}' before the brushDef block opened",
                ));
            }
            (ScanState::BrushDef { open: true }, LineKind::PlaneDef(def)) => {
                self.add_plane(line_no, def)?;
                ScanState::BrushDef { open: true }
            }
            (ScanState::BrushDef { open: true }, LineKind::Open) => {
                return Err(ConvertError::parse(line_no, "unexpected '{' inside brushDef"));
            }
            (ScanState::BrushDef { open: true }, LineKind::Close) => ScanState::Brush,
            (state @ ScanState::BrushDef { .. }, _) => state,

            (ScanState::SkipBlock { depth }, LineKind::Open) => {
                ScanState::SkipBlock { depth: depth + 1 }
            }
            (ScanState::SkipBlock { depth: 0 }, LineKind::Close) => {
                return Err(ConvertError::parse(
                    line_no,
                    "unexpected '}' before the skipped block opened",
                ));
            }
            (ScanState::SkipBlock { depth: 1 }, LineKind::Close) => ScanState::Brush,
            (ScanState::SkipBlock { depth }, LineKind::Close) => {
                ScanState::SkipBlock { depth: depth - 1 }
            }
            (state @ ScanState::SkipBlock { .. }, _) => state,
        };

        Ok(())
    }

    fn add_plane(&mut self, line_no: usize, def: &str) -> Result<()> {
        let (plane, contents) = parse_plane_line(line_no, def)?;
        if contents & CONTENTS_DETAIL != 0 {
            self.flags.detail = true;
        }
        if plane.is_degenerate() {
            warn!("line {line_no}: face points are collinear");
        } else if self.planes.iter().any(|p| p.coincides(&plane, PLANE_EPSILON)) {
            warn!("line {line_no}: face repeats an earlier plane of the brush, skipping it");
            return Ok(());
        }
        self.planes.push(plane);
        Ok(())
    }

    fn finish_brush(&mut self) {
        if self.planes.is_empty() {
            // Patch-only blocks end up here
            return;
        }
        let brush = Brush::new(std::mem::take(&mut self.planes)).with_flags(self.flags);
        self.brushes.push(SourceBrush {
            entity: self.entity_count - 1,
            classname: self.classname.clone(),
            line: self.brush_line,
            brush,
        });
    }

    /// Ends scanning and returns the collected brushes.
    pub fn finish(self) -> MapFile {
        if self.state != ScanState::Global && !self.finished {
            warn!("map ended inside a block (state {:?})", self.state);
            if !self.planes.is_empty() {
                warn!(
                    "discarding unterminated brush starting at line {}",
                    self.brush_line
                );
            }
        }
        MapFile {
            brushes: self.brushes,
            entity_count: self.entity_count,
        }
    }
}

/// Scans a whole map file held in memory.
pub fn parse_map(text: &str) -> Result<MapFile> {
    let mut scanner = MapScanner::new();
    for (i, line) in text.lines().enumerate() {
        scanner.feed_line(i + 1, line)?;
    }
    Ok(scanner.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    const BOX_FACES: &str = "\
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) base/wall 0 0 0 1 1
( -64 -64 -16 ) ( -64 -64 -15 ) ( -63 -64 -16 ) base/wall 0 0 0 1 1
( -64 -64 -16 ) ( -63 -64 -16 ) ( -64 -63 -16 ) base/wall 0 0 0 1 1
( 64 64 16 ) ( 64 65 16 ) ( 65 64 16 ) base/wall 0 0 0 1 1
( 64 64 16 ) ( 65 64 16 ) ( 64 64 17 ) base/wall 0 0 0 1 1
( 64 64 16 ) ( 64 64 17 ) ( 64 65 16 ) base/wall 0 0 0 1 1
";

    fn world_with(body: &str) -> String {
        format!("// test map\n{{\n\"classname\" \"worldspawn\"\n{body}}}\n")
    }

    #[test]
    fn single_box() {
        let map = parse_map(&world_with(&format!("{{\n{BOX_FACES}}}\n"))).unwrap();
        assert_eq!(map.entity_count, 1);
        assert_eq!(map.brushes.len(), 1);

        let source = &map.brushes[0];
        assert_eq!(source.entity, 0);
        assert_eq!(source.classname.as_deref(), Some("worldspawn"));
        assert_eq!(source.line, 4);
        assert_eq!(source.brush.len(), 6);
        assert!(!source.brush.is_detail());

        let first = source.brush.planes()[0];
        assert_relative_eq!(first.normal(), -Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(first.offset(), 64.0, epsilon = 1e-12);
    }

    #[test]
    fn comments_are_ignored() {
        let body = format!("{{ // brush 0\n// a comment line\n{BOX_FACES}}}\n");
        let map = parse_map(&world_with(&body)).unwrap();
        assert_eq!(map.brushes.len(), 1);
        assert_eq!(map.brushes[0].brush.len(), 6);
    }

    #[test]
    fn slashes_inside_quotes_are_kept() {
        assert_eq!(strip_comment("\"wad\" \"gfx//base.wad\""), "\"wad\" \"gfx//base.wad\"");
        assert_eq!(strip_comment("{ // open"), "{ ");
    }

    #[test]
    fn line_classification() {
        assert_eq!(classify_line("   "), LineKind::Blank);
        assert_eq!(classify_line("  {"), LineKind::Open);
        assert_eq!(classify_line("}"), LineKind::Close);
        assert_eq!(
            classify_line("\"classname\" \"light\""),
            LineKind::KeyValue("classname", "light")
        );
        assert_eq!(classify_line("patchDef2"), LineKind::SkipHeader);
        assert_eq!(classify_line("TerrainDef"), LineKind::SkipHeader);
        assert_eq!(classify_line("brushDef"), LineKind::BrushDefHeader);
        assert_eq!(classify_line("base/wall"), LineKind::Other);
        assert!(matches!(classify_line("( 0 0 0 ) ( 1 0 0 )"), LineKind::PlaneDef(_)));
    }

    #[test]
    fn patch_blocks_are_skipped() {
        let body = format!(
            "{{\npatchDef2\n{{\ncommon/caulk\n( 3 3 0 0 0 )\n(\n\
             ( 0 0 0 0 0 ) ( 1 0 0 1 0 )\n)\n}}\n}}\n{{\n{BOX_FACES}}}\n"
        );
        let map = parse_map(&world_with(&body)).unwrap();
        // The patch-only block yields no brush
        assert_eq!(map.brushes.len(), 1);
        assert_eq!(map.brushes[0].brush.len(), 6);
    }

    #[test]
    fn nested_skip_blocks_return_to_brush() {
        let body = format!("{{\nterrainDef\n{{\n{{\n}}\n}}\n{BOX_FACES}}}\n");
        let map = parse_map(&world_with(&body)).unwrap();
        assert_eq!(map.brushes.len(), 1);
        assert_eq!(map.brushes[0].brush.len(), 6);
    }

    #[test]
    fn entities_and_classnames() {
        let text = format!(
            "{{\n\"classname\" \"worldspawn\"\n{{\n{BOX_FACES}}}\n}}\n\
             {{\n\"classname\" \"light\"\n\"origin\" \"0 0 0\"\n}}\n\
             {{\n\"classname\" \"func_door\"\n{{\n{BOX_FACES}}}\n}}\n"
        );
        let map = parse_map(&text).unwrap();
        assert_eq!(map.entity_count, 3);
        assert_eq!(map.brushes.len(), 2);
        assert_eq!(map.brushes[1].entity, 2);
        assert_eq!(map.brushes[1].classname.as_deref(), Some("func_door"));
    }

    #[test]
    fn detail_flag_from_contents() {
        let detail_faces = BOX_FACES.replace("1 1\n", "1 1 134217728 0 0\n");
        let structural_faces = BOX_FACES.replace("1 1\n", "1 1 0 0 0\n");
        let body = format!("{{\n{detail_faces}}}\n{{\n{structural_faces}}}\n");
        let map = parse_map(&world_with(&body)).unwrap();
        assert!(map.brushes[0].brush.is_detail());
        assert!(!map.brushes[1].brush.is_detail());
    }

    #[test]
    fn valve_format_has_no_contents() {
        let line = "( 0 0 0 ) ( 0 1 0 ) ( 0 0 1 ) tex [ 1 0 0 0 ] [ 0 1 0 0 ] 0 1 1";
        let (_, contents) = parse_plane_line(1, line).unwrap();
        assert_eq!(contents, 0);
    }

    #[test]
    fn malformed_plane_is_fatal() {
        let body = "{\n( 0 0 0 ) ( 1 zero 0 ) ( 0 1 0 ) tex 0 0 0 1 1\n}\n";
        let err = parse_map(&world_with(body)).unwrap_err();
        match err {
            ConvertError::Parse { line, message } => {
                assert_eq!(line, 5);
                assert!(message.contains("zero"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn truncated_plane_is_fatal() {
        let body = "{\n( 0 0 0 ) ( 1 0 0 )\n}\n";
        assert!(matches!(
            parse_map(&world_with(body)),
            Err(ConvertError::Parse { line: 5, .. })
        ));
    }

    #[test]
    fn collinear_points_still_parse() {
        let body = "{\n( 0 0 0 ) ( 1 0 0 ) ( 2 0 0 ) tex 0 0 0 1 1\n}\n";
        let map = parse_map(&world_with(body)).unwrap();
        assert!(map.brushes[0].brush.planes()[0].is_degenerate());
    }

    #[test]
    fn unterminated_brush_is_discarded() {
        let text = format!("{{\n\"classname\" \"worldspawn\"\n{{\n{BOX_FACES}");
        let map = parse_map(&text).unwrap();
        assert!(map.brushes.is_empty());
    }

    #[test]
    fn stray_top_level_close_stops_scanning() {
        let text = format!("}}\n{{\n{{\n{BOX_FACES}}}\n}}\n");
        let map = parse_map(&text).unwrap();
        assert!(map.brushes.is_empty());
        assert_eq!(map.entity_count, 0);
    }

    #[test]
    fn brush_primitives_are_read() {
        let faces: String = BOX_FACES
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let points = &line[..line.find("base/wall").unwrap()];
                // Mark the last face as detail
                let contents = if i == 5 { CONTENTS_DETAIL } else { 0 };
                let matrix = "( ( 0.0078125 0 0 ) ( 0 0.0078125 0 ) )";
                format!("{points}{matrix} base/wall {contents} 0 0\n")
            })
            .collect();
        let body = format!("{{\nbrushDef\n{{\n{faces}}}\n}}\n");
        let map = parse_map(&world_with(&body)).unwrap();

        assert_eq!(map.brushes.len(), 1);
        let source = &map.brushes[0];
        assert_eq!(source.line, 4);
        assert_eq!(source.brush.len(), 6);
        assert!(source.brush.is_detail());
        assert_relative_eq!(source.brush.planes()[0].normal(), -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn brush_primitive_contents() {
        let line = "( 0 0 0 ) ( 0 1 0 ) ( 0 0 1 ) ( ( 1 0 0 ) ( 0 1 0 ) ) tex 134217728 0 0";
        let (_, contents) = parse_plane_line(1, line).unwrap();
        assert_eq!(contents, CONTENTS_DETAIL);
    }

    #[test]
    fn unknown_nested_block_names_the_supported_ones() {
        let body = "{\n{\n}\n}\n";
        match parse_map(&world_with(body)).unwrap_err() {
            ConvertError::Parse { line, message } => {
                assert_eq!(line, 5);
                assert!(message.contains("brushDef"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn repeated_face_lines_are_skipped() {
        let first = BOX_FACES.lines().next().unwrap();
        let body = format!("{{\n{BOX_FACES}{first}\n}}\n");
        let map = parse_map(&world_with(&body)).unwrap();
        assert_eq!(map.brushes[0].brush.len(), 6);
    }
}
