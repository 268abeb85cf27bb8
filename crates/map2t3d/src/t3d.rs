//! Unreal T3D text emitter.
//!
//! Each brush becomes an additive `Brush` actor whose model holds one
//! polygon per face. Numbers use the fixed-point layout the editor writes
//! itself (`+00064.000000`) and lines end with CRLF.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use brush_mesh::BrushMesh;
use log::debug;
use nalgebra::{Point3, Vector3};

/// Axis negated on output to switch handedness between level formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mirror {
    #[default]
    None,
    X,
    Y,
    Z,
}

impl Mirror {
    fn axis(self) -> Option<usize> {
        match self {
            Mirror::None => None,
            Mirror::X => Some(0),
            Mirror::Y => Some(1),
            Mirror::Z => Some(2),
        }
    }

    /// Applies the mirror to a position or direction.
    pub fn apply(self, mut v: Vector3<f64>) -> Vector3<f64> {
        if let Some(axis) = self.axis() {
            v[axis] = -v[axis];
        }
        v
    }

    /// Mirroring flips orientation, so vertex order must be reversed to keep
    /// polygons facing the same way.
    pub fn reverses_winding(self) -> bool {
        self != Mirror::None
    }
}

impl FromStr for Mirror {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Mirror::None),
            "x" => Ok(Mirror::X),
            "y" => Ok(Mirror::Y),
            "z" => Ok(Mirror::Z),
            other => Err(format!("unknown mirror axis '{other}' (expected x, y, z or none)")),
        }
    }
}

/// Formats a vector as `+00000.000000,+00000.000000,+00000.000000`.
struct Fixed(Vector3<f64>);

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Adding zero turns -0.0 into +0.0
        let [x, y, z] = [self.0.x + 0.0, self.0.y + 0.0, self.0.z + 0.0];
        write!(f, "{x:+013.6},{y:+013.6},{z:+013.6}")
    }
}

/// Writes T3D documents to a stream.
#[derive(Debug)]
pub struct T3dWriter<W: Write> {
    out: W,
    mirror: Mirror,
}

impl<W: Write> T3dWriter<W> {
    pub fn new(out: W, mirror: Mirror) -> Self {
        Self { out, mirror }
    }

    fn line(&mut self, text: fmt::Arguments<'_>) -> io::Result<()> {
        self.out.write_fmt(text)?;
        self.out.write_all(b"\r\n")
    }

    /// Writes the map and level headers.
    pub fn begin_map(&mut self, name: &str) -> io::Result<()> {
        self.line(format_args!("Begin Map Name={name}"))?;
        self.line(format_args!("   Begin Level NAME=PersistentLevel"))
    }

    /// Writes one brush actor. `index` numbers the actor and its model and
    /// should be unique within a run.
    pub fn write_brush(&mut self, index: usize, mesh: &BrushMesh) -> io::Result<()> {
        let number = index + 1;
        self.line(format_args!(
            "\t  Begin Actor Class=Brush Name=Brush_{number} Archetype=Brush'Engine.Default__Brush'"
        ))?;
        self.line(format_args!(
            "\t\t Begin Object Class=BrushComponent Name=BrushComponent0 \
             ObjName=BrushComponent_{index} \
             Archetype=BrushComponent'Engine.Default__Brush:BrushComponent0'"
        ))?;
        self.line(format_args!("\t\t\tBrush=Model'Model_{index}'"))?;
        self.line(format_args!("\t\t\tReplacementPrimitive=None"))?;
        self.line(format_args!("\t\t\tLightingChannels=(bInitialized=True,Dynamic=True)"))?;
        self.line(format_args!("\t\t\tName=\"BrushComponent_{index}\""))?;
        self.line(format_args!(
            "\t\t\tObjectArchetype=BrushComponent'Engine.Default__Brush:BrushComponent0'"
        ))?;
        self.line(format_args!("\t\t End Object"))?;
        self.line(format_args!("\t\t CsgOper=CSG_Add"))?;
        self.line(format_args!("\t\t Begin Brush Name=Model_{index}"))?;
        self.line(format_args!("\t\t\tBegin PolyList"))?;

        for face in mesh.faces() {
            let mut points: Vec<Point3<f64>> = mesh.face_points(face).collect();
            if self.mirror.reverses_winding() {
                points.reverse();
            }
            self.write_polygon(face.plane().normal(), &points)?;
        }

        self.line(format_args!("\t\t\tEnd PolyList"))?;
        self.line(format_args!("\t\t End Brush"))?;
        self.line(format_args!("\t\t Brush=Model'Model_{index}'"))?;
        self.line(format_args!("\t\t BrushComponent=BrushComponent'BrushComponent_{index}'"))?;
        self.line(format_args!(
            "\t\t Components(0)=BrushComponent'BrushComponent_{index}'"
        ))?;
        self.line(format_args!("\t\t CreationTime=12.345678"))?;
        self.line(format_args!("\t\t Tag=\"Brush\""))?;
        self.line(format_args!(
            "\t\t CollisionComponent=BrushComponent'BrushComponent_{index}'"
        ))?;
        self.line(format_args!("\t\t Name=\"Brush_{number}\""))?;
        self.line(format_args!("\t\t ObjectArchetype=Brush'Engine.Default__Brush'"))?;
        self.line(format_args!("\t  End Actor"))
    }

    fn write_polygon(&mut self, normal: Vector3<f64>, points: &[Point3<f64>]) -> io::Result<()> {
        let Some(origin) = points.first() else {
            return Ok(());
        };
        let mirror = self.mirror;

        self.line(format_args!("\t\t\t   Begin Polygon Flags=3584"))?;
        self.line(format_args!("\t\t\t\t  Origin   {}", Fixed(mirror.apply(origin.coords))))?;
        self.line(format_args!("\t\t\t\t  Normal   {}", Fixed(mirror.apply(normal))))?;
        self.line(format_args!("\t\t\t\t  TextureU {}", Fixed(Vector3::x())))?;
        self.line(format_args!("\t\t\t\t  TextureV {}", Fixed(Vector3::y())))?;
        for point in points {
            self.line(format_args!("\t\t\t\t  Vertex   {}", Fixed(mirror.apply(point.coords))))?;
        }
        self.line(format_args!("\t\t\t   End Polygon"))
    }

    /// Writes the level and map trailers.
    pub fn end_map(&mut self) -> io::Result<()> {
        self.line(format_args!("   End Level"))?;
        self.line(format_args!("Begin Surface"))?;
        self.line(format_args!("End Surface"))?;
        self.line(format_args!("End Map"))?;
        self.out.flush()
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Spreads brushes over several T3D documents.
///
/// A new stream is requested from `open` (with the 0-based stream number)
/// whenever the current one holds `brushes_per_stream` brushes. A limit of 0
/// puts everything into one stream. Every stream is a complete document.
pub struct BatchedWriter<W, F>
where
    W: Write,
    F: FnMut(usize) -> io::Result<W>,
{
    open: F,
    map_name: String,
    mirror: Mirror,
    brushes_per_stream: usize,
    current: Option<T3dWriter<W>>,
    in_current: usize,
    streams: usize,
}

impl<W, F> BatchedWriter<W, F>
where
    W: Write,
    F: FnMut(usize) -> io::Result<W>,
{
    pub fn new(
        map_name: impl Into<String>,
        mirror: Mirror,
        brushes_per_stream: usize,
        open: F,
    ) -> Self {
        Self {
            open,
            map_name: map_name.into(),
            mirror,
            brushes_per_stream,
            current: None,
            in_current: 0,
            streams: 0,
        }
    }

    fn close_current(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.current.take() {
            writer.end_map()?;
        }
        Ok(())
    }

    fn open_next(&mut self) -> io::Result<()> {
        self.close_current()?;
        let stream = (self.open)(self.streams)?;
        debug!("opened output stream {}", self.streams);
        self.streams += 1;
        self.in_current = 0;

        let mut writer = T3dWriter::new(stream, self.mirror);
        writer.begin_map(&self.map_name)?;
        self.current = Some(writer);
        Ok(())
    }

    /// Writes a brush, starting a new stream first if the current one is full.
    pub fn write_brush(&mut self, index: usize, mesh: &BrushMesh) -> io::Result<()> {
        let full = self.brushes_per_stream > 0 && self.in_current >= self.brushes_per_stream;
        if self.current.is_none() || full {
            self.open_next()?;
        }
        if let Some(writer) = self.current.as_mut() {
            writer.write_brush(index, mesh)?;
        }
        self.in_current += 1;
        Ok(())
    }

    /// Closes the last stream and returns how many streams were written.
    ///
    /// A run without brushes still produces one (empty) document.
    pub fn finish(mut self) -> io::Result<usize> {
        if self.current.is_none() && self.streams == 0 {
            self.open_next()?;
        }
        self.close_current()?;
        Ok(self.streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brush_mesh::{mesh_brush, Brush, MeshConfig, Plane};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Write sink whose contents stay readable after the writer is dropped.
    #[derive(Debug, Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn unit_cube_mesh() -> BrushMesh {
        let brush = Brush::new(vec![
            Plane::new(-Vector3::x(), 0.0),
            Plane::new(Vector3::x(), 1.0),
            Plane::new(-Vector3::y(), 0.0),
            Plane::new(Vector3::y(), 1.0),
            Plane::new(-Vector3::z(), 0.0),
            Plane::new(Vector3::z(), 1.0),
        ]);
        mesh_brush(&brush, &MeshConfig::default()).unwrap()
    }

    fn render(mirror: Mirror) -> String {
        let mut writer = T3dWriter::new(Vec::new(), mirror);
        writer.begin_map("test").unwrap();
        writer.write_brush(0, &unit_cube_mesh()).unwrap();
        writer.end_map().unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    fn vertex_lines(text: &str) -> Vec<&str> {
        text.lines()
            .map(str::trim)
            .filter(|l| l.starts_with("Vertex"))
            .collect()
    }

    #[test]
    fn fixed_point_format() {
        assert_eq!(
            Fixed(Vector3::new(64.0, -0.5, 0.0)).to_string(),
            "+00064.000000,-00000.500000,+00000.000000"
        );
        assert_eq!(
            Fixed(Vector3::new(-0.0, 1234.5678914, -12345.0)).to_string(),
            "+00000.000000,+01234.567891,-12345.000000"
        );
    }

    #[test]
    fn document_structure() {
        let text = render(Mirror::None);
        assert!(text.starts_with("Begin Map Name=test\r\n   Begin Level NAME=PersistentLevel\r\n"));
        assert!(text.ends_with("   End Level\r\nBegin Surface\r\nEnd Surface\r\nEnd Map\r\n"));
        assert!(text.contains("Name=Brush_1 "));
        assert!(text.contains("Begin Brush Name=Model_0\r\n"));
        assert_eq!(text.matches("Begin Polygon Flags=3584").count(), 6);
        assert_eq!(text.matches("End Polygon").count(), 6);
        assert_eq!(vertex_lines(&text).len(), 24);
        // Every line ends with CRLF
        assert!(!text.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn polygon_block_layout() {
        let text = render(Mirror::None);
        // Last face is the top (+Z) face
        let top = text.rsplit("Begin Polygon").next().unwrap();
        let lines: Vec<&str> = top.lines().map(str::trim).collect();
        assert_eq!(lines[1], "Origin   +00000.000000,+00001.000000,+00001.000000");
        assert_eq!(lines[2], "Normal   +00000.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[3], "TextureU +00001.000000,+00000.000000,+00000.000000");
        assert_eq!(lines[4], "TextureV +00000.000000,+00001.000000,+00000.000000");
        assert_eq!(lines[5], "Vertex   +00000.000000,+00001.000000,+00001.000000");
        assert_eq!(lines[6], "Vertex   +00001.000000,+00001.000000,+00001.000000");
        assert_eq!(lines[7], "Vertex   +00001.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[8], "Vertex   +00000.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[9], "End Polygon");
    }

    #[test]
    fn mirror_negates_and_reverses() {
        let text = render(Mirror::Y);
        let top = text.rsplit("Begin Polygon").next().unwrap();
        let lines: Vec<&str> = top.lines().map(str::trim).collect();
        assert_eq!(lines[1], "Origin   +00000.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[2], "Normal   +00000.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[5], "Vertex   +00000.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[6], "Vertex   +00001.000000,+00000.000000,+00001.000000");
        assert_eq!(lines[7], "Vertex   +00001.000000,-00001.000000,+00001.000000");
        assert_eq!(lines[8], "Vertex   +00000.000000,-00001.000000,+00001.000000");
    }

    #[test]
    fn mirror_parsing() {
        assert_eq!("y".parse::<Mirror>(), Ok(Mirror::Y));
        assert_eq!("X".parse::<Mirror>(), Ok(Mirror::X));
        assert_eq!("none".parse::<Mirror>(), Ok(Mirror::None));
        assert!("w".parse::<Mirror>().is_err());
    }

    #[test]
    fn batching_splits_streams() {
        let mesh = unit_cube_mesh();
        let streams: Rc<RefCell<Vec<SharedBuf>>> = Rc::default();
        let opened = Rc::clone(&streams);

        let mut batched = BatchedWriter::new("level", Mirror::None, 2, move |n| {
            assert_eq!(n, opened.borrow().len());
            let buf = SharedBuf::default();
            opened.borrow_mut().push(buf.clone());
            Ok(buf)
        });
        for index in 0..5 {
            batched.write_brush(index, &mesh).unwrap();
        }
        assert_eq!(batched.finish().unwrap(), 3);

        let texts: Vec<String> = streams.borrow().iter().map(SharedBuf::text).collect();
        assert_eq!(texts.len(), 3);
        for text in &texts {
            assert!(text.starts_with("Begin Map Name=level\r\n"));
            assert!(text.ends_with("End Map\r\n"));
        }
        let actors: Vec<usize> = texts.iter().map(|t| t.matches("Begin Actor").count()).collect();
        assert_eq!(actors, vec![2, 2, 1]);
        // Actor numbering continues across streams
        assert!(texts[1].contains("Name=Brush_3 "));
        assert!(texts[2].contains("Begin Brush Name=Model_4\r\n"));
    }

    #[test]
    fn unlimited_batch_uses_one_stream() {
        let mesh = unit_cube_mesh();
        let mut batched = BatchedWriter::new("level", Mirror::None, 0, |_| Ok(io::sink()));
        for index in 0..50 {
            batched.write_brush(index, &mesh).unwrap();
        }
        assert_eq!(batched.finish().unwrap(), 1);
    }

    #[test]
    fn empty_run_writes_one_document() {
        let batched = BatchedWriter::new("empty", Mirror::None, 10, |_| Ok(Vec::new()));
        assert_eq!(batched.finish().unwrap(), 1);
    }
}
