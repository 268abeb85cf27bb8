//! Conversion of Quake-style `.map` brushwork into Unreal T3D levels.
//!
//! The pipeline has three stages:
//!
//! - [`parser`]: a line-driven state machine extracts the planes of every
//!   brush;
//! - [`brush_mesh`] rebuilds each brush's polygons;
//! - [`t3d`] writes the polygons as brush actors, optionally spreading
//!   them over several files.

pub mod config;
pub mod convert;
mod error;
pub mod parser;
pub mod t3d;

pub use config::{ConvertConfig, ConvertOptions, USAGE};
pub use convert::{convert_file, convert_text, ConvertSummary, SkippedSource};
pub use error::{ConvertError, Result};
pub use parser::{parse_map, MapFile, MapScanner, SourceBrush, CONTENTS_DETAIL};
pub use t3d::{BatchedWriter, Mirror, T3dWriter};
