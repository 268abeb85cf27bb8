//! Run configuration assembled from command-line arguments.

use std::path::{Path, PathBuf};

use brush_mesh::MeshConfig;

use crate::t3d::Mirror;
use crate::{ConvertError, Result};

pub const USAGE: &str = "\
Usage: map2t3d <infile> <outfile> [options]

Converts the brushes of a .map file into an Unreal T3D level.

Options:
  --brushes-per-file <N>  Start a new output file every N brushes (default: 0, one file)
  --mirror <AXIS>         Negate x, y or z on output (default: none)
  --skip-detail           Leave out brushes flagged as detail
  --max-planes <N>        Fail if a brush has more than N planes (default: 128)
  --name <NAME>           Map name written to the output (default: input file stem)
  -h, --help              Print this help

Set RUST_LOG=debug for per-brush diagnostics.";

/// Options that shape the conversion, independent of where data comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    /// Brushes per output document; 0 writes a single document.
    pub brushes_per_file: usize,
    pub mirror: Mirror,
    /// Drop brushes carrying the detail content flag.
    pub skip_detail: bool,
    pub mesh: MeshConfig,
}

/// Complete configuration of a file-to-file conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Name written into `Begin Map Name=`; defaults to the input file stem.
    pub map_name: Option<String>,
    pub options: ConvertOptions,
}

impl ConvertConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            map_name: None,
            options: ConvertOptions::default(),
        }
    }

    /// Parses command-line arguments (without the program name).
    ///
    /// Returns `Ok(None)` when help was requested.
    pub fn from_args<I>(args: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut positional = Vec::new();
        let mut map_name = None;
        let mut options = ConvertOptions::default();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "--brushes-per-file" => {
                    options.brushes_per_file = parse_value(&arg, args.next())?;
                }
                "--mirror" => {
                    options.mirror = parse_value(&arg, args.next())?;
                }
                "--skip-detail" => options.skip_detail = true,
                "--max-planes" => {
                    options.mesh.max_planes = parse_value(&arg, args.next())?;
                }
                "--name" => {
                    map_name = Some(required(&arg, args.next())?);
                }
                flag if flag.starts_with("--") => {
                    return Err(ConvertError::Usage(format!("unknown option '{flag}'")));
                }
                _ => positional.push(arg),
            }
        }

        let [input, output]: [String; 2] = positional.try_into().map_err(|found: Vec<String>| {
            ConvertError::Usage(format!(
                "expected <infile> and <outfile>, got {} positional arguments",
                found.len()
            ))
        })?;

        Ok(Some(Self {
            input: input.into(),
            output: output.into(),
            map_name,
            options,
        }))
    }

    /// The map name to write: the explicit name, or the input file stem.
    pub fn map_name(&self) -> String {
        self.map_name.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled".to_string())
        })
    }

    /// Path of the `n`th (0-based) output file: `out.t3d`, `out_2.t3d`, ...
    pub fn output_path(&self, n: usize) -> PathBuf {
        numbered_path(&self.output, n)
    }
}

fn numbered_path(base: &Path, n: usize) -> PathBuf {
    if n == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_{}.{}", n + 1, ext.to_string_lossy()),
        None => format!("{stem}_{}", n + 1),
    };
    base.with_file_name(name)
}

fn required(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| ConvertError::Usage(format!("{flag} needs a value")))
}

fn parse_value<T>(flag: &str, value: Option<String>) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = required(flag, value)?;
    value
        .parse()
        .map_err(|e| ConvertError::Usage(format!("invalid value '{value}' for {flag}: {e}")))
}
