//! Command-line entry point: `map2t3d <infile> <outfile> [options]`.

use std::process::ExitCode;

use log::{error, info};
use map2t3d::{convert_file, ConvertConfig, USAGE};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ConvertConfig::from_args(std::env::args().skip(1)) {
        Ok(Some(config)) => config,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match convert_file(&config) {
        Ok((summary, paths)) => {
            info!(
                "{} entities, {} brushes read, {} written ({} faces)",
                summary.entities, summary.brushes_read, summary.brushes_written, summary.faces
            );
            if summary.detail_filtered > 0 {
                info!("{} detail brushes left out", summary.detail_filtered);
            }
            if summary.empty_brushes > 0 {
                info!("{} brushes produced no faces", summary.empty_brushes);
            }
            if !summary.skipped.is_empty() {
                info!("{} degenerate brushes skipped", summary.skipped.len());
            }
            for path in &paths {
                println!("wrote {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("conversion failed: {e}");
            ExitCode::FAILURE
        }
    }
}
