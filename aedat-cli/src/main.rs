//! AEDAT 4.0 to CSV converter.
//!
//! Prints every polarity event of a recording to standard output as one
//! `timestamp,x,y,polarity` line.

use aedat_core::{convert_file, Aedat4Decoder};
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;

/// Convert AEDAT 4.0 recording events to CSV.
///
/// Writes one `timestamp,x,y,polarity` line per event to standard output,
/// with polarity as 1 (ON) or 0 (OFF).
#[derive(Parser, Debug)]
#[command(name = "aedat-to-csv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input .aedat4 file path
    #[arg(short, long, value_name = "PATH")]
    filename: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let stdout = io::stdout();
    let lines = convert_file::<Aedat4Decoder, _>(&args.filename, stdout.lock())
        .with_context(|| format!("Failed to convert {:?}", args.filename))?;

    log::debug!("Wrote {} events from {:?}", lines, args.filename);

    Ok(())
}
