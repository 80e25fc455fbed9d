//! Recording to CSV conversion.
//!
//! Walks the packets of a recording in file order and writes one CSV line per
//! event. Packets without an events payload are skipped.

use crate::decoder::{DecodeError, RecordingDecoder};
use crate::output::{CsvWriter, OutputError};
use crate::types::Packet;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Writes every event of `packets` to `out`, returning the number of lines written.
///
/// Stops at the first decode error. Lines written before the error are
/// flushed to `out` before the error is returned.
pub fn convert<I, W>(packets: I, out: W) -> Result<u64, ConvertError>
where
    I: IntoIterator<Item = Result<Packet, DecodeError>>,
    W: Write,
{
    let mut writer = CsvWriter::new(out);
    let mut lines = 0u64;

    for packet in packets {
        let packet = match packet {
            Ok(packet) => packet,
            Err(error) => {
                if let Err(flush_error) = writer.flush() {
                    log::warn!("Failed to flush partial output: {}", flush_error);
                }
                return Err(error.into());
            }
        };

        if let Some(events) = packet.events() {
            writer.write_events(events)?;
            lines += events.len() as u64;
        }
    }

    writer.flush()?;
    Ok(lines)
}

/// Opens `path` with decoder `D` and converts it to CSV on `out`.
///
/// The decoder, and the file it holds, is dropped before this returns.
pub fn convert_file<D, W>(path: &Path, out: W) -> Result<u64, ConvertError>
where
    D: RecordingDecoder,
    W: Write,
{
    let decoder = D::open(path)?;
    convert(decoder, out)
}
