//! AEDAT 4.0 decoder library for event-camera recordings.
//!
//! This crate reads AEDAT 4.0 container files as written by the iniVation DV
//! software, yields their packets in file order, and converts polarity events to
//! a plain `timestamp,x,y,polarity` CSV stream.
//!
//! # Example
//!
//! ```no_run
//! use aedat_core::Aedat4Decoder;
//!
//! let decoder = Aedat4Decoder::open("recording.aedat4").unwrap();
//! for packet in decoder {
//!     if let Some(events) = packet.unwrap().events() {
//!         println!("{} events", events.len());
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - Header and stream description parsing
//! - Uncompressed, LZ4 and Zstd packet payloads
//! - Lazy, packet-by-packet iteration
//! - CSV conversion against any [`RecordingDecoder`]

pub mod convert;
pub mod decoder;
pub mod description;
pub mod flatbuffer;
pub mod output;
pub mod types;

// Re-export commonly used types
pub use convert::{convert, convert_file, ConvertError};
pub use decoder::{Aedat4Decoder, DecodeError, RecordingDecoder};
pub use output::{CsvWriter, OutputError};
pub use types::{Compression, Event, Packet, Polarity, Stream, StreamContent};
