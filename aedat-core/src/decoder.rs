//! Streaming AEDAT 4.0 decoder.
//!
//! This module reads the container header (magic number, IOHeader and stream
//! description) when a recording is opened, then yields one packet at a time
//! in file order. Events payloads are decompressed and decoded; payloads of
//! other stream kinds are passed through undecoded.

use crate::description::parse_description;
use crate::flatbuffer::Table;
use crate::types::{Compression, Event, Packet, Polarity, Stream, StreamContent};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during AEDAT 4.0 decoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unexpected end of file")]
    UnexpectedEof,

    #[error("Unknown stream id: {0}")]
    UnknownStream(u32),
}

/// Magic number at the start of every AEDAT 4.0 file.
pub const MAGIC_NUMBER: &[u8; 14] = b"#!AER-DAT4.0\r\n";

/// Packet header: i32 stream id + i32 payload size.
const PACKET_HEADER_SIZE: usize = 8;

/// Event struct: i64 t | i16 x | i16 y | bool on | 3 bytes padding.
const EVENT_STRUCT_SIZE: usize = 16;

// IOHeader table slots
const IOHEADER_COMPRESSION: usize = 0;
const IOHEADER_DATA_TABLE_POSITION: usize = 1;
const IOHEADER_INFO_NODE: usize = 2;

// EventPacket table slots
const EVENT_PACKET_ELEMENTS: usize = 0;

/// A source of recording packets that can be opened from a path.
///
/// The converter only depends on this seam, so it can run against an
/// in-memory packet sequence as easily as against a real file.
pub trait RecordingDecoder: Iterator<Item = Result<Packet, DecodeError>> + Sized {
    /// Opens a recording. Fails if the file is missing or not a valid recording.
    fn open(path: &Path) -> Result<Self, DecodeError>;
}

/// Streaming AEDAT 4.0 decoder.
///
/// Owns the underlying reader; dropping the decoder closes the file.
#[derive(Debug)]
pub struct Aedat4Decoder<R = BufReader<File>> {
    reader: R,
    streams: HashMap<u32, Stream>,
    compression: Compression,

    // Absolute file offset of the next packet header
    position: u64,
    data_table_position: Option<u64>,
    finished: bool,
}

impl Aedat4Decoder<BufReader<File>> {
    /// Opens an AEDAT 4.0 file from disk and parses its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl RecordingDecoder for Aedat4Decoder<BufReader<File>> {
    fn open(path: &Path) -> Result<Self, DecodeError> {
        Aedat4Decoder::<BufReader<File>>::open(path)
    }
}

impl<R: Read> Aedat4Decoder<R> {
    /// Parses the header from `reader`, leaving it positioned at the first packet.
    pub fn from_reader(mut reader: R) -> Result<Self, DecodeError> {
        let mut magic = [0u8; MAGIC_NUMBER.len()];
        reader.read_exact(&mut magic).map_err(map_eof)?;
        if &magic != MAGIC_NUMBER {
            return Err(DecodeError::InvalidFormat(
                "missing AEDAT 4.0 magic number".to_string(),
            ));
        }

        let header_len = reader.read_u32::<LittleEndian>().map_err(map_eof)?;
        let header = read_block(&mut reader, header_len as u64)?;
        let table = Table::root(&header)?;

        let raw_compression = table.get_i32(IOHEADER_COMPRESSION, 0)?;
        let compression = Compression::from_i32(raw_compression).ok_or_else(|| {
            DecodeError::InvalidFormat(format!("unknown compression type {}", raw_compression))
        })?;

        // Negative means the file has no data table.
        let data_table_position = table.get_i64(IOHEADER_DATA_TABLE_POSITION, -1)?;

        let description = table.get_str(IOHEADER_INFO_NODE)?.ok_or_else(|| {
            DecodeError::InvalidFormat("header has no stream description".to_string())
        })?;
        let streams = parse_description(description)?;

        log::debug!(
            "AEDAT4 header: compression={:?}, data table at {}, {} streams",
            compression,
            data_table_position,
            streams.len()
        );

        Ok(Self {
            reader,
            streams,
            compression,
            position: (MAGIC_NUMBER.len() + 4) as u64 + header_len as u64,
            data_table_position: u64::try_from(data_table_position).ok(),
            finished: false,
        })
    }

    /// Streams declared in the header, keyed by stream id.
    pub fn streams(&self) -> &HashMap<u32, Stream> {
        &self.streams
    }

    /// Packet compression declared in the header.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Reads the next packet, or `None` at the end of the packet section.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, DecodeError> {
        if self.data_table_position == Some(self.position) {
            return Ok(None);
        }

        let Some(header) = self.read_packet_header()? else {
            return Ok(None);
        };

        let stream_id = LittleEndian::read_u32(&header[0..4]);
        let size = LittleEndian::read_u32(&header[4..8]);
        let payload = read_block(&mut self.reader, size as u64)?;
        self.position += PACKET_HEADER_SIZE as u64 + size as u64;

        let content = self
            .streams
            .get(&stream_id)
            .map(|stream| stream.content)
            .ok_or(DecodeError::UnknownStream(stream_id))?;

        log::trace!(
            "packet: stream {} ({:?}), {} bytes",
            stream_id,
            content,
            size
        );

        let packet = match content {
            StreamContent::Events => {
                let buffer = self.decompress(payload)?;
                Packet::Events {
                    stream_id,
                    events: decode_events(&buffer)?,
                }
            }
            content => Packet::Other { stream_id, content },
        };

        Ok(Some(packet))
    }

    /// Reads a packet header, distinguishing a clean end of file from a truncated one.
    fn read_packet_header(&mut self) -> Result<Option<[u8; PACKET_HEADER_SIZE]>, DecodeError> {
        let mut header = [0u8; PACKET_HEADER_SIZE];
        let mut filled = 0;

        while filled < header.len() {
            match self.reader.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            PACKET_HEADER_SIZE => Ok(Some(header)),
            _ => Err(DecodeError::UnexpectedEof),
        }
    }

    fn decompress(&self, payload: Vec<u8>) -> Result<Vec<u8>, DecodeError> {
        match self.compression {
            Compression::None => Ok(payload),
            Compression::Lz4 | Compression::Lz4High => {
                let mut buffer = Vec::new();
                lz4_flex::frame::FrameDecoder::new(payload.as_slice()).read_to_end(&mut buffer)?;
                Ok(buffer)
            }
            Compression::Zstd | Compression::ZstdHigh => {
                Ok(zstd::stream::decode_all(payload.as_slice())?)
            }
        }
    }
}

impl<R: Read> Iterator for Aedat4Decoder<R> {
    type Item = Result<Packet, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

/// Decodes a decompressed `EVTS` payload into events.
pub fn decode_events(buffer: &[u8]) -> Result<Vec<Event>, DecodeError> {
    let table = Table::size_prefixed_root(buffer, StreamContent::Events.identifier())?;

    let elements = match table.get_struct_vector(EVENT_PACKET_ELEMENTS, EVENT_STRUCT_SIZE)? {
        Some(elements) => elements,
        None => return Ok(Vec::new()),
    };

    Ok(elements
        .iter()
        .map(|raw| {
            Event::new(
                LittleEndian::read_i64(&raw[0..8]),
                LittleEndian::read_i16(&raw[8..10]),
                LittleEndian::read_i16(&raw[10..12]),
                Polarity::from(raw[12] != 0),
            )
        })
        .collect())
}

fn map_eof(error: io::Error) -> DecodeError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::UnexpectedEof
    } else {
        DecodeError::Io(error)
    }
}

/// Reads exactly `len` bytes without trusting `len` for the allocation up front.
fn read_block<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>, DecodeError> {
    let mut block = Vec::new();
    reader.take(len).read_to_end(&mut block)?;

    if (block.len() as u64) < len {
        return Err(DecodeError::UnexpectedEof);
    }
    Ok(block)
}
