//! Builders for synthetic AEDAT 4.0 recordings used by tests and benchmarks.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAGIC_NUMBER: &[u8] = b"#!AER-DAT4.0\r\n";

pub const COMPRESSION_NONE: i32 = 0;
pub const COMPRESSION_LZ4: i32 = 1;
pub const COMPRESSION_LZ4_HIGH: i32 = 2;
pub const COMPRESSION_ZSTD: i32 = 3;
pub const COMPRESSION_ZSTD_HIGH: i32 = 4;

/// Builds the XML description for `(stream id, type identifier)` pairs.
pub fn description(streams: &[(u32, &str)]) -> String {
    let mut xml = String::from(
        "<dv version=\"2.0\">\n  <node name=\"outputs\" path=\"/mainloop/Recorder/outputs/\">\n",
    );
    for (id, identifier) in streams {
        xml.push_str(&format!(
            "    <node name=\"{id}\" path=\"/mainloop/Recorder/outputs/{id}/\">\n      \
             <attr key=\"compression\" type=\"string\">LZ4</attr>\n      \
             <attr key=\"typeIdentifier\" type=\"string\">{identifier}</attr>\n      \
             <node name=\"info\" path=\"/mainloop/Recorder/outputs/{id}/info/\">\n        \
             <attr key=\"sizeX\" type=\"int\">346</attr>\n        \
             <attr key=\"sizeY\" type=\"int\">260</attr>\n      \
             </node>\n    </node>\n"
        ));
    }
    xml.push_str("  </node>\n</dv>\n");
    xml
}

/// Builds an IOHeader table: compression, dataTablePosition, infoNode.
pub fn ioheader(compression: i32, data_table_position: i64, description: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&16u32.to_le_bytes()); // root table at 16
    for v in [10u16, 20, 4, 8, 16] {
        buf.extend_from_slice(&v.to_le_bytes()); // vtable at 4
    }
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&12i32.to_le_bytes()); // vtable at 16 - 12
    buf.extend_from_slice(&compression.to_le_bytes());
    buf.extend_from_slice(&data_table_position.to_le_bytes());
    buf.extend_from_slice(&4u32.to_le_bytes()); // string follows
    buf.extend_from_slice(&(description.len() as u32).to_le_bytes());
    buf.extend_from_slice(description.as_bytes());
    buf.push(0);
    buf
}

/// Builds a size-prefixed `EVTS` event packet.
pub fn event_payload(events: &[(i64, i16, i16, bool)]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&0u32.to_le_bytes()); // size, patched below
    buf.extend_from_slice(&16u32.to_le_bytes()); // root table at 20
    buf.extend_from_slice(b"EVTS");
    for v in [6u16, 8, 4] {
        buf.extend_from_slice(&v.to_le_bytes()); // vtable at 12
    }
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(&8i32.to_le_bytes()); // vtable at 20 - 8
    buf.extend_from_slice(&4u32.to_le_bytes()); // vector follows
    buf.extend_from_slice(&(events.len() as u32).to_le_bytes());
    for &(t, x, y, on) in events {
        buf.extend_from_slice(&t.to_le_bytes());
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
        buf.extend_from_slice(&[on as u8, 0, 0, 0]);
    }
    let size = (buf.len() - 4) as u32;
    buf[0..4].copy_from_slice(&size.to_le_bytes());
    buf
}

pub fn compress(compression: i32, data: &[u8]) -> Vec<u8> {
    match compression {
        COMPRESSION_NONE => data.to_vec(),
        COMPRESSION_LZ4 | COMPRESSION_LZ4_HIGH => {
            let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        _ => zstd::stream::encode_all(data, 0).unwrap(),
    }
}

/// Assembles a complete recording in memory.
pub struct RecordingBuilder {
    compression: i32,
    streams: Vec<(u32, &'static str)>,
    packets: Vec<(u32, Vec<u8>)>,
    data_table: Option<Vec<u8>>,
}

impl RecordingBuilder {
    pub fn new(compression: i32) -> Self {
        Self {
            compression,
            streams: Vec::new(),
            packets: Vec::new(),
            data_table: None,
        }
    }

    pub fn stream(mut self, id: u32, identifier: &'static str) -> Self {
        self.streams.push((id, identifier));
        self
    }

    pub fn events(self, stream_id: u32, events: &[(i64, i16, i16, bool)]) -> Self {
        let payload = event_payload(events);
        self.packet(stream_id, &payload)
    }

    /// Adds a packet with an arbitrary (uncompressed) payload.
    pub fn packet(mut self, stream_id: u32, payload: &[u8]) -> Self {
        let compressed = compress(self.compression, payload);
        self.packets.push((stream_id, compressed));
        self
    }

    /// Appends trailing bytes after the packets and points the header at them.
    pub fn data_table(mut self, bytes: &[u8]) -> Self {
        self.data_table = Some(bytes.to_vec());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let description = description(&self.streams);

        let mut packets = Vec::new();
        for (stream_id, payload) in &self.packets {
            packets.extend_from_slice(&stream_id.to_le_bytes());
            packets.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            packets.extend_from_slice(payload);
        }

        // The header length does not depend on the position value.
        let header_len = ioheader(self.compression, -1, &description).len();
        let data_table_position = match self.data_table {
            Some(_) => (MAGIC_NUMBER.len() + 4 + header_len + packets.len()) as i64,
            None => -1,
        };
        let header = ioheader(self.compression, data_table_position, &description);

        let mut file = MAGIC_NUMBER.to_vec();
        file.extend_from_slice(&(header.len() as u32).to_le_bytes());
        file.extend_from_slice(&header);
        file.extend_from_slice(&packets);
        if let Some(table) = &self.data_table {
            file.extend_from_slice(table);
        }
        file
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
