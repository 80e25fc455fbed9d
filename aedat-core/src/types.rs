//! Core types for AEDAT 4.0 recordings.
//!
//! This module defines the decoded event, the packet union yielded by the
//! decoder, and the stream metadata parsed from the file header.

/// Brightness change direction of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Brightness increased
    On,
    /// Brightness decreased
    Off,
}

impl Polarity {
    /// Returns the single-digit text form used in CSV output.
    #[inline]
    pub fn as_digit(self) -> char {
        match self {
            Self::On => '1',
            Self::Off => '0',
        }
    }
}

impl From<bool> for Polarity {
    #[inline]
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// A decoded polarity event.
///
/// Events represent brightness changes detected by the event camera sensor.
/// Each event carries its timestamp in microseconds, the pixel coordinates
/// and the polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Timestamp in microseconds
    pub timestamp: i64,
    /// X coordinate of the pixel
    pub x: i16,
    /// Y coordinate of the pixel
    pub y: i16,
    /// Event polarity
    pub polarity: Polarity,
}

impl Event {
    /// Creates a new event.
    #[inline]
    pub fn new(timestamp: i64, x: i16, y: i16, polarity: Polarity) -> Self {
        Self {
            timestamp,
            x,
            y,
            polarity,
        }
    }
}

/// Kind of data carried by a stream, from its 4-character type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamContent {
    /// Polarity events (`EVTS`)
    Events,
    /// Image frames (`FRME`)
    Frame,
    /// Inertial measurement samples (`IMUS`)
    Imus,
    /// External trigger signals (`TRIG`)
    Triggers,
}

impl StreamContent {
    /// Maps a type identifier to a stream kind.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            "EVTS" => Some(Self::Events),
            "FRME" => Some(Self::Frame),
            "IMUS" => Some(Self::Imus),
            "TRIG" => Some(Self::Triggers),
            _ => None,
        }
    }

    /// Returns the type identifier, which doubles as the FlatBuffer file identifier.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Events => "EVTS",
            Self::Frame => "FRME",
            Self::Imus => "IMUS",
            Self::Triggers => "TRIG",
        }
    }
}

/// A stream declared in the file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    /// Kind of data the stream carries
    pub content: StreamContent,
    /// Sensor width in pixels, if the header declares one
    pub width: Option<u16>,
    /// Sensor height in pixels, if the header declares one
    pub height: Option<u16>,
}

/// Packet compression declared in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum Compression {
    #[default]
    None = 0,
    Lz4 = 1,
    Lz4High = 2,
    Zstd = 3,
    ZstdHigh = 4,
}

impl Compression {
    /// Attempts to parse a compression type from its wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Lz4),
            2 => Some(Self::Lz4High),
            3 => Some(Self::Zstd),
            4 => Some(Self::ZstdHigh),
            _ => None,
        }
    }
}

/// One packet of a recording, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A decoded events payload
    Events { stream_id: u32, events: Vec<Event> },
    /// A payload of another kind, left undecoded
    Other {
        stream_id: u32,
        content: StreamContent,
    },
}

impl Packet {
    /// Returns the events payload, if this packet carries one.
    pub fn events(&self) -> Option<&[Event]> {
        match self {
            Self::Events { events, .. } => Some(events),
            Self::Other { .. } => None,
        }
    }
}
