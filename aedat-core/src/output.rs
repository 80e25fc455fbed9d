//! CSV output for decoded events.
//!
//! Each event is written as one `timestamp,x,y,polarity` line with no header
//! row. Polarity is rendered through [`Polarity::as_digit`].
//!
//! [`Polarity::as_digit`]: crate::types::Polarity::as_digit

use crate::types::Event;
use std::io::{BufWriter, Write};
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// CSV output writer for events.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a new CSV writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes a batch of events.
    pub fn write_events(&mut self, events: &[Event]) -> Result<(), OutputError> {
        for event in events {
            self.write_event(event)?;
        }
        Ok(())
    }

    /// Writes a single event.
    #[inline]
    pub fn write_event(&mut self, event: &Event) -> Result<(), OutputError> {
        writeln!(
            self.writer,
            "{},{},{},{}",
            event.timestamp,
            event.x,
            event.y,
            event.polarity.as_digit()
        )?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}
