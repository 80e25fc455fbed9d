//! Low-level reader for the FlatBuffers tables embedded in AEDAT 4.0 files.
//!
//! Only what the container needs is supported: root tables (plain and
//! size-prefixed), scalar fields, strings and vectors of fixed-size structs.
//! Every offset is bounds-checked against the buffer, so a corrupt file
//! produces a [`DecodeError::InvalidFormat`] instead of a panic.

use crate::decoder::DecodeError;
use byteorder::{ByteOrder, LittleEndian};

const SIZE_PREFIX_LEN: usize = 4;
const UOFFSET_LEN: usize = 4;
const IDENTIFIER_LEN: usize = 4;

// ============================================================================
// Bounds-checked primitive reads
// ============================================================================

#[inline]
fn bytes(buf: &[u8], pos: usize, len: usize) -> Result<&[u8], DecodeError> {
    pos.checked_add(len)
        .and_then(|end| buf.get(pos..end))
        .ok_or_else(|| {
            DecodeError::InvalidFormat(format!(
                "offset {}+{} is outside the {}-byte buffer",
                pos,
                len,
                buf.len()
            ))
        })
}

#[inline]
fn read_u16(buf: &[u8], pos: usize) -> Result<u16, DecodeError> {
    Ok(LittleEndian::read_u16(bytes(buf, pos, 2)?))
}

#[inline]
fn read_u32(buf: &[u8], pos: usize) -> Result<u32, DecodeError> {
    Ok(LittleEndian::read_u32(bytes(buf, pos, 4)?))
}

#[inline]
fn read_i32(buf: &[u8], pos: usize) -> Result<i32, DecodeError> {
    Ok(LittleEndian::read_i32(bytes(buf, pos, 4)?))
}

#[inline]
fn read_i64(buf: &[u8], pos: usize) -> Result<i64, DecodeError> {
    Ok(LittleEndian::read_i64(bytes(buf, pos, 8)?))
}

/// Follows the unsigned offset stored at `pos`.
#[inline]
fn follow(buf: &[u8], pos: usize) -> Result<usize, DecodeError> {
    let offset = read_u32(buf, pos)? as usize;
    pos.checked_add(offset)
        .ok_or_else(|| DecodeError::InvalidFormat(format!("offset overflow at {}", pos)))
}

// ============================================================================
// Tables
// ============================================================================

/// A view of one table inside a FlatBuffer.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    buf: &'a [u8],
    pos: usize,
    vtable: usize,
    vtable_len: usize,
}

impl<'a> Table<'a> {
    /// Opens the root table of a plain buffer.
    pub fn root(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let pos = follow(buf, 0)?;
        Self::at(buf, pos)
    }

    /// Opens the root table of a size-prefixed buffer, checking its file identifier.
    pub fn size_prefixed_root(buf: &'a [u8], identifier: &str) -> Result<Self, DecodeError> {
        let size = read_u32(buf, 0)? as usize;
        if size > buf.len() - SIZE_PREFIX_LEN {
            return Err(DecodeError::InvalidFormat(format!(
                "size prefix {} exceeds the {}-byte buffer",
                size,
                buf.len()
            )));
        }

        let found = bytes(buf, SIZE_PREFIX_LEN + UOFFSET_LEN, IDENTIFIER_LEN)?;
        if found != identifier.as_bytes() {
            return Err(DecodeError::InvalidFormat(format!(
                "expected buffer identifier {:?}, found {:?}",
                identifier,
                String::from_utf8_lossy(found)
            )));
        }

        let pos = follow(buf, SIZE_PREFIX_LEN)?;
        Self::at(buf, pos)
    }

    fn at(buf: &'a [u8], pos: usize) -> Result<Self, DecodeError> {
        // The vtable lives at `pos - soffset`.
        let soffset = read_i32(buf, pos)? as i64;
        let vtable = usize::try_from(pos as i64 - soffset).map_err(|_| {
            DecodeError::InvalidFormat(format!("table at {} has a negative vtable offset", pos))
        })?;
        let vtable_len = read_u16(buf, vtable)? as usize;

        Ok(Self {
            buf,
            pos,
            vtable,
            vtable_len,
        })
    }

    /// Returns the absolute position of field `slot`, or `None` when absent.
    fn field(&self, slot: usize) -> Result<Option<usize>, DecodeError> {
        // vtable: [u16 vtable_len][u16 table_len][u16 offset; n]
        let entry = 4 + 2 * slot;
        if entry + 2 > self.vtable_len {
            return Ok(None);
        }

        match read_u16(self.buf, self.vtable + entry)? {
            0 => Ok(None),
            offset => Ok(Some(self.pos + offset as usize)),
        }
    }

    /// Reads an `i32` field, falling back to the schema default.
    pub fn get_i32(&self, slot: usize, default: i32) -> Result<i32, DecodeError> {
        match self.field(slot)? {
            Some(pos) => read_i32(self.buf, pos),
            None => Ok(default),
        }
    }

    /// Reads an `i64` field, falling back to the schema default.
    pub fn get_i64(&self, slot: usize, default: i64) -> Result<i64, DecodeError> {
        match self.field(slot)? {
            Some(pos) => read_i64(self.buf, pos),
            None => Ok(default),
        }
    }

    /// Reads a string field.
    pub fn get_str(&self, slot: usize) -> Result<Option<&'a str>, DecodeError> {
        let Some(pos) = self.field(slot)? else {
            return Ok(None);
        };

        let start = follow(self.buf, pos)?;
        let len = read_u32(self.buf, start)? as usize;
        let raw = bytes(self.buf, start + 4, len)?;

        std::str::from_utf8(raw)
            .map(Some)
            .map_err(|e| DecodeError::InvalidFormat(format!("string field is not UTF-8: {}", e)))
    }

    /// Reads a vector of inline structs, each `stride` bytes wide.
    pub fn get_struct_vector(
        &self,
        slot: usize,
        stride: usize,
    ) -> Result<Option<StructVector<'a>>, DecodeError> {
        assert!(stride > 0, "struct stride must be non-zero");

        let Some(pos) = self.field(slot)? else {
            return Ok(None);
        };

        let start = follow(self.buf, pos)?;
        let count = read_u32(self.buf, start)? as usize;
        let len = count.checked_mul(stride).ok_or_else(|| {
            DecodeError::InvalidFormat(format!("vector of {} elements overflows", count))
        })?;
        let data = bytes(self.buf, start + 4, len)?;

        Ok(Some(StructVector { data, stride }))
    }
}

/// The raw bytes of a vector of fixed-size structs.
#[derive(Debug, Clone, Copy)]
pub struct StructVector<'a> {
    data: &'a [u8],
    stride: usize,
}

impl<'a> StructVector<'a> {
    /// Iterates over the raw bytes of each element.
    pub fn iter(&self) -> std::slice::ChunksExact<'a, u8> {
        self.data.chunks_exact(self.stride)
    }
}
