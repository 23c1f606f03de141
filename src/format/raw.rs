//! Little-endian slice reader with truncation-aware errors.
//!
//! The whole file is read into memory first, so every primitive read either
//! succeeds or reports exactly how many bytes the header demanded versus how
//! many the file holds.
use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Decode an instrument string. Field names are cp1252; outside the
/// 0x80..0x9F block that encoding coincides with Latin-1, which covers the
/// characters Elmitec firmware actually emits (`µ`, `°`).
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset from the start of the file.
    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                needed: self.pos + n,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Consume exactly `n` bytes.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n)?;
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Consume up to `n` bytes; short files yield a short slice instead of
    /// an error. Used for the metadata block, which trailing-truncated
    /// writers occasionally cut short.
    pub(crate) fn take_at_most(&mut self, n: usize) -> &'a [u8] {
        let n = n.min(self.remaining());
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    /// Skip exactly `n` bytes (alignment and spare regions).
    pub(crate) fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.pos += n;
        Ok(())
    }

    /// Skip up to `n` bytes without failing on a short file.
    pub(crate) fn skip_at_most(&mut self, n: usize) {
        self.pos += n.min(self.remaining());
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }
}
