//! Little-endian byte sinks.
//!
//! Two writers share the element-encoding surface:
//! - [`ByteSink`] — in-memory, auto-growing, seekable. All metadata is laid
//!   out here (twice: a sizing pass and the final emit).
//! - [`ChunkSink`] — channel-backed with a fixed resident block, flushing to
//!   the output file either verbatim or through a per-chunk DEFLATE encoder.
//!
//! The [`DataSink`] trait is the common put-surface so the raw-data element
//! encoder can aim at either backing.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::Result;

/// Fill byte for 8-byte alignment gaps and short trailing-edge chunk slots.
pub const PAD_BYTE: u8 = 0x77;

/// Resident block size of a channel-backed sink before it flushes.
pub const CHUNK_BLOCK_LIMIT: usize = 64 * 1024;

/// Common little-endian put-surface over both sink backings.
pub trait DataSink {
    fn put(&mut self, bytes: &[u8]) -> Result<()>;

    fn put_u8(&mut self, v: u8) -> Result<()> {
        self.put(&[v])
    }
    fn put_i8(&mut self, v: i8) -> Result<()> {
        self.put(&[v as u8])
    }
    fn put_u16(&mut self, v: u16) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_i16(&mut self, v: i16) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_u32(&mut self, v: u32) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_i32(&mut self, v: i32) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_u64(&mut self, v: u64) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_i64(&mut self, v: i64) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_f32(&mut self, v: f32) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
    fn put_f64(&mut self, v: f64) -> Result<()> {
        self.put(&v.to_le_bytes())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ByteSink — in-memory backing
// ─────────────────────────────────────────────────────────────────────────────

/// Sequential little-endian buffer with seek-within-capacity semantics.
///
/// Writing past the end grows the buffer; seeking back and re-writing
/// overwrites in place (used to patch measured lengths).
#[derive(Debug, Default)]
pub struct ByteSink {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        ByteSink {
            buf: Vec::with_capacity(cap),
            pos: 0,
        }
    }

    /// Current write offset.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos as u64
    }

    /// Count of valid bytes (high-water mark, independent of the cursor).
    #[inline]
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Move the cursor. Positions up to the current length are addressable.
    pub fn seek(&mut self, pos: u64) {
        debug_assert!(pos <= self.buf.len() as u64, "seek beyond written bytes");
        self.pos = pos as usize;
    }

    /// All valid bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// A sub-range of the valid bytes.
    pub fn bytes_at(&self, start: u64, len: usize) -> &[u8] {
        let start = start as usize;
        &self.buf[start..start + len]
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    /// Append every valid byte of another sink.
    pub fn put_sink(&mut self, other: &ByteSink) {
        self.put_bytes(other.bytes());
    }

    /// Pad with [`PAD_BYTE`] until the cursor sits on a multiple of 8.
    pub fn align8(&mut self) {
        while self.pos % 8 != 0 {
            self.put_bytes(&[PAD_BYTE]);
        }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.put_bytes(&[v]);
    }
    pub fn put_u16(&mut self, v: u16) {
        self.put_bytes(&v.to_le_bytes());
    }
    pub fn put_u32(&mut self, v: u32) {
        self.put_bytes(&v.to_le_bytes());
    }
    pub fn put_u64(&mut self, v: u64) {
        self.put_bytes(&v.to_le_bytes());
    }
    pub fn put_f32(&mut self, v: f32) {
        self.put_bytes(&v.to_le_bytes());
    }
    pub fn put_f64(&mut self, v: f64) {
        self.put_bytes(&v.to_le_bytes());
    }
}

impl DataSink for ByteSink {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_bytes(bytes);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChunkSink — channel backing with optional DEFLATE
// ─────────────────────────────────────────────────────────────────────────────

/// Counts the bytes that actually reach the output channel, so the on-disk
/// size of a chunk is known after compression.
struct CountWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

enum ChunkOut<W: Write> {
    Raw(CountWriter<W>),
    Deflate(DeflateEncoder<CountWriter<W>>),
}

/// Block-buffered writer for one chunk's raw data.
///
/// Bytes accumulate in a resident block; whenever it reaches
/// [`CHUNK_BLOCK_LIMIT`] the accumulated run is handed to the channel —
/// through the DEFLATE encoder when a compression level is active, verbatim
/// otherwise — and the block is cleared. [`ChunkSink::finish`] drains the
/// residue, ends the DEFLATE stream, and reports the channel byte count.
pub struct ChunkSink<W: Write> {
    block: Vec<u8>,
    out: ChunkOut<W>,
}

impl<W: Write> ChunkSink<W> {
    /// `level` 0 writes verbatim; 1–9 routes the chunk through DEFLATE.
    pub fn new(inner: W, level: u32) -> Self {
        let counted = CountWriter { inner, written: 0 };
        let out = if level > 0 {
            ChunkOut::Deflate(DeflateEncoder::new(counted, Compression::new(level)))
        } else {
            ChunkOut::Raw(counted)
        };
        ChunkSink {
            block: Vec::with_capacity(CHUNK_BLOCK_LIMIT),
            out,
        }
    }

    fn flush_block(&mut self) -> std::io::Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }
        match &mut self.out {
            ChunkOut::Raw(w) => w.write_all(&self.block)?,
            ChunkOut::Deflate(enc) => enc.write_all(&self.block)?,
        }
        self.block.clear();
        Ok(())
    }

    /// Drain the residue, end the DEFLATE stream, and return the number of
    /// bytes that reached the channel.
    pub fn finish(mut self) -> Result<u64> {
        self.flush_block()?;
        let counted = match self.out {
            ChunkOut::Raw(w) => w,
            ChunkOut::Deflate(enc) => enc.finish()?,
        };
        Ok(counted.written)
    }
}

impl<W: Write> DataSink for ChunkSink<W> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        if self.block.len() + bytes.len() > CHUNK_BLOCK_LIMIT {
            self.flush_block()?;
        }
        self.block.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seek_overwrites_in_place() {
        let mut s = ByteSink::new();
        s.put_u32(0);
        s.put_u32(7);
        s.seek(0);
        s.put_u32(0xAABBCCDD);
        assert_eq!(s.len(), 8);
        assert_eq!(s.bytes(), &[0xDD, 0xCC, 0xBB, 0xAA, 7, 0, 0, 0]);
    }

    #[test]
    fn align_pads_with_sentinel() {
        let mut s = ByteSink::new();
        s.put_u8(1);
        s.align8();
        assert_eq!(s.pos(), 8);
        assert_eq!(&s.bytes()[1..], &[PAD_BYTE; 7]);
        s.align8();
        assert_eq!(s.pos(), 8, "already aligned position must not move");
    }
}
