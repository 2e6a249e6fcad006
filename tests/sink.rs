// Unit tests for src/sink.rs — little-endian byte sinks.

use std::io::Read;

use nc4::sink::{ByteSink, ChunkSink, DataSink, CHUNK_BLOCK_LIMIT, PAD_BYTE};

// ---------------------------------------------------------------------------
// ByteSink: encodings, alignment, seek
// ---------------------------------------------------------------------------

/// Every put_* helper must emit little-endian bytes.
#[test]
fn little_endian_puts() {
    let mut s = ByteSink::new();
    s.put_u8(0xAB);
    s.put_u16(0x0102);
    s.put_u32(0x0304_0506);
    s.put_u64(0x0708_090A_0B0C_0D0E);
    assert_eq!(
        s.bytes(),
        &[
            0xAB, // u8
            0x02, 0x01, // u16
            0x06, 0x05, 0x04, 0x03, // u32
            0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08, 0x07, // u64
        ]
    );
}

/// Floats serialize as IEEE-754 little-endian bit patterns.
#[test]
fn float_puts_are_ieee_bits() {
    let mut s = ByteSink::new();
    s.put_f32(1.0);
    s.put_f64(-2.5);
    assert_eq!(&s.bytes()[..4], 1.0f32.to_le_bytes());
    assert_eq!(&s.bytes()[4..], (-2.5f64).to_le_bytes());
}

/// align8 fills with the 0x77 sentinel and never moves an aligned cursor.
#[test]
fn align8_pads_to_boundary() {
    let mut s = ByteSink::new();
    s.put_bytes(&[1, 2, 3]);
    s.align8();
    assert_eq!(s.pos(), 8);
    assert_eq!(&s.bytes()[3..8], &[PAD_BYTE; 5]);
    s.align8();
    assert_eq!(s.pos(), 8);
}

/// Seeking back overwrites in place without changing the length.
#[test]
fn seek_and_patch() {
    let mut s = ByteSink::new();
    s.put_u32(0xFFFF_FFFF);
    s.put_u32(2);
    s.seek(0);
    s.put_u32(1);
    assert_eq!(s.len(), 8);
    assert_eq!(s.bytes(), &[1, 0, 0, 0, 2, 0, 0, 0]);
    assert_eq!(s.pos(), 4, "cursor sits after the patched field");
}

/// Sub-range reads see exactly the requested window.
#[test]
fn bytes_at_window() {
    let mut s = ByteSink::new();
    s.put_bytes(b"abcdefgh");
    assert_eq!(s.bytes_at(2, 3), b"cde");
}

/// Copying another sink appends all of its valid bytes.
#[test]
fn put_sink_copies_whole_buffer() {
    let mut a = ByteSink::new();
    a.put_bytes(b"head:");
    let mut b = ByteSink::new();
    b.put_bytes(b"tail");
    a.put_sink(&b);
    assert_eq!(a.bytes(), b"head:tail");
}

// ---------------------------------------------------------------------------
// ChunkSink: raw and DEFLATE channel modes
// ---------------------------------------------------------------------------

/// Raw mode passes bytes through verbatim and reports the channel count.
#[test]
fn chunk_sink_raw_passthrough() {
    let mut out = Vec::new();
    let mut sink = ChunkSink::new(&mut out, 0);
    sink.put_u32(0xDDCC_BBAA).unwrap();
    sink.put(&[1, 2, 3]).unwrap();
    let written = sink.finish().unwrap();
    assert_eq!(written, 7);
    assert_eq!(out, vec![0xAA, 0xBB, 0xCC, 0xDD, 1, 2, 3]);
}

/// Writes larger than the resident block still arrive intact.
#[test]
fn chunk_sink_block_rollover() {
    let payload: Vec<u8> = (0..CHUNK_BLOCK_LIMIT + 1000)
        .map(|i| (i % 251) as u8)
        .collect();
    let mut out = Vec::new();
    let mut sink = ChunkSink::new(&mut out, 0);
    for piece in payload.chunks(4096) {
        sink.put(piece).unwrap();
    }
    let written = sink.finish().unwrap();
    assert_eq!(written as usize, payload.len());
    assert_eq!(out, payload);
}

/// DEFLATE mode ends the stream at finish and round-trips through a
/// standard inflater.
#[test]
fn chunk_sink_deflate_roundtrip() {
    let payload: Vec<u8> = std::iter::repeat_n(b"abcdefgh".as_slice(), 512)
        .flatten()
        .copied()
        .collect();
    let mut out = Vec::new();
    let mut sink = ChunkSink::new(&mut out, 6);
    sink.put(&payload).unwrap();
    let written = sink.finish().unwrap();
    assert_eq!(written as usize, out.len());
    assert!(
        out.len() < payload.len(),
        "repetitive payload must compress ({} vs {})",
        out.len(),
        payload.len()
    );
    let mut inflated = Vec::new();
    flate2::read::DeflateDecoder::new(out.as_slice())
        .read_to_end(&mut inflated)
        .unwrap();
    assert_eq!(inflated, payload);
}
