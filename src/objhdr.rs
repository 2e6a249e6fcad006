//! Version-2 object header envelope, shared by groups and datasets.
//!
//! The chunk-0 length field is stored in 1, 2, 4 or 8 bytes depending on its
//! own value, so the message block is laid out into a scratch sink first and
//! the envelope emitted once the width is known. A Jenkins checksum over
//! everything from the signature on closes the header.

use crate::checksum::jenkins_lookup3;
use crate::error::Result;
use crate::msg::{format_msgs, FmtCtx, Msg};
use crate::sink::ByteSink;

/// Flag bits beyond the size-width code: attribute creation order tracked
/// and indexed, storage phase-change values stored, times stored.
const OHDR_FLAGS: u8 = 0b0011_1100;

/// Attribute phase-change bounds (compact until, dense from).
const MAX_COMPACT_ATTRS: u16 = 8;
const MIN_DENSE_ATTRS: u16 = 6;

pub(crate) fn format_object_header(
    msgs: &[Msg],
    times: u32,
    ctx: &mut FmtCtx<'_>,
    sink: &mut ByteSink,
) -> Result<()> {
    let mut body = ByteSink::new();
    format_msgs(msgs, ctx, &mut body)?;
    let len = body.len();
    let width_code: u8 = match len {
        0..=0xFF => 0,
        0x100..=0xFFFF => 1,
        0x1_0000..=0xFFFF_FFFF => 2,
        _ => 3,
    };

    let start = sink.pos();
    sink.put_bytes(b"OHDR");
    sink.put_u8(2);
    sink.put_u8(width_code | OHDR_FLAGS);
    for _ in 0..4 {
        sink.put_u32(times); // access, modification, change, birth
    }
    sink.put_u16(MAX_COMPACT_ATTRS);
    sink.put_u16(MIN_DENSE_ATTRS);
    match width_code {
        0 => sink.put_u8(len as u8),
        1 => sink.put_u16(len as u16),
        2 => sink.put_u32(len as u32),
        _ => sink.put_u64(len),
    }
    sink.put_sink(&body);
    let hashed = (sink.pos() - start) as usize;
    let digest = jenkins_lookup3(sink.bytes_at(start, hashed), 0);
    sink.put_u32(digest);
    Ok(())
}
