//! Short fixed-layout messages: fill value (5), group info (10), filter
//! pipeline (11), modification time (18), B-tree K-values (19), link info
//! (2) and attribute info (21).

use super::{FmtCtx, UNDEF_ADDR};
use crate::dataset::{write_run, ElemCtx};
use crate::dtype::DType;
use crate::error::Result;
use crate::sink::ByteSink;
use crate::value::Value;

/// Fill value, version 2: allocate early, write at allocation time.
pub(crate) fn fill_body(
    dtype: DType,
    fixed_len: usize,
    value: Option<&Value>,
    ctx: &mut FmtCtx<'_>,
    sink: &mut ByteSink,
) -> Result<()> {
    sink.put_u8(2);
    sink.put_u8(1); // space allocation: early
    sink.put_u8(0); // fill write: at allocation
    match value {
        Some(v) => {
            sink.put_u8(1);
            let mut bytes = ByteSink::new();
            let mut ectx = ElemCtx {
                dataset_pos: ctx.dataset_pos,
                heap: Some(&mut *ctx.heap),
                heap_addr: ctx.heap_pos,
            };
            write_run(&mut bytes, v.data(), 0, v.elem_count() as usize, dtype, fixed_len, &mut ectx)?;
            sink.put_u32(bytes.len() as u32);
            sink.put_sink(&bytes);
        }
        None => sink.put_u8(0),
    }
    Ok(())
}

/// Group info, version 0, no optional fields.
pub(crate) fn group_info_body(sink: &mut ByteSink) {
    sink.put_u8(0);
    sink.put_u8(0);
}

/// Filter pipeline, version 2: exactly one DEFLATE stage whose single client
/// value is the compression level.
pub(crate) fn filter_body(level: u32, sink: &mut ByteSink) {
    sink.put_u8(2);
    sink.put_u8(1);
    sink.put_u16(1); // filter id: deflate
    sink.put_u16(0); // mandatory
    sink.put_u16(1); // one client value
    sink.put_u32(level);
}

/// Object modification time, version 1.
pub(crate) fn mod_time_body(secs: u32, sink: &mut ByteSink) {
    sink.put_u8(1);
    sink.put_bytes(&[0, 0, 0]);
    sink.put_u32(secs);
}

/// B-tree K-values carried by the superblock extension: indexed-storage,
/// group-internal and group-leaf arities.
pub(crate) fn kvalues_body(sink: &mut ByteSink) {
    sink.put_u8(0);
    sink.put_u16(32);
    sink.put_u16(16);
    sink.put_u16(4);
}

/// Link info, version 0, creation order tracked and indexed; links live in
/// the header itself so every index address is undefined.
pub(crate) fn link_info_body(max_index: u64, sink: &mut ByteSink) {
    sink.put_u8(0);
    sink.put_u8(0b11);
    sink.put_u64(max_index);
    sink.put_u64(UNDEF_ADDR); // fractal heap
    sink.put_u64(UNDEF_ADDR); // name index b-tree
    sink.put_u64(UNDEF_ADDR); // creation order index b-tree
}

/// Attribute info, version 0, creation order tracked and indexed; attributes
/// are stored compact, so the dense-storage addresses are undefined.
pub(crate) fn attr_info_body(max_index: u16, sink: &mut ByteSink) {
    sink.put_u8(0);
    sink.put_u8(0b11);
    sink.put_u16(max_index);
    sink.put_u64(UNDEF_ADDR); // fractal heap
    sink.put_u64(UNDEF_ADDR); // name index b-tree
    sink.put_u64(UNDEF_ADDR); // creation order index b-tree
}
