//! Chunk index: one version-1 B-tree leaf node per chunked dataset.
//!
//! The node is never split — every chunk key/pointer pair lives in a single
//! level-0 node that the data layout message points at. Keys carry the
//! chunk's on-disk byte size, a zero filter mask, and the starting offset on
//! each axis plus the trailing element-size pseudo-axis.

use crate::dataset::Dataset;
use crate::msg::UNDEF_ADDR;
use crate::sink::ByteSink;

/// Emits the node for `ds` (which must be chunked).
pub(crate) fn format_chunk_btree(ds: &Dataset, sink: &mut ByteSink) {
    sink.put_bytes(b"TREE");
    sink.put_u8(1); // node type: raw data chunks
    sink.put_u8(0); // leaf
    sink.put_u16(ds.chunks.len() as u16);
    sink.put_u64(UNDEF_ADDR); // left sibling
    sink.put_u64(UNDEF_ADDR); // right sibling
    for chunk in &ds.chunks {
        sink.put_u32(chunk.size as u32);
        sink.put_u32(0); // filter mask: all filters applied
        for &s in &chunk.start {
            sink.put_u64(s);
        }
        sink.put_u64(0); // element pseudo-axis
        sink.put_u64(chunk.addr);
    }
    // Closing key: one past the last chunk on every axis.
    sink.put_u32(0);
    sink.put_u32(0);
    for (axis, &count) in ds.chunk_counts.iter().enumerate() {
        sink.put_u64(count * ds.chunk_shape[axis]);
    }
    sink.put_u64(0);
}
