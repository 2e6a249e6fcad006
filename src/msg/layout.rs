//! Data layout message (type 8), version 3.

use super::{FmtCtx, UNDEF_ADDR};
use crate::sink::ByteSink;

/// Raw-data placement for one dataset.
#[derive(Debug, Clone)]
pub(crate) enum LayoutMsg {
    /// One run of elements at a single address. The address and byte size
    /// are read from the format context (they become known once the data
    /// phase has written the block).
    Contiguous { dataset: usize },
    /// Chunked storage behind a B-tree node. The trailing pseudo-dimension
    /// of the chunk shape is the element byte size.
    Chunked {
        dataset: usize,
        chunk_dims: Vec<u64>,
        elem_size: u32,
    },
}

impl LayoutMsg {
    pub(crate) fn format_body(&self, ctx: &mut FmtCtx<'_>, sink: &mut ByteSink) {
        sink.put_u8(3);
        match self {
            LayoutMsg::Contiguous { dataset } => {
                sink.put_u8(1);
                let (addr, size) = ctx.contig[*dataset];
                if size == 0 {
                    sink.put_u64(UNDEF_ADDR);
                } else {
                    sink.put_u64(addr);
                }
                sink.put_u64(size);
            }
            LayoutMsg::Chunked {
                dataset,
                chunk_dims,
                elem_size,
            } => {
                sink.put_u8(2);
                sink.put_u8(chunk_dims.len() as u8 + 1);
                sink.put_u64(ctx.btree_pos[*dataset]);
                for &d in chunk_dims {
                    sink.put_u32(d as u32);
                }
                sink.put_u32(*elem_size);
            }
        }
    }
}
