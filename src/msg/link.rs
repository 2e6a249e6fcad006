//! Link message (type 6), version 1: one hard link from a group to a child
//! object, carrying its creation order and the child header's file offset.

use super::FmtCtx;
use crate::sink::ByteSink;

/// What a link points at.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LinkTarget {
    Group(usize),
    Dataset(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct LinkMsg {
    pub name: String,
    pub target: LinkTarget,
    pub order: u64,
}

impl LinkMsg {
    pub(crate) fn format_body(&self, ctx: &mut FmtCtx<'_>, sink: &mut ByteSink) {
        sink.put_u8(1);
        // Flags: 1-byte name length, creation order present, link type
        // present, character set present.
        sink.put_u8(0b0001_1100);
        sink.put_u8(0); // hard link
        sink.put_u64(self.order);
        sink.put_u8(0); // ASCII
        sink.put_u8(self.name.len() as u8);
        sink.put_bytes(self.name.as_bytes());
        let addr = match self.target {
            LinkTarget::Group(g) => ctx.group_pos[g],
            LinkTarget::Dataset(d) => ctx.dataset_pos[d],
        };
        sink.put_u64(addr);
    }
}
