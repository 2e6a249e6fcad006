//! Object-header messages.
//!
//! Every group and dataset header is a list of typed messages serialized in
//! the version-2 envelope: type byte, 2-byte body size, flag byte, 2-byte
//! creation order (creation-order tracking is always on), then the body.
//!
//! Bodies that embed file offsets (links, layout, references inside
//! attribute payloads) read them from [`FmtCtx`]; on the sizing pass those
//! tables still hold zero, which is harmless because every offset field has
//! a fixed width.

pub mod attribute;
pub mod dataspace;
pub mod layout;
pub mod link;
pub mod simple;

pub(crate) use attribute::AttrMsg;
pub(crate) use dataspace::SpaceMsg;
pub(crate) use layout::LayoutMsg;
pub(crate) use link::{LinkMsg, LinkTarget};

use crate::dtype::DType;
use crate::error::Result;
use crate::gheap::GlobalHeap;
use crate::sink::ByteSink;
use crate::value::Value;

/// The on-disk marker for "no address".
pub(crate) const UNDEF_ADDR: u64 = u64::MAX;

/// Shared state for one metadata pass.
pub(crate) struct FmtCtx<'a> {
    /// Object-header position per group id.
    pub group_pos: &'a [u64],
    /// Object-header position per dataset id.
    pub dataset_pos: &'a [u64],
    /// Chunk B-tree node position per dataset id (0 when contiguous).
    pub btree_pos: &'a [u64],
    /// File-wide global heap collection address.
    pub heap_pos: u64,
    /// File-wide global heap (variable-length attribute payloads and string
    /// fill values re-populate it on every pass).
    pub heap: &'a mut GlobalHeap,
    /// Per-dataset `(address, byte size)` of the data block, for contiguous
    /// layout messages.
    pub contig: &'a [(u64, u64)],
    /// File modification time, seconds since the epoch.
    pub mod_secs: u32,
}

/// One header message.
#[derive(Debug)]
pub(crate) enum Msg {
    Dataspace(SpaceMsg),
    LinkInfo { max_index: u64 },
    Datatype { dtype: DType, fixed_len: usize },
    Fill { dtype: DType, fixed_len: usize, value: Option<Value> },
    Link(LinkMsg),
    Layout(LayoutMsg),
    GroupInfo,
    Filter { level: u32 },
    Attribute(AttrMsg),
    ModTime,
    KValues,
    AttrInfo { max_index: u16 },
}

impl Msg {
    fn type_code(&self) -> u8 {
        match self {
            Msg::Dataspace(_) => 1,
            Msg::LinkInfo { .. } => 2,
            Msg::Datatype { .. } => 3,
            Msg::Fill { .. } => 5,
            Msg::Link(_) => 6,
            Msg::Layout(_) => 8,
            Msg::GroupInfo => 10,
            Msg::Filter { .. } => 11,
            Msg::Attribute(_) => 12,
            Msg::ModTime => 18,
            Msg::KValues => 19,
            Msg::AttrInfo { .. } => 21,
        }
    }

    fn format_body(&self, ctx: &mut FmtCtx<'_>, sink: &mut ByteSink) -> Result<()> {
        match self {
            Msg::Dataspace(space) => space.format_body(sink),
            Msg::LinkInfo { max_index } => simple::link_info_body(*max_index, sink),
            Msg::Datatype { dtype, fixed_len } => dtype.format_body(*fixed_len, sink),
            Msg::Fill {
                dtype,
                fixed_len,
                value,
            } => simple::fill_body(*dtype, *fixed_len, value.as_ref(), ctx, sink)?,
            Msg::Link(link) => link.format_body(ctx, sink),
            Msg::Layout(layout) => layout.format_body(ctx, sink),
            Msg::GroupInfo => simple::group_info_body(sink),
            Msg::Filter { level } => simple::filter_body(*level, sink),
            Msg::Attribute(attr) => attr.format_body(ctx, sink)?,
            Msg::ModTime => simple::mod_time_body(ctx.mod_secs, sink),
            Msg::KValues => simple::kvalues_body(sink),
            Msg::AttrInfo { max_index } => simple::attr_info_body(*max_index, sink),
        }
        Ok(())
    }
}

/// Serializes a message list in the version-2 envelope. The creation-order
/// field counts per message type, so the attributes of an object are
/// numbered 0..n independently of the other messages.
pub(crate) fn format_msgs(msgs: &[Msg], ctx: &mut FmtCtx<'_>, sink: &mut ByteSink) -> Result<()> {
    let mut order_by_type = [0u16; 22];
    for msg in msgs {
        let mut body = ByteSink::new();
        msg.format_body(ctx, &mut body)?;
        let code = msg.type_code();
        let order = order_by_type[code as usize];
        order_by_type[code as usize] += 1;
        sink.put_u8(code);
        sink.put_u16(body.len() as u16);
        sink.put_u8(0);
        sink.put_u16(order);
        sink.put_sink(&body);
    }
    Ok(())
}
