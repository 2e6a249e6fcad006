//! Attribute message (type 12), version 3.
//!
//! The body nests a full datatype body and dataspace body, then the payload
//! formatted by the shared raw-data element encoder aimed at the in-memory
//! sink. Variable-length payload rows land in the file-wide global heap and
//! the body carries their `(length, heap address, index)` triples.

use super::dataspace::SpaceMsg;
use super::FmtCtx;
use crate::dataset::{write_run, ElemCtx};
use crate::dtype::DType;
use crate::error::Result;
use crate::sink::ByteSink;
use crate::value::Value;

#[derive(Debug, Clone)]
pub(crate) struct AttrMsg {
    pub name: String,
    pub dtype: DType,
    pub fixed_len: usize,
    pub value: Value,
}

impl AttrMsg {
    pub(crate) fn format_body(&self, ctx: &mut FmtCtx<'_>, sink: &mut ByteSink) -> Result<()> {
        let mut dt = ByteSink::new();
        self.dtype.format_body(self.fixed_len, &mut dt);
        let mut sp = ByteSink::new();
        SpaceMsg::for_shape(self.value.shape()).format_body(&mut sp);

        sink.put_u8(3);
        sink.put_u8(0);
        sink.put_u16(self.name.len() as u16 + 1);
        sink.put_u16(dt.len() as u16);
        sink.put_u16(sp.len() as u16);
        sink.put_u8(0); // ASCII name
        sink.put_bytes(self.name.as_bytes());
        sink.put_u8(0);
        sink.put_sink(&dt);
        sink.put_sink(&sp);

        let mut ectx = ElemCtx {
            dataset_pos: ctx.dataset_pos,
            heap: Some(&mut *ctx.heap),
            heap_addr: ctx.heap_pos,
        };
        write_run(
            sink,
            self.value.data(),
            0,
            self.value.elem_count() as usize,
            self.dtype,
            self.fixed_len,
            &mut ectx,
        )
    }
}
