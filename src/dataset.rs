//! Dataset objects (variables) and the raw-data element encoder.
//!
//! A dataset owns its schema (datatype, dimensions, optional chunk shape,
//! compression level, optional fill), its flat chunk-descriptor table in
//! row-major order, and its header message list. The chunk-payload walker
//! and the per-type element encoder here are also what attribute messages
//! and fill values aim at an in-memory sink.

use crate::dtype::DType;
use crate::error::{NcError, Result};
use crate::gheap::GlobalHeap;
use crate::msg::{AttrMsg, LayoutMsg, Msg, SpaceMsg};
use crate::sink::{DataSink, PAD_BYTE};
use crate::value::{Data, Value};

/// One chunk of a variable: starting indices, disk address and on-disk byte
/// size (post-compression). Addresses stay 0 until the chunk is written.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub start: Vec<u64>,
    pub addr: u64,
    pub size: u64,
    pub written: bool,
}

#[derive(Debug)]
pub(crate) struct Dataset {
    /// Absolute path; the local name lives in the parent group's link list.
    pub path: String,
    pub dtype: DType,
    pub fixed_len: usize,
    /// `None` = attribute-only carrier; `Some(vec![])` = scalar.
    pub dims: Option<Vec<u64>>,
    /// Declared chunked storage (as opposed to the implicit whole-variable
    /// rectangle used for contiguous layout).
    pub chunked: bool,
    /// Effective chunk rectangle: declared chunks, or the full dimensions.
    pub chunk_shape: Vec<u64>,
    pub chunk_counts: Vec<u64>,
    /// Row-major strides over the chunk grid.
    pub strides: Vec<u64>,
    pub deflate_level: u32,
    pub fill: Option<Value>,
    pub attrs: Vec<AttrMsg>,
    pub msgs: Vec<Msg>,
    pub chunks: Vec<ChunkRecord>,
}

impl Dataset {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        path: String,
        dtype: DType,
        fixed_len: usize,
        dims: Option<Vec<u64>>,
        chunk_dims: Option<Vec<u64>>,
        deflate_level: u32,
        fill: Option<Value>,
    ) -> Result<Dataset> {
        if !dtype.is_user_type() {
            return Err(NcError::Invalid(format!(
                "{path}: datatype {dtype:?} cannot be declared for a variable"
            )));
        }
        if dtype == DType::FixedStr && fixed_len == 0 {
            return Err(NcError::Invalid(format!(
                "{path}: fixed-length string variables need a positive element length"
            )));
        }
        if let Some(d) = &dims {
            if let Some(bad) = d.iter().find(|&&n| n == 0) {
                return Err(NcError::Invalid(format!(
                    "{path}: dimension length {bad} must be positive"
                )));
            }
        }
        if deflate_level > 9 {
            return Err(NcError::Invalid(format!(
                "{path}: compression level {deflate_level} outside 0..9"
            )));
        }
        match (&chunk_dims, &dims) {
            (Some(_), None) => {
                return Err(NcError::Invalid(format!(
                    "{path}: chunks declared on a variable without data"
                )))
            }
            (Some(_), Some(d)) if d.is_empty() => {
                return Err(NcError::Invalid(format!(
                    "{path}: chunks declared on a scalar variable"
                )))
            }
            (Some(c), Some(d)) => {
                if c.len() != d.len() {
                    return Err(NcError::Invalid(format!(
                        "{path}: chunk rank {} does not match variable rank {}",
                        c.len(),
                        d.len()
                    )));
                }
                for (axis, (&cd, &vd)) in c.iter().zip(d).enumerate() {
                    if cd == 0 || cd > vd {
                        return Err(NcError::Invalid(format!(
                            "{path}: chunk dimension {cd} on axis {axis} outside 1..{vd}"
                        )));
                    }
                }
            }
            (None, _) => {}
        }
        if deflate_level > 0 {
            if chunk_dims.is_none() {
                return Err(NcError::Invalid(format!(
                    "{path}: compression requires chunked storage"
                )));
            }
            if dtype.is_string() {
                return Err(NcError::Invalid(format!(
                    "{path}: string variables cannot be compressed"
                )));
            }
        }
        if let Some(f) = &fill {
            if !f.shape().is_empty() {
                return Err(NcError::Invalid(format!(
                    "{path}: fill value must be scalar"
                )));
            }
            if f.data().dtype() != dtype {
                return Err(NcError::Invalid(format!(
                    "{path}: fill value type {:?} does not match variable type {dtype:?}",
                    f.data().dtype()
                )));
            }
        }

        let chunked = chunk_dims.is_some();
        let (chunk_shape, chunk_counts, strides, chunks) = match &dims {
            None => (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            Some(d) => {
                let shape = chunk_dims.unwrap_or_else(|| d.clone());
                let counts: Vec<u64> = d
                    .iter()
                    .zip(&shape)
                    .map(|(&vd, &cd)| vd.div_ceil(cd))
                    .collect();
                let mut strides = vec![1u64; counts.len()];
                for i in (0..counts.len().saturating_sub(1)).rev() {
                    strides[i] = strides[i + 1] * counts[i + 1];
                }
                let total: u64 = counts.iter().product();
                let mut records = Vec::with_capacity(total as usize);
                for flat in 0..total {
                    let start: Vec<u64> = counts
                        .iter()
                        .enumerate()
                        .map(|(i, &c)| (flat / strides[i]) % c * shape[i])
                        .collect();
                    records.push(ChunkRecord {
                        start,
                        addr: 0,
                        size: 0,
                        written: false,
                    });
                }
                (shape, counts, strides, records)
            }
        };

        Ok(Dataset {
            path,
            dtype,
            fixed_len,
            dims,
            chunked,
            chunk_shape,
            chunk_counts,
            strides,
            deflate_level,
            fill,
            attrs: Vec::new(),
            msgs: Vec::new(),
            chunks,
        })
    }

    /// Bytes one element occupies in raw data.
    pub(crate) fn elem_size(&self) -> usize {
        self.dtype.disk_size(self.fixed_len)
    }

    /// True when the dataset carries raw data (not an attribute carrier).
    pub(crate) fn has_data(&self) -> bool {
        self.dims.is_some()
    }

    /// Maps a chunk's starting-index vector to its position in the flat
    /// descriptor table.
    pub(crate) fn locate_chunk(&self, start: &[u64]) -> Result<usize> {
        let dims = self.dims.as_ref().expect("no-data variables have no chunks");
        if start.len() != dims.len() {
            return Err(NcError::Shape(format!(
                "{}: start index rank {} does not match variable rank {}",
                self.path,
                start.len(),
                dims.len()
            )));
        }
        let mut index = 0u64;
        for (axis, &s) in start.iter().enumerate() {
            let cd = self.chunk_shape[axis];
            if s % cd != 0 {
                return Err(NcError::Shape(format!(
                    "{}: start index {s} on axis {axis} is not a multiple of chunk dimension {cd}",
                    self.path
                )));
            }
            let q = s / cd;
            if q >= self.chunk_counts[axis] {
                return Err(NcError::Shape(format!(
                    "{}: start index {s} on axis {axis} outside dimension {}",
                    self.path, dims[axis]
                )));
            }
            index += q * self.strides[axis];
        }
        if index as usize >= self.chunks.len() {
            return Err(NcError::Internal(format!(
                "{}: computed chunk index {index} outside table of {}",
                self.path,
                self.chunks.len()
            )));
        }
        Ok(index as usize)
    }

    /// Validates a chunk payload against the declared schema and returns the
    /// payload's rectangle (the edge-trimmed chunk dimensions).
    pub(crate) fn validate_value(
        &self,
        start: &[u64],
        value: &Value,
        linear: bool,
    ) -> Result<Vec<u64>> {
        let dims = self.dims.as_ref().expect("checked by caller");
        let observed = value.data().dtype();
        if observed != self.dtype {
            return Err(NcError::Shape(format!(
                "{}: declared type {:?}, observed element type {observed:?}",
                self.path, self.dtype
            )));
        }
        if dims.is_empty() {
            if value.elem_count() != 1 {
                return Err(NcError::Shape(format!(
                    "{}: scalar variable takes exactly one element, got {}",
                    self.path,
                    value.elem_count()
                )));
            }
            return Ok(Vec::new());
        }
        // Edge rectangle: chunk dims clipped to the variable extent.
        let edge: Vec<u64> = self
            .chunk_shape
            .iter()
            .zip(dims)
            .zip(start)
            .map(|((&cd, &vd), &s)| cd.min(vd - s))
            .collect();
        if linear {
            let full: u64 = self.chunk_shape.iter().product();
            let trimmed: u64 = edge.iter().product();
            let n = value.elem_count();
            if n == full {
                Ok(self.chunk_shape.clone())
            } else if n == trimmed {
                Ok(edge)
            } else {
                Err(NcError::Shape(format!(
                    "{}: linear payload of {n} elements matches neither chunk volume {full} nor edge volume {trimmed}",
                    self.path
                )))
            }
        } else {
            if value.rank() != dims.len() {
                return Err(NcError::Shape(format!(
                    "{}: payload rank {} does not match variable rank {}",
                    self.path,
                    value.rank(),
                    dims.len()
                )));
            }
            for (axis, &got) in value.shape().iter().enumerate() {
                let full = self.chunk_shape[axis];
                let trimmed = edge[axis];
                if got != full && got != trimmed {
                    return Err(NcError::Shape(format!(
                        "{}: payload length {got} on axis {axis}, expected {full} (or edge length {trimmed})",
                        self.path
                    )));
                }
            }
            Ok(value.shape().to_vec())
        }
    }

    /// Builds the header message list: datatype, dataspace, layout, fill,
    /// mod-time, filter pipeline when compressed, attribute-info, then the
    /// attributes.
    pub(crate) fn assemble_msgs(&mut self, id: usize) {
        let space = match &self.dims {
            None => SpaceMsg::Null,
            Some(d) if d.is_empty() => SpaceMsg::Scalar,
            Some(d) => SpaceMsg::Simple(d.clone()),
        };
        let layout = if self.chunked {
            LayoutMsg::Chunked {
                dataset: id,
                chunk_dims: self.chunk_shape.clone(),
                elem_size: self.elem_size() as u32,
            }
        } else {
            LayoutMsg::Contiguous { dataset: id }
        };
        let mut msgs = vec![
            Msg::Datatype {
                dtype: self.dtype,
                fixed_len: self.fixed_len,
            },
            Msg::Dataspace(space),
            Msg::Layout(layout),
            Msg::Fill {
                dtype: self.dtype,
                fixed_len: self.fixed_len,
                value: self.fill.take(),
            },
            Msg::ModTime,
        ];
        if self.deflate_level > 0 {
            msgs.push(Msg::Filter {
                level: self.deflate_level,
            });
        }
        msgs.push(Msg::AttrInfo {
            max_index: self.attrs.len() as u16,
        });
        msgs.extend(self.attrs.drain(..).map(Msg::Attribute));
        self.msgs = msgs;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Element encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Resolution context for reference and variable-length elements.
pub(crate) struct ElemCtx<'a> {
    /// Object-header position per dataset id (reference targets).
    pub dataset_pos: &'a [u64],
    /// Heap that variable-length payload rows go to.
    pub heap: Option<&'a mut GlobalHeap>,
    /// Collection address emitted in variable-length references.
    pub heap_addr: u64,
}

impl ElemCtx<'_> {
    fn heap(&mut self) -> Result<&mut GlobalHeap> {
        self.heap.as_deref_mut().ok_or_else(|| {
            NcError::Internal("variable-length payload outside a heap context".into())
        })
    }
}

/// Writes `count` elements starting at flat index `start`, little-endian,
/// row-major. The single dispatch point from value tag to wire encoding.
pub(crate) fn write_run<S: DataSink>(
    sink: &mut S,
    data: &Data,
    start: usize,
    count: usize,
    dtype: DType,
    fixed_len: usize,
    ctx: &mut ElemCtx<'_>,
) -> Result<()> {
    debug_assert_eq!(data.dtype(), dtype, "ingress validation must match tags");
    let end = start + count;
    match data {
        Data::Ubyte(v) => {
            sink.put(&v[start..end])?;
        }
        Data::Byte(v) => {
            for &x in &v[start..end] {
                sink.put_i8(x)?;
            }
        }
        Data::Short(v) => {
            for &x in &v[start..end] {
                sink.put_i16(x)?;
            }
        }
        Data::Int(v) => {
            for &x in &v[start..end] {
                sink.put_i32(x)?;
            }
        }
        Data::Long(v) => {
            for &x in &v[start..end] {
                sink.put_i64(x)?;
            }
        }
        Data::Float(v) => {
            for &x in &v[start..end] {
                sink.put_f32(x)?;
            }
        }
        Data::Double(v) => {
            for &x in &v[start..end] {
                sink.put_f64(x)?;
            }
        }
        Data::Str(v) => {
            for s in &v[start..end] {
                put_fixed_str(sink, s, fixed_len)?;
            }
        }
        Data::VarStr(v) => {
            for s in &v[start..end] {
                let addr = ctx.heap_addr;
                let index = ctx.heap()?.put(s.as_bytes());
                sink.put_u32(s.len() as u32)?;
                sink.put_u64(addr)?;
                sink.put_u32(index as u32)?;
            }
        }
        Data::Ref(v) => {
            for id in &v[start..end] {
                sink.put_u64(ctx.dataset_pos[id.index()])?;
            }
        }
        Data::RefPairs(v) => {
            for (id, axis) in &v[start..end] {
                sink.put_u64(ctx.dataset_pos[id.index()])?;
                sink.put_u32(*axis)?;
            }
        }
        Data::RefRows(rows) => {
            for row in &rows[start..end] {
                let mut bytes = Vec::with_capacity(row.len() * 8);
                for id in row {
                    bytes.extend_from_slice(&ctx.dataset_pos[id.index()].to_le_bytes());
                }
                let addr = ctx.heap_addr;
                let index = ctx.heap()?.put(&bytes);
                sink.put_u32(row.len() as u32)?;
                sink.put_u64(addr)?;
                sink.put_u32(index as u32)?;
            }
        }
    }
    Ok(())
}

/// ASCII bytes truncated or NUL-padded to the element length.
fn put_fixed_str<S: DataSink>(sink: &mut S, s: &str, fixed_len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() >= fixed_len {
        sink.put(&bytes[..fixed_len])
    } else {
        sink.put(bytes)?;
        for _ in bytes.len()..fixed_len {
            sink.put_u8(0)?;
        }
        Ok(())
    }
}

/// Fills `count` element slots with the pad sentinel.
pub(crate) fn write_pad<S: DataSink>(sink: &mut S, elem_size: usize, count: usize) -> Result<()> {
    const PADS: [u8; 64] = [PAD_BYTE; 64];
    let mut remaining = count * elem_size;
    while remaining > 0 {
        let n = remaining.min(PADS.len());
        sink.put(&PADS[..n])?;
        remaining -= n;
    }
    Ok(())
}

/// One row of a chunk rectangle.
pub(crate) enum Row {
    /// A row intersecting the payload: `count` elements from `flat_start`,
    /// then `pad` padded slots.
    Data {
        flat_start: usize,
        count: usize,
        pad: usize,
    },
    /// A row entirely outside the payload.
    Pad { count: usize },
}

/// Walks the chunk rectangle `cdims` row by row (last axis fastest) against
/// a payload of rectangle `vdims`, reporting where payload elements sit and
/// where padding is owed.
pub(crate) fn for_each_row<F>(cdims: &[u64], vdims: &[u64], mut f: F) -> Result<()>
where
    F: FnMut(Row) -> Result<()>,
{
    if cdims.is_empty() {
        return f(Row::Data {
            flat_start: 0,
            count: 1,
            pad: 0,
        });
    }
    let rank = cdims.len();
    let last_c = cdims[rank - 1] as usize;
    let last_v = vdims[rank - 1] as usize;
    // Strides through the payload, outer axes only.
    let mut vstride = vec![1usize; rank];
    for i in (0..rank - 1).rev() {
        vstride[i] = vstride[i + 1] * vdims[i + 1] as usize;
    }
    let outer = &cdims[..rank - 1];
    let mut ix = vec![0u64; outer.len()];
    loop {
        let inside = ix.iter().zip(vdims).all(|(&i, &v)| i < v);
        if inside {
            let flat_start: usize = ix
                .iter()
                .enumerate()
                .map(|(i, &x)| x as usize * vstride[i])
                .sum();
            f(Row::Data {
                flat_start,
                count: last_v,
                pad: last_c - last_v,
            })?;
        } else {
            f(Row::Pad { count: last_c })?;
        }
        let mut axis = outer.len();
        loop {
            if axis == 0 {
                return Ok(());
            }
            axis -= 1;
            ix[axis] += 1;
            if ix[axis] < outer[axis] {
                break;
            }
            ix[axis] = 0;
        }
    }
}
