//! HDF5 file writer.
//!
//! Owns the output channel, the group/dataset arenas, the file-wide global
//! heap and the end-of-file address. Serialization is two-pass: pass 1 lays
//! every metadata block out in a scratch buffer to fix its position, the
//! data phase appends raw chunks behind the measured metadata, and `close`
//! re-emits the metadata with final addresses and writes it at byte 0 —
//! where it ends exactly at the first raw chunk.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, trace};

use crate::btree::format_chunk_btree;
use crate::checksum::jenkins_lookup3;
use crate::dataset::{for_each_row, write_pad, write_run, ChunkRecord, Dataset, ElemCtx, Row};
use crate::dtype::DType;
use crate::error::{check_name, NcError, Result};
use crate::gheap::GlobalHeap;
use crate::group::Group;
use crate::msg::{AttrMsg, FmtCtx, LinkTarget};
use crate::objhdr::format_object_header;
use crate::sink::{ByteSink, ChunkSink, PAD_BYTE};
use crate::value::{Data, Value};

/// The leading eight bytes of every HDF5 file.
pub const SUPERBLOCK_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

const ROOT: usize = 0;
const EXTENSION: usize = 1;

/// Handle to a group in the file's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(pub(crate) usize);

/// Handle to a dataset in the file's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetId(pub(crate) usize);

impl DatasetId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Writer lifecycle phase. Transitions are strict:
/// defining → writing (at `end_define`) → closed (at `close`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Defining,
    Writing,
    Closed,
}

/// File-creation options.
#[derive(Debug, Clone, Default)]
pub struct CreateOpts {
    /// Replace an existing file instead of failing.
    pub overwrite: bool,
    /// Modification time, milliseconds since the epoch; 0 means "now".
    pub mod_time_ms: u64,
}

/// A block the layout driver can place: each formats itself and may enqueue
/// further blocks.
#[derive(Debug, Clone, Copy)]
enum Block {
    Superblock,
    Group(usize),
    Dataset(usize),
    Btree(usize),
}

/// Which of the two metadata passes is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Sizing pass: fixes every block position, emits placeholder offsets.
    Size,
    /// Final pass: re-emits with resolved addresses at identical sizes.
    Emit,
}

#[derive(Debug)]
pub struct Hdf5File {
    path: PathBuf,
    out: Option<std::fs::File>,
    status: FileStatus,
    poisoned: bool,
    pub(crate) groups: Vec<Group>,
    pub(crate) datasets: Vec<Dataset>,
    heap: GlobalHeap,
    group_pos: Vec<u64>,
    dataset_pos: Vec<u64>,
    btree_pos: Vec<u64>,
    heap_pos: u64,
    metadata_size: u64,
    eof: u64,
    mod_secs: u32,
    mod_ms: u64,
}

impl Hdf5File {
    /// Opens `path` for writing and seeds the root and superblock-extension
    /// objects. Fails if the file exists unless `overwrite` is set.
    pub fn create<P: AsRef<Path>>(path: P, opts: &CreateOpts) -> Result<Hdf5File> {
        let path = path.as_ref().to_path_buf();
        let mut open = OpenOptions::new();
        open.write(true);
        if opts.overwrite {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }
        let out = open.open(&path).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                NcError::Invalid(format!(
                    "{}: file exists and overwrite is disabled",
                    path.display()
                ))
            } else {
                NcError::Io(e)
            }
        })?;
        let mod_ms = if opts.mod_time_ms != 0 {
            opts.mod_time_ms
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        };
        debug!("created {} (mod time {mod_ms} ms)", path.display());
        Ok(Hdf5File {
            path,
            out: Some(out),
            status: FileStatus::Defining,
            poisoned: false,
            groups: vec![Group::root(), Group::extension()],
            datasets: Vec::new(),
            heap: GlobalHeap::new(),
            group_pos: Vec::new(),
            dataset_pos: Vec::new(),
            btree_pos: Vec::new(),
            heap_pos: 0,
            metadata_size: 0,
            eof: 0,
            mod_secs: (mod_ms / 1000) as u32,
            mod_ms,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> GroupId {
        GroupId(ROOT)
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Modification time as given (or sampled) at creation.
    pub fn mod_time_ms(&self) -> u64 {
        self.mod_ms
    }

    /// Current end-of-file address (next raw-data write position).
    pub fn eof_addr(&self) -> u64 {
        self.eof
    }

    /// Byte length of the metadata prefix, fixed by pass 1.
    pub fn metadata_size(&self) -> u64 {
        self.metadata_size
    }

    /// File-wide global heap collection address (0 when the file carries no
    /// variable-length metadata).
    pub fn heap_addr(&self) -> u64 {
        self.heap_pos
    }

    /// Object-header address of a group, fixed by pass 1.
    pub fn group_header_addr(&self, group: GroupId) -> u64 {
        self.group_pos[group.0]
    }

    /// Object-header address of a dataset, fixed by pass 1.
    pub fn dataset_header_addr(&self, ds: DatasetId) -> u64 {
        self.dataset_pos[ds.0]
    }

    /// The dataset's chunk table in row-major order.
    pub fn chunk_records(&self, ds: DatasetId) -> &[ChunkRecord] {
        &self.datasets[ds.0].chunks
    }

    fn ensure_live(&self) -> Result<()> {
        if self.poisoned {
            return Err(NcError::State(
                "writer disabled by an earlier fatal error".into(),
            ));
        }
        Ok(())
    }

    fn ensure_defining(&self, op: &str) -> Result<()> {
        self.ensure_live()?;
        match self.status {
            FileStatus::Defining => Ok(()),
            FileStatus::Writing => Err(NcError::State(format!("{op} after end_define"))),
            FileStatus::Closed => Err(NcError::State(format!("{op} after close"))),
        }
    }

    // ── Definition phase ─────────────────────────────────────────────────

    pub fn add_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId> {
        self.ensure_defining("add_group")?;
        check_name(name)?;
        let parent_path = {
            let p = &self.groups[parent.0];
            if p.has_child(name) {
                return Err(NcError::Invalid(format!(
                    "{}: duplicate child name {name:?}",
                    p.path
                )));
            }
            p.path.clone()
        };
        let id = self.groups.len();
        self.groups
            .push(Group::child(join_path(&parent_path, name), parent.0));
        self.groups[parent.0]
            .children
            .push((name.to_owned(), LinkTarget::Group(id)));
        Ok(GroupId(id))
    }

    /// Declares a dataset. `dims` of `None` makes an attribute-only carrier;
    /// an empty vector makes a scalar. A missing chunk shape means
    /// contiguous storage.
    #[allow(clippy::too_many_arguments)]
    pub fn add_dataset(
        &mut self,
        parent: GroupId,
        name: &str,
        dtype: DType,
        fixed_len: usize,
        dims: Option<Vec<u64>>,
        chunk_dims: Option<Vec<u64>>,
        deflate_level: u32,
        fill: Option<Value>,
    ) -> Result<DatasetId> {
        self.ensure_defining("add_dataset")?;
        check_name(name)?;
        let parent_path = {
            let p = &self.groups[parent.0];
            if p.has_child(name) {
                return Err(NcError::Invalid(format!(
                    "{}: duplicate child name {name:?}",
                    p.path
                )));
            }
            p.path.clone()
        };
        let id = self.datasets.len();
        let ds = Dataset::new(
            join_path(&parent_path, name),
            dtype,
            fixed_len,
            dims,
            chunk_dims,
            deflate_level,
            fill,
        )?;
        self.datasets.push(ds);
        self.groups[parent.0]
            .children
            .push((name.to_owned(), LinkTarget::Dataset(id)));
        Ok(DatasetId(id))
    }

    pub fn add_group_attr(&mut self, group: GroupId, name: &str, value: Value) -> Result<()> {
        self.ensure_defining("add_attribute")?;
        let msg = attr_from_value(name, value, &self.groups[group.0].path)?;
        let g = &mut self.groups[group.0];
        if g.attrs.iter().any(|a| a.name == name) {
            return Err(NcError::Invalid(format!(
                "{}: duplicate attribute {name:?}",
                g.path
            )));
        }
        g.attrs.push(msg);
        Ok(())
    }

    pub fn add_dataset_attr(&mut self, ds: DatasetId, name: &str, value: Value) -> Result<()> {
        self.ensure_defining("add_attribute")?;
        let msg = attr_from_value(name, value, &self.datasets[ds.0].path)?;
        let d = &mut self.datasets[ds.0];
        if d.attrs.iter().any(|a| a.name == name) {
            return Err(NcError::Invalid(format!(
                "{}: duplicate attribute {name:?}",
                d.path
            )));
        }
        d.attrs.push(msg);
        Ok(())
    }

    /// Appends a pre-built attribute, bypassing the user-type restriction.
    /// The convention layer uses this for the dimension-scale attributes.
    pub(crate) fn push_dataset_attr(&mut self, ds: DatasetId, msg: AttrMsg) {
        self.datasets[ds.0].attrs.push(msg);
    }

    /// Freezes the definition: assembles every object's message list and
    /// runs the sizing pass, fixing all block positions and the address
    /// where raw data begins.
    pub fn end_define(&mut self) -> Result<()> {
        self.ensure_defining("end_define")?;
        for g in &mut self.groups {
            g.assemble_msgs();
        }
        for i in 0..self.datasets.len() {
            self.datasets[i].assemble_msgs(i);
        }
        self.format_pass(Pass::Size)?;
        self.eof = self.metadata_size;
        self.status = FileStatus::Writing;
        debug!(
            "metadata layout fixed: {} bytes, raw data begins at {}",
            self.metadata_size, self.eof
        );
        Ok(())
    }

    // ── Data phase ───────────────────────────────────────────────────────

    /// Writes one chunk of a dataset. `start` is `None` exactly for scalar
    /// variables; `linear` accepts a flat payload of chunk or edge volume.
    pub fn write_chunk(
        &mut self,
        ds: DatasetId,
        start: Option<&[u64]>,
        value: &Value,
        linear: bool,
    ) -> Result<()> {
        self.ensure_live()?;
        match self.status {
            FileStatus::Writing => {}
            FileStatus::Defining => return Err(NcError::State("write before end_define".into())),
            FileStatus::Closed => return Err(NcError::State("write after close".into())),
        }
        let result = self.write_chunk_inner(ds, start, value, linear);
        if let Err(e) = &result {
            if matches!(e, NcError::Io(_) | NcError::Internal(_)) {
                // Fatal: disable the writer but release the handle.
                self.poisoned = true;
                self.out = None;
            }
        }
        result
    }

    fn write_chunk_inner(
        &mut self,
        ds: DatasetId,
        start: Option<&[u64]>,
        value: &Value,
        linear: bool,
    ) -> Result<()> {
        let d = &self.datasets[ds.0];
        let path = d.path.clone();
        let dims = d
            .dims
            .as_ref()
            .ok_or_else(|| NcError::Invalid(format!("{path}: variable carries no data")))?;
        match (dims.is_empty(), start) {
            (true, Some(_)) => {
                return Err(NcError::Shape(format!(
                    "{path}: scalar write takes no start indices"
                )))
            }
            (false, None) => {
                return Err(NcError::Shape(format!(
                    "{path}: non-scalar write requires start indices"
                )))
            }
            _ => {}
        }
        let start_ix: Vec<u64> = start.unwrap_or(&[]).to_vec();
        let chunk_idx = d.locate_chunk(&start_ix)?;
        if d.chunks[chunk_idx].written {
            return Err(NcError::State(format!(
                "{path}: chunk at {start_ix:?} already written"
            )));
        }
        let vdims = d.validate_value(&start_ix, value, linear)?;
        let cdims = d.chunk_shape.clone();
        let elem_size = d.elem_size();
        let dtype = d.dtype;
        let fixed_len = d.fixed_len;
        let level = d.deflate_level;

        let out = self
            .out
            .as_mut()
            .ok_or_else(|| NcError::State("output channel already released".into()))?;
        let mut eof = self.eof;
        out.seek(SeekFrom::Start(eof))?;
        while eof % 8 != 0 {
            out.write_all(&[PAD_BYTE])?;
            eof += 1;
        }
        let start_addr = eof;

        let (addr, size, end) = if dtype == DType::VarStr {
            // Per-variable heap: the strings live in their own collection
            // written immediately before the reference list.
            let strings = match value.data() {
                Data::VarStr(v) => v,
                _ => {
                    return Err(NcError::Internal(format!(
                        "{path}: validated payload lost its string tag"
                    )))
                }
            };
            let mut slots: Vec<&str> = Vec::new();
            for_each_row(&cdims, &vdims, |row| {
                match row {
                    Row::Data {
                        flat_start,
                        count,
                        pad,
                    } => {
                        for s in &strings[flat_start..flat_start + count] {
                            slots.push(s.as_str());
                        }
                        for _ in 0..pad {
                            slots.push("");
                        }
                    }
                    Row::Pad { count } => {
                        for _ in 0..count {
                            slots.push("");
                        }
                    }
                }
                Ok(())
            })?;
            let mut gcol = GlobalHeap::new();
            for s in &slots {
                gcol.put(s.as_bytes());
            }
            let mut heap_bytes = ByteSink::new();
            gcol.format(&mut heap_bytes);
            out.write_all(heap_bytes.bytes())?;
            let refs_addr = start_addr + heap_bytes.len();
            let mut refs = ByteSink::new();
            for (i, s) in slots.iter().enumerate() {
                refs.put_u32(s.len() as u32);
                refs.put_u64(start_addr);
                refs.put_u32(i as u32 + 1);
            }
            out.write_all(refs.bytes())?;
            (refs_addr, refs.len(), refs_addr + refs.len())
        } else {
            let mut sink = ChunkSink::new(&mut *out, level);
            let mut ectx = ElemCtx {
                dataset_pos: &[],
                heap: None,
                heap_addr: 0,
            };
            for_each_row(&cdims, &vdims, |row| match row {
                Row::Data {
                    flat_start,
                    count,
                    pad,
                } => {
                    write_run(
                        &mut sink,
                        value.data(),
                        flat_start,
                        count,
                        dtype,
                        fixed_len,
                        &mut ectx,
                    )?;
                    write_pad(&mut sink, elem_size, pad)
                }
                Row::Pad { count } => write_pad(&mut sink, elem_size, count),
            })?;
            let size = sink.finish()?;
            (start_addr, size, start_addr + size)
        };

        let record = &mut self.datasets[ds.0].chunks[chunk_idx];
        record.addr = addr;
        record.size = size;
        record.written = true;
        self.eof = end;
        trace!("{path}: chunk {chunk_idx} at {addr}, {size} bytes, eof {end}");
        Ok(())
    }

    // ── Finalization ─────────────────────────────────────────────────────

    /// Re-emits all metadata with final addresses and writes it at byte 0.
    /// Fails listing every unwritten chunk.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_live()?;
        match self.status {
            FileStatus::Writing => {}
            FileStatus::Defining => return Err(NcError::State("close before end_define".into())),
            FileStatus::Closed => return Err(NcError::State("file already closed".into())),
        }
        let mut missing = Vec::new();
        for d in &self.datasets {
            for c in &d.chunks {
                if !c.written {
                    missing.push(format!("{} chunk at {:?}", d.path, c.start));
                }
            }
        }
        if !missing.is_empty() {
            return Err(NcError::State(format!(
                "close with unwritten chunks: {}",
                missing.join(", ")
            )));
        }
        let result = self.close_inner();
        if result.is_err() {
            self.poisoned = true;
        }
        self.out = None;
        if result.is_ok() {
            self.status = FileStatus::Closed;
        }
        result
    }

    fn close_inner(&mut self) -> Result<()> {
        let sink = self.format_pass(Pass::Emit)?;
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| NcError::State("output channel already released".into()))?;
        out.seek(SeekFrom::Start(0))?;
        out.write_all(sink.bytes())?;
        out.flush()?;
        debug!(
            "{}: closed, {} bytes of metadata, eof {}",
            self.path.display(),
            sink.len(),
            self.eof
        );
        Ok(())
    }

    // ── Two-pass layout driver ───────────────────────────────────────────

    /// Breadth-first traversal over all metadata blocks. On the sizing pass
    /// each block's position is captured; on the final pass it is verified
    /// and any divergence traps as an internal error.
    fn format_pass(&mut self, pass: Pass) -> Result<ByteSink> {
        if pass == Pass::Size {
            self.group_pos = vec![0; self.groups.len()];
            self.dataset_pos = vec![0; self.datasets.len()];
            self.btree_pos = vec![0; self.datasets.len()];
            self.heap_pos = 0;
        }
        let contig: Vec<(u64, u64)> = self
            .datasets
            .iter()
            .map(|d| {
                if !d.chunked && d.has_data() {
                    let c = &d.chunks[0];
                    (c.addr, c.size)
                } else {
                    (0, 0)
                }
            })
            .collect();

        let Hdf5File {
            groups,
            datasets,
            heap,
            group_pos,
            dataset_pos,
            btree_pos,
            heap_pos,
            mod_secs,
            eof,
            ..
        } = self;
        let times = *mod_secs;
        heap.clear();

        let mut sink = ByteSink::new();
        let mut queue: VecDeque<Block> = VecDeque::new();
        queue.push_back(Block::Superblock);
        while let Some(block) = queue.pop_front() {
            sink.align8();
            let pos = sink.pos();
            match block {
                Block::Superblock => {}
                Block::Group(g) => place(pass, &mut group_pos[g], pos, &groups[g].path)?,
                Block::Dataset(d) => place(pass, &mut dataset_pos[d], pos, &datasets[d].path)?,
                Block::Btree(d) => place(pass, &mut btree_pos[d], pos, &datasets[d].path)?,
            }
            let mut ctx = FmtCtx {
                group_pos: group_pos.as_slice(),
                dataset_pos: dataset_pos.as_slice(),
                btree_pos: btree_pos.as_slice(),
                heap_pos: *heap_pos,
                heap: &mut *heap,
                contig: &contig,
                mod_secs: times,
            };
            match block {
                Block::Superblock => {
                    sink.put_bytes(&SUPERBLOCK_SIGNATURE);
                    sink.put_u8(2); // superblock version
                    sink.put_u8(8); // size of offsets
                    sink.put_u8(8); // size of lengths
                    sink.put_u8(0); // consistency flags
                    sink.put_u64(0); // base address
                    sink.put_u64(ctx.group_pos[EXTENSION]);
                    sink.put_u64(*eof);
                    sink.put_u64(ctx.group_pos[ROOT]);
                    let digest = jenkins_lookup3(sink.bytes_at(0, sink.pos() as usize), 0);
                    sink.put_u32(digest);
                    queue.push_back(Block::Group(EXTENSION));
                    queue.push_back(Block::Group(ROOT));
                }
                Block::Group(g) => {
                    format_object_header(&groups[g].msgs, times, &mut ctx, &mut sink)?;
                    for (_, target) in &groups[g].children {
                        queue.push_back(match target {
                            LinkTarget::Group(c) => Block::Group(*c),
                            LinkTarget::Dataset(d) => Block::Dataset(*d),
                        });
                    }
                }
                Block::Dataset(d) => {
                    format_object_header(&datasets[d].msgs, times, &mut ctx, &mut sink)?;
                    if datasets[d].chunked {
                        queue.push_back(Block::Btree(d));
                    }
                }
                Block::Btree(d) => format_chunk_btree(&datasets[d], &mut sink),
            }
        }
        if !heap.is_empty() {
            sink.align8();
            place(pass, heap_pos, sink.pos(), "global heap")?;
            heap.format(&mut sink);
        }
        sink.align8();

        match pass {
            Pass::Size => self.metadata_size = sink.len(),
            Pass::Emit => {
                if sink.len() != self.metadata_size {
                    return Err(NcError::Internal(format!(
                        "two-pass size mismatch: pass 1 measured {} bytes, pass 2 produced {}",
                        self.metadata_size,
                        sink.len()
                    )));
                }
            }
        }
        Ok(sink)
    }
}

/// Records a block position on the sizing pass, verifies it on the final
/// pass.
fn place(pass: Pass, slot: &mut u64, pos: u64, what: &str) -> Result<()> {
    match pass {
        Pass::Size => {
            *slot = pos;
            Ok(())
        }
        Pass::Emit if *slot == pos => Ok(()),
        Pass::Emit => Err(NcError::Internal(format!(
            "two-pass layout diverged at {what}: pass 1 placed it at {slot}, pass 2 at {pos}"
        ))),
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Derives an attribute message from a caller value: scalar or rank-1 only,
/// fixed strings sized to the longest element plus a terminator.
fn attr_from_value(name: &str, value: Value, owner_path: &str) -> Result<AttrMsg> {
    check_name(name)?;
    if value.rank() > 1 {
        return Err(NcError::Invalid(format!(
            "{owner_path}: attribute {name:?} has rank {}, only scalar and 1-D values are supported",
            value.rank()
        )));
    }
    let dtype = value.data().dtype();
    if !dtype.is_user_type() {
        return Err(NcError::Invalid(format!(
            "{owner_path}: attribute {name:?} uses internal datatype {dtype:?}"
        )));
    }
    let fixed_len = if dtype == DType::FixedStr {
        value.max_str_len() + 1
    } else {
        0
    };
    Ok(AttrMsg {
        name: name.to_owned(),
        dtype,
        fixed_len,
        value,
    })
}
