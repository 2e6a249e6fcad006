//! NetCDF-4 convention layer.
//!
//! [`NcFile`] is the primary entry point: the caller declares groups,
//! dimensions, variables and attributes; `end_define` freezes the schema,
//! synthesizes the dimension-scale datasets and cross-reference attributes
//! (`CLASS`, `NAME`, `REFERENCE_LIST`, `DIMENSION_LIST`) that make the HDF5
//! stream readable as NetCDF-4, and fixes the metadata layout; `write` puts
//! chunk data; `close` emits the final metadata.
//!
//! All objects live in arenas owned by the file and are addressed by `Copy`
//! ids, so cross-references (dimension ↔ variable) never form owning cycles.

mod dim;
mod var;

pub use dim::DimId;
pub use var::{VarId, VarOpts};

use log::debug;

use crate::dataset::ChunkRecord;
use crate::dtype::DType;
use crate::error::{check_name, NcError, Result};
use crate::file::{CreateOpts, DatasetId, FileStatus, GroupId, Hdf5File};
use crate::msg::AttrMsg;
use crate::value::{Data, Value};

use dim::NcDim;
use var::NcVar;

/// The `NAME` attribute text of a dimension scale with no coordinate
/// variable, completed with the dimension length right-aligned in ten
/// columns.
const PHANTOM_DIM_NAME: &str = "This is a netCDF dimension but not a netCDF variable.";

/// A NetCDF-4 file being written.
#[derive(Debug)]
pub struct NcFile {
    hdf: Hdf5File,
    dims: Vec<NcDim>,
    vars: Vec<NcVar>,
    /// Dimension scales created for coordinate-less dimensions, zero-filled
    /// right after the metadata layout pass.
    hidden_scales: Vec<(DatasetId, u64)>,
}

impl NcFile {
    /// Creates the output file and an empty dataset tree.
    pub fn create<P: AsRef<std::path::Path>>(path: P, opts: &CreateOpts) -> Result<NcFile> {
        Ok(NcFile {
            hdf: Hdf5File::create(path, opts)?,
            dims: Vec::new(),
            vars: Vec::new(),
            hidden_scales: Vec::new(),
        })
    }

    pub fn root(&self) -> GroupId {
        self.hdf.root()
    }

    pub fn status(&self) -> FileStatus {
        self.hdf.status()
    }

    pub fn path(&self) -> &std::path::Path {
        self.hdf.path()
    }

    pub fn mod_time_ms(&self) -> u64 {
        self.hdf.mod_time_ms()
    }

    /// Byte length of the metadata prefix (valid once defined).
    pub fn metadata_size(&self) -> u64 {
        self.hdf.metadata_size()
    }

    /// Current end-of-file address.
    pub fn eof_addr(&self) -> u64 {
        self.hdf.eof_addr()
    }

    /// File-wide global heap address (0 when unused).
    pub fn heap_addr(&self) -> u64 {
        self.hdf.heap_addr()
    }

    fn ensure_defining(&self, op: &str) -> Result<()> {
        match self.hdf.status() {
            FileStatus::Defining => Ok(()),
            FileStatus::Writing => Err(NcError::State(format!("{op} after end_define"))),
            FileStatus::Closed => Err(NcError::State(format!("{op} after close"))),
        }
    }

    // ── Definition ───────────────────────────────────────────────────────

    pub fn add_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId> {
        self.hdf.add_group(parent, name)
    }

    /// Declares a dimension of positive length in a group's namespace.
    pub fn add_dimension(&mut self, group: GroupId, name: &str, len: u64) -> Result<DimId> {
        self.ensure_defining("add_dimension")?;
        check_name(name)?;
        if len == 0 {
            return Err(NcError::Invalid(format!(
                "dimension {name:?}: length must be positive"
            )));
        }
        if self
            .dims
            .iter()
            .any(|d| d.group == group && d.name == name)
        {
            return Err(NcError::Invalid(format!(
                "duplicate dimension {name:?} in {}",
                self.hdf.groups[group.0].path
            )));
        }
        let id = DimId(self.dims.len());
        self.dims.push(NcDim::new(name.to_owned(), len, group));
        Ok(id)
    }

    /// Declares a variable over named dimensions with default storage
    /// (contiguous, no compression, no fill).
    pub fn add_variable(
        &mut self,
        group: GroupId,
        name: &str,
        dtype: DType,
        dims: &[&str],
    ) -> Result<VarId> {
        self.add_variable_with(group, name, dtype, dims, &VarOpts::default())
    }

    /// Declares a variable with explicit storage options. Dimension names
    /// resolve through the group's ancestors; an empty `dims` slice makes a
    /// scalar.
    pub fn add_variable_with(
        &mut self,
        group: GroupId,
        name: &str,
        dtype: DType,
        dims: &[&str],
        opts: &VarOpts,
    ) -> Result<VarId> {
        self.ensure_defining("add_variable")?;
        let mut dim_ids = Vec::with_capacity(dims.len());
        for dim_name in dims {
            let id = self.find_dimension(group, dim_name).ok_or_else(|| {
                NcError::Invalid(format!(
                    "{}: dimension {dim_name:?} not found in ancestor groups",
                    self.hdf.groups[group.0].path
                ))
            })?;
            dim_ids.push(id);
        }
        let lens: Vec<u64> = dim_ids.iter().map(|d| self.dims[d.0].len).collect();
        let dataset = self.hdf.add_dataset(
            group,
            name,
            dtype,
            opts.fixed_len,
            Some(lens),
            opts.chunks.clone(),
            opts.deflate_level,
            opts.fill.clone(),
        )?;
        let var = VarId(self.vars.len());
        self.vars.push(NcVar {
            name: name.to_owned(),
            group,
            dataset,
            dims: dim_ids.clone(),
            dtype,
        });
        for (axis, dim) in dim_ids.iter().enumerate() {
            self.dims[dim.0].referrers.push((var, axis as u32));
        }
        Ok(var)
    }

    /// Declares a "no data" variable that exists only to carry attributes.
    pub fn add_attr_variable(&mut self, group: GroupId, name: &str, dtype: DType) -> Result<VarId> {
        self.ensure_defining("add_variable")?;
        let fixed_len = if dtype == DType::FixedStr { 1 } else { 0 };
        let dataset = self
            .hdf
            .add_dataset(group, name, dtype, fixed_len, None, None, 0, None)?;
        let var = VarId(self.vars.len());
        self.vars.push(NcVar {
            name: name.to_owned(),
            group,
            dataset,
            dims: Vec::new(),
            dtype,
        });
        Ok(var)
    }

    pub fn add_group_attr(&mut self, group: GroupId, name: &str, value: Value) -> Result<()> {
        self.hdf.add_group_attr(group, name, value)
    }

    pub fn add_var_attr(&mut self, var: VarId, name: &str, value: Value) -> Result<()> {
        self.hdf.add_dataset_attr(self.vars[var.0].dataset, name, value)
    }

    /// Resolves a dimension name through the group and its ancestors
    /// (nearest declaration wins).
    pub fn find_dimension(&self, group: GroupId, name: &str) -> Option<DimId> {
        let mut g = Some(group.0);
        while let Some(gi) = g {
            if let Some(i) = self
                .dims
                .iter()
                .position(|d| d.group.0 == gi && d.name == name)
            {
                return Some(DimId(i));
            }
            g = self.hdf.groups[gi].parent;
        }
        None
    }

    /// Finds a variable by name in one group (no ancestor search).
    pub fn find_variable(&self, group: GroupId, name: &str) -> Option<VarId> {
        self.vars
            .iter()
            .position(|v| v.group == group && v.name == name)
            .map(VarId)
    }

    // ── Definition end ───────────────────────────────────────────────────

    /// Materializes dimension scales, fixes the metadata layout (serializer
    /// pass 1), and zero-fills the scales that have no coordinate variable.
    pub fn end_define(&mut self) -> Result<()> {
        self.ensure_defining("end_define")?;

        // Link every dimension to its scale dataset: the same-name variable
        // in its group, or a hidden float32 dataset of the dimension length.
        for i in 0..self.dims.len() {
            let (name, len, group) = {
                let d = &self.dims[i];
                (d.name.clone(), d.len, d.group)
            };
            let scale = match self.find_variable(group, &name) {
                Some(v) => {
                    self.dims[i].coord_var = Some(v);
                    self.vars[v.0].dataset
                }
                None => {
                    let ds = self.hdf.add_dataset(
                        group,
                        &name,
                        DType::Float,
                        0,
                        Some(vec![len]),
                        None,
                        0,
                        Some(Value::from(0.0f32)),
                    )?;
                    self.hidden_scales.push((ds, len));
                    ds
                }
            };
            self.dims[i].scale = Some(scale);
        }

        // Scale attributes: CLASS, NAME, and the referrer list.
        for i in 0..self.dims.len() {
            let (scale, name_text, referrers, skip_refs) = {
                let d = &self.dims[i];
                let scale = d
                    .scale
                    .ok_or_else(|| NcError::Internal(format!("dimension {:?} lost its scale", d.name)))?;
                let name_text = if d.coord_var.is_some() {
                    d.name.clone()
                } else {
                    format!("{PHANTOM_DIM_NAME}{:>10}", d.len)
                };
                let referrers: Vec<(DatasetId, u32)> = d
                    .referrers
                    .iter()
                    .map(|(v, ax)| (self.vars[v.0].dataset, *ax))
                    .collect();
                let skip_refs = d.referrers.len() == 1
                    && d.coord_var.map(|c| c == d.referrers[0].0).unwrap_or(false);
                (scale, name_text, referrers, skip_refs)
            };
            self.hdf
                .push_dataset_attr(scale, fixed_str_attr("CLASS", "DIMENSION_SCALE"));
            self.hdf
                .push_dataset_attr(scale, fixed_str_attr("NAME", &name_text));
            if !referrers.is_empty() && !skip_refs {
                let n = referrers.len() as u64;
                self.hdf.push_dataset_attr(
                    scale,
                    AttrMsg {
                        name: "REFERENCE_LIST".into(),
                        dtype: DType::CompoundRef,
                        fixed_len: 0,
                        value: Value::from_shape(Data::RefPairs(referrers), vec![n])?,
                    },
                );
            }
        }

        // DIMENSION_LIST on every non-scalar variable that is not itself a
        // rank-1 coordinate variable.
        for vi in 0..self.vars.len() {
            let (dataset, rows) = {
                let v = &self.vars[vi];
                if v.dims.is_empty() {
                    continue;
                }
                if v.dims.len() == 1 && self.dims[v.dims[0].0].coord_var == Some(VarId(vi)) {
                    continue;
                }
                let mut rows: Vec<Vec<DatasetId>> = Vec::with_capacity(v.dims.len());
                for d in &v.dims {
                    let scale = self.dims[d.0].scale.ok_or_else(|| {
                        NcError::Internal(format!("dimension {:?} has no scale", self.dims[d.0].name))
                    })?;
                    rows.push(vec![scale]);
                }
                (v.dataset, rows)
            };
            let n = rows.len() as u64;
            self.hdf.push_dataset_attr(
                dataset,
                AttrMsg {
                    name: "DIMENSION_LIST".into(),
                    dtype: DType::VlenRef,
                    fixed_len: 0,
                    value: Value::from_shape(Data::RefRows(rows), vec![n])?,
                },
            );
        }

        self.hdf.end_define()?;

        // Hidden scales carry all-zero data.
        for i in 0..self.hidden_scales.len() {
            let (ds, len) = self.hidden_scales[i];
            let zeros = Value::from(vec![0.0f32; len as usize]);
            self.hdf.write_chunk(ds, Some(&[0]), &zeros, false)?;
        }
        debug!(
            "definition ended: {} dims, {} vars, {} hidden scales",
            self.dims.len(),
            self.vars.len(),
            self.hidden_scales.len()
        );
        Ok(())
    }

    // ── Data phase and finalization ──────────────────────────────────────

    /// Writes one chunk of a variable; `start` is omitted exactly for
    /// scalars.
    pub fn write(&mut self, var: VarId, start: Option<&[u64]>, value: &Value) -> Result<()> {
        self.hdf
            .write_chunk(self.vars[var.0].dataset, start, value, false)
    }

    /// Writes one chunk from a flat payload of chunk volume (interior) or
    /// remainder volume (trailing edge).
    pub fn write_linear(&mut self, var: VarId, start: Option<&[u64]>, value: &Value) -> Result<()> {
        self.hdf
            .write_chunk(self.vars[var.0].dataset, start, value, true)
    }

    /// Finalizes the metadata and closes the output file.
    pub fn close(&mut self) -> Result<()> {
        self.hdf.close()
    }

    // ── Introspection ────────────────────────────────────────────────────

    /// The variable's chunk table in row-major order.
    pub fn chunk_records(&self, var: VarId) -> &[ChunkRecord] {
        self.hdf.chunk_records(self.vars[var.0].dataset)
    }

    /// The variable's declared datatype.
    pub fn var_dtype(&self, var: VarId) -> DType {
        self.vars[var.0].dtype
    }

    /// The dimension's declared length.
    pub fn dim_len(&self, dim: DimId) -> u64 {
        self.dims[dim.0].len
    }

    /// Object-header address of a variable's dataset.
    pub fn var_header_addr(&self, var: VarId) -> u64 {
        self.hdf.dataset_header_addr(self.vars[var.0].dataset)
    }

    /// Object-header address of a dimension's scale dataset (valid once
    /// defined).
    pub fn scale_header_addr(&self, dim: DimId) -> Option<u64> {
        self.dims[dim.0]
            .scale
            .map(|ds| self.hdf.dataset_header_addr(ds))
    }

    /// Chunk table of a dimension's scale dataset (valid once defined).
    pub fn scale_chunk_records(&self, dim: DimId) -> Option<&[ChunkRecord]> {
        self.dims[dim.0].scale.map(|ds| self.hdf.chunk_records(ds))
    }
}

/// Scalar fixed-length string attribute sized to the text plus a NUL.
fn fixed_str_attr(name: &str, text: &str) -> AttrMsg {
    AttrMsg {
        name: name.to_owned(),
        dtype: DType::FixedStr,
        fixed_len: text.len() + 1,
        value: Value::from(text),
    }
}
