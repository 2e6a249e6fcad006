//! Variables.

use crate::dtype::DType;
use crate::file::{DatasetId, GroupId};
use crate::nc::DimId;
use crate::value::Value;

/// Handle to a variable in the file's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarId(pub(crate) usize);

/// Storage and fill options for a variable declaration.
#[derive(Debug, Clone, Default)]
pub struct VarOpts {
    /// Chunk shape; absent means contiguous storage.
    pub chunks: Option<Vec<u64>>,
    /// DEFLATE level 0–9; non-zero requires a chunk shape.
    pub deflate_level: u32,
    /// Scalar fill value of the variable's type.
    pub fill: Option<Value>,
    /// Element byte length, fixed-length string variables only.
    pub fixed_len: usize,
}

#[derive(Debug)]
pub(crate) struct NcVar {
    pub name: String,
    pub group: GroupId,
    pub dataset: DatasetId,
    pub dims: Vec<DimId>,
    pub dtype: DType,
}
