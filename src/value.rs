//! Tagged data values.
//!
//! Attribute payloads, fill values and chunk data all enter the writer as a
//! [`Value`]: one [`Data`] tag (element type + owned elements in row-major
//! order) plus a shape vector (empty = scalar). The tag is inspected once at
//! ingress, validated against the declared datatype, and dispatched to a
//! monomorphic encoder; the caller's buffers are copied at hand-over and
//! never mutated.

use crate::dtype::DType;
use crate::error::{NcError, Result};
use crate::file::DatasetId;

/// Element storage, one variant per datatype family.
///
/// The reference-bearing variants exist for the dimension-scale convention
/// attributes; they resolve to file offsets during metadata emission.
#[derive(Debug, Clone)]
pub enum Data {
    Ubyte(Vec<u8>),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    /// Fixed-length ASCII strings (NUL-padded to the element length).
    Str(Vec<String>),
    /// Variable-length ASCII strings (stored through a global heap).
    VarStr(Vec<String>),
    /// Object references.
    Ref(Vec<DatasetId>),
    /// `{dataset, dimension}` compound records.
    RefPairs(Vec<(DatasetId, u32)>),
    /// Variable-length rows of object references.
    RefRows(Vec<Vec<DatasetId>>),
}

impl Data {
    /// Number of elements held.
    pub fn len(&self) -> usize {
        match self {
            Data::Ubyte(v) => v.len(),
            Data::Byte(v) => v.len(),
            Data::Short(v) => v.len(),
            Data::Int(v) => v.len(),
            Data::Long(v) => v.len(),
            Data::Float(v) => v.len(),
            Data::Double(v) => v.len(),
            Data::Str(v) => v.len(),
            Data::VarStr(v) => v.len(),
            Data::Ref(v) => v.len(),
            Data::RefPairs(v) => v.len(),
            Data::RefRows(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The datatype tag this payload serializes as.
    pub fn dtype(&self) -> DType {
        match self {
            Data::Ubyte(_) => DType::Ubyte,
            Data::Byte(_) => DType::Byte,
            Data::Short(_) => DType::Short,
            Data::Int(_) => DType::Int,
            Data::Long(_) => DType::Long,
            Data::Float(_) => DType::Float,
            Data::Double(_) => DType::Double,
            Data::Str(_) => DType::FixedStr,
            Data::VarStr(_) => DType::VarStr,
            Data::Ref(_) => DType::Ref,
            Data::RefPairs(_) => DType::CompoundRef,
            Data::RefRows(_) => DType::VlenRef,
        }
    }
}

/// A typed, shaped payload.
#[derive(Debug, Clone)]
pub struct Value {
    data: Data,
    shape: Vec<u64>,
}

impl Value {
    /// Builds a value from an element payload and a shape, checking that the
    /// shape's element product matches the payload length.
    pub fn from_shape(data: Data, shape: Vec<u64>) -> Result<Value> {
        let want: u64 = shape.iter().product();
        if want != data.len() as u64 {
            return Err(NcError::Shape(format!(
                "value shape {shape:?} implies {want} elements, payload holds {}",
                data.len()
            )));
        }
        Ok(Value { data, shape })
    }

    /// Re-shapes a flat value (element count must be preserved).
    pub fn with_shape(self, shape: Vec<u64>) -> Result<Value> {
        Value::from_shape(self.data, shape)
    }

    /// Rank-0 fixed-length string value.
    pub fn scalar_str(s: &str) -> Value {
        Value {
            data: Data::Str(vec![s.to_owned()]),
            shape: Vec::new(),
        }
    }

    /// Fixed-length string value from string slices, shape rank 1.
    pub fn strings<S: AsRef<str>>(items: &[S]) -> Value {
        let v: Vec<String> = items.iter().map(|s| s.as_ref().to_owned()).collect();
        let shape = vec![v.len() as u64];
        Value {
            data: Data::Str(v),
            shape,
        }
    }

    /// Variable-length string value from string slices, shape rank 1.
    pub fn var_strings<S: AsRef<str>>(items: &[S]) -> Value {
        let v: Vec<String> = items.iter().map(|s| s.as_ref().to_owned()).collect();
        let shape = vec![v.len() as u64];
        Value {
            data: Data::VarStr(v),
            shape,
        }
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn elem_count(&self) -> u64 {
        self.data.len() as u64
    }

    /// Longest string byte length (0 for non-string payloads) — used to size
    /// fixed-length string attribute cells.
    pub fn max_str_len(&self) -> usize {
        match &self.data {
            Data::Str(v) | Data::VarStr(v) => v.iter().map(|s| s.len()).max().unwrap_or(0),
            _ => 0,
        }
    }
}

macro_rules! value_from_scalar {
    ($t:ty, $variant:ident, $ctor:ident) => {
        impl Value {
            /// Rank-0 value holding one element of this type.
            pub fn $ctor(v: $t) -> Value {
                Value {
                    data: Data::$variant(vec![v]),
                    shape: Vec::new(),
                }
            }
        }

        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value::$ctor(v)
            }
        }
    };
}

macro_rules! value_from_slice {
    ($t:ty, $variant:ident) => {
        impl From<&[$t]> for Value {
            fn from(v: &[$t]) -> Value {
                Value {
                    data: Data::$variant(v.to_vec()),
                    shape: vec![v.len() as u64],
                }
            }
        }
        impl From<Vec<$t>> for Value {
            fn from(v: Vec<$t>) -> Value {
                let shape = vec![v.len() as u64];
                Value {
                    data: Data::$variant(v),
                    shape,
                }
            }
        }
    };
}

value_from_scalar!(u8, Ubyte, scalar_ubyte);
value_from_scalar!(i8, Byte, scalar_byte);
value_from_scalar!(i16, Short, scalar_short);
value_from_scalar!(i32, Int, scalar_int);
value_from_scalar!(i64, Long, scalar_long);
value_from_scalar!(f32, Float, scalar_float);
value_from_scalar!(f64, Double, scalar_double);
value_from_slice!(u8, Ubyte);
value_from_slice!(i8, Byte);
value_from_slice!(i16, Short);
value_from_slice!(i32, Int);
value_from_slice!(i64, Long);
value_from_slice!(f32, Float);
value_from_slice!(f64, Double);

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::scalar_str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value {
            data: Data::Str(vec![s]),
            shape: Vec::new(),
        }
    }
}
