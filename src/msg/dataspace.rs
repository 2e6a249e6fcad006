//! Dataspace message (type 1), version 2.

use crate::sink::ByteSink;

const SPACE_SCALAR: u8 = 0;
const SPACE_SIMPLE: u8 = 1;
const SPACE_NULL: u8 = 2;

/// Extent of a dataset or attribute.
#[derive(Debug, Clone)]
pub(crate) enum SpaceMsg {
    /// "No data" carrier.
    Null,
    /// Single element, rank 0.
    Scalar,
    /// Rank-N extent; maximum sizes are emitted equal to the current sizes
    /// (no unlimited dimensions).
    Simple(Vec<u64>),
}

impl SpaceMsg {
    /// Dataspace for a value of the given shape.
    pub(crate) fn for_shape(shape: &[u64]) -> SpaceMsg {
        if shape.is_empty() {
            SpaceMsg::Scalar
        } else {
            SpaceMsg::Simple(shape.to_vec())
        }
    }

    pub(crate) fn format_body(&self, sink: &mut ByteSink) {
        sink.put_u8(2);
        match self {
            SpaceMsg::Null => {
                sink.put_u8(0);
                sink.put_u8(0);
                sink.put_u8(SPACE_NULL);
            }
            SpaceMsg::Scalar => {
                sink.put_u8(0);
                sink.put_u8(0);
                sink.put_u8(SPACE_SCALAR);
            }
            SpaceMsg::Simple(dims) => {
                sink.put_u8(dims.len() as u8);
                sink.put_u8(1); // max sizes follow
                sink.put_u8(SPACE_SIMPLE);
                for &d in dims {
                    sink.put_u64(d);
                }
                for &d in dims {
                    sink.put_u64(d);
                }
            }
        }
    }
}
