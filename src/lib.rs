//! Pure-Rust NetCDF-4 writer.
//!
//! Models a scientific dataset as a tree of groups, dimensions, typed
//! multi-dimensional variables and attributes, and serializes it as a single
//! self-describing HDF5 file (version-2 superblock, object-header v2,
//! chunked or contiguous raw data, optional DEFLATE) whose logical schema
//! matches the NetCDF-4 data model.
//!
//! The writer is single-threaded and two-phase: definition calls build an
//! in-memory tree, `end_define` fixes the metadata layout, `write` calls
//! append chunk data, and `close` emits the final metadata at byte 0.
//!
//! ```no_run
//! use nc4::{CreateOpts, DType, NcFile, Value};
//!
//! # fn main() -> nc4::Result<()> {
//! let mut file = NcFile::create("tavg.nc", &CreateOpts::default())?;
//! let root = file.root();
//! file.add_dimension(root, "time", 4)?;
//! let v = file.add_variable(root, "tavg", DType::Float, &["time"])?;
//! file.add_var_attr(v, "units", Value::from("K"))?;
//! file.end_define()?;
//! file.write(v, Some(&[0]), &Value::from(vec![270.5f32, 271.0, 271.5, 272.0]))?;
//! file.close()?;
//! # Ok(()) }
//! ```

pub mod checksum;
pub mod dtype;
pub mod error;
pub mod file;
pub mod gheap;
pub mod nc;
pub mod sink;
pub mod value;

mod btree;
mod dataset;
mod group;
mod msg;
mod objhdr;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level re-exports for the common entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// The NetCDF-4 convention-layer file writer — the primary entry point.
pub use nc::NcFile;
/// Handles into a file's dimension and variable arenas.
pub use nc::{DimId, VarId};
/// Per-variable storage options (chunks, DEFLATE level, fill).
pub use nc::VarOpts;

/// The bare HDF5 serializer underneath the convention layer.
pub use file::Hdf5File;
/// File-creation options shared by both layers.
pub use file::CreateOpts;
/// Writer lifecycle phase.
pub use file::FileStatus;
/// Handles into a file's group and dataset arenas.
pub use file::{DatasetId, GroupId};
/// The leading eight bytes of every HDF5 file.
pub use file::SUPERBLOCK_SIGNATURE;

/// One chunk's start indices, disk address and on-disk size.
pub use dataset::ChunkRecord;
/// Datatype tags.
pub use dtype::DType;
/// Typed, shaped payloads for attributes, fills and chunk data.
pub use value::{Data, Value};

/// Crate-wide error type and result alias.
pub use error::{NcError, Result};

/// Jenkins lookup3 digest used by object headers and the superblock.
pub use checksum::jenkins_lookup3;
