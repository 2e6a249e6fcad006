//! Crate-wide error type and `Result` alias.
//!
//! Every failure is fail-fast: nothing inside the serializer retries, and a
//! fatal I/O or internal-invariant error poisons the writer so that all
//! subsequent calls fail with a state error. Messages carry the offending
//! path plus expected/actual values where applicable.

use core::fmt;
use std::io;

/// Errors surfaced by the NetCDF-4 writer.
#[derive(Debug)]
pub enum NcError {
    /// Invalid caller input: illegal name, duplicate child, bad chunk shape
    /// declaration, unknown dimension, unsupported attribute shape.
    Invalid(String),
    /// Operation issued in the wrong file phase (define / write / closed),
    /// or against a poisoned writer.
    State(String),
    /// Data value incompatible with the declared variable or chunk schema.
    Shape(String),
    /// Underlying write, seek, or deflate failure. Fatal: the writer becomes
    /// unusable, though the file handle is still released.
    Io(io::Error),
    /// Broken internal invariant (chunk index out of table, two-pass size
    /// divergence). Indicates a bug in the serializer, not in caller input.
    Internal(String),
}

impl fmt::Display for NcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NcError::Invalid(msg) => write!(f, "invalid input: {msg}"),
            NcError::State(msg) => write!(f, "operation out of order: {msg}"),
            NcError::Shape(msg) => write!(f, "shape mismatch: {msg}"),
            NcError::Io(err) => write!(f, "i/o failure: {err}"),
            NcError::Internal(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for NcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NcError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for NcError {
    fn from(err: io::Error) -> Self {
        NcError::Io(err)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NcError>;

/// Checks one component of an HDF5 path.
///
/// Accepted names are non-empty US-ASCII, start with `_` or a letter, and
/// continue with letters, digits, `-`, `_`, `:` or space.
pub fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let ok_first = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic());
    let ok_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | ' '));
    if ok_first && ok_rest {
        Ok(())
    } else {
        Err(NcError::Invalid(format!(
            "illegal name {name:?}: must match [_A-Za-z][-_: A-Za-z0-9]*"
        )))
    }
}
