//! Error types for mesh decoding and conversion

use std::io;

/// Decode failure caused by the content of the input stream.
///
/// Every variant aborts the conversion. Nothing is recovered locally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// Stream does not start with the `version ` token
    #[error("not a mesh file (missing \"version \" token)")]
    NotAMeshFile,

    /// Version tag is not 1.00, 1.01 or 2.00
    #[error("unknown mesh version {0:?}")]
    UnknownVersion(String),

    /// v1 face count line is not a non-negative integer
    #[error("malformed face count line {0:?}")]
    MalformedFaceCount(String),

    /// v1 tuple field could not be parsed as a float
    #[error("malformed number {0:?} in tuple stream")]
    MalformedNumber(String),

    /// v1 tuple closed with the wrong number of fields
    #[error("tuple {index} has {fields} fields, expected 3")]
    MalformedTuple { index: usize, fields: usize },

    /// Stream ended before the declared geometry was read
    #[error("truncated geometry: expected {expected} {unit}, found {found}")]
    TruncatedGeometry {
        unit: &'static str,
        expected: u64,
        found: u64,
    },

    /// v2 header declares a size other than the fixed layout
    #[error("invalid mesh header size {found} (expected {expected})")]
    InvalidHeaderSize { found: u16, expected: u16 },

    /// v2 vertex record width has no decoder
    #[error("unsupported vertex record size {0} (expected 36 or 40)")]
    UnsupportedVertexRecordSize(u8),
}

/// Error returned by the conversion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MeshError {
    /// The format error behind this failure, if the input itself was at fault.
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            MeshError::Format(e) => Some(e),
            MeshError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MeshError>;
