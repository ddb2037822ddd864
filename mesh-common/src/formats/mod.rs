//! Cached mesh file formats
//!
//! A mesh file is a 13-byte version preamble followed by one of two bodies:
//!
//! - [`text`] - versions 1.00 and 1.01, bracketed float tuples
//! - [`binary`] - version 2.00, fixed header plus little-endian record arrays
//!
//! The two decoders share nothing but the preamble. [`decode`] sniffs the
//! version once and hands the rest of the stream to the matching decoder.

pub mod binary;
pub mod header;
pub mod text;
pub mod version;

pub use binary::{BinaryGeometry, decode_binary};
pub use header::{MeshHeaderV2, VertexLayout};
pub use text::{TextGeometry, decode_text};
pub use version::{MeshVersion, VERSION_TAG_LEN, VERSION_TOKEN, looks_like_mesh, sniff_version};

use std::io::{self, Read};

use crate::error::Result;
use crate::model::Mesh;

/// Geometry as produced by one of the two decoders.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMesh {
    Text(TextGeometry),
    Binary(BinaryGeometry),
}

impl DecodedMesh {
    /// Flatten into the common model consumed by the emitter.
    pub fn into_mesh(self) -> Mesh {
        match self {
            DecodedMesh::Text(g) => g.into_mesh(),
            DecodedMesh::Binary(g) => g.into_mesh(),
        }
    }
}

/// Sniff the version and decode the whole body.
pub fn decode<R: Read>(r: &mut R) -> Result<DecodedMesh> {
    let version = sniff_version(r)?;
    tracing::debug!("Detected mesh version {}", version);

    match version {
        MeshVersion::V1_00 | MeshVersion::V1_01 => decode_text(r, version).map(DecodedMesh::Text),
        MeshVersion::V2_00 => decode_binary(r).map(DecodedMesh::Binary),
    }
}

/// Fill `buf` from `r`, stopping early only at end of stream.
///
/// Returns the number of bytes read.
pub(crate) fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
