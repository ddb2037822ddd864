//! Cached mesh decoding and OBJ conversion
//!
//! This crate turns the engine's cached `.mesh` payloads into Wavefront OBJ text.
//! It is shared by:
//! - `cache-export` (cache extraction and conversion tool)
//! - anything else that only needs the byte-stream transform
//!
//! # Modules
//!
//! - [`formats`] - Version sniffing plus the 1.0x text and 2.00 binary decoders
//! - [`model`] - Intermediate vertex/face model
//! - [`obj`] - OBJ emitter
//! - [`error`] - Typed decode errors
//!
//! # Example
//!
//! ```
//! use mesh_common::{ObjOptions, convert_bytes};
//!
//! let body = b"version 1.01\n0\n";
//! let obj = convert_bytes(body, &ObjOptions::default()).unwrap();
//! assert_eq!(obj, "# ROBLOX .mesh version 1.0 (scale = 1.0)\ns 1\n");
//! ```

pub mod error;
pub mod formats;
pub mod model;
pub mod obj;

use std::io::{Read, Write};

pub use error::{FormatError, MeshError, Result};
pub use formats::{DecodedMesh, MeshVersion, decode, looks_like_mesh};
pub use model::{Face, Mesh, Vertex};
pub use obj::{ObjOptions, write_obj};

/// What a successful conversion produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub version: MeshVersion,
    pub vertex_count: usize,
    pub face_count: usize,
}

/// Decode a mesh stream and write it as OBJ.
///
/// Nothing is written unless the whole input decodes, so a failed call leaves
/// `output` untouched. The reader is consumed byte by byte for 1.0x meshes;
/// pass a buffered reader.
pub fn convert<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    options: &ObjOptions,
) -> Result<ConversionSummary> {
    let mesh = decode(input)?.into_mesh();

    write_obj(output, &mesh, options)?;

    Ok(ConversionSummary {
        version: mesh.version,
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
    })
}

/// Convert an in-memory mesh to OBJ text.
pub fn convert_bytes(input: &[u8], options: &ObjOptions) -> Result<String> {
    let mut reader = input;
    let mut out = Vec::new();
    convert(&mut reader, &mut out, options)?;
    // The emitter only writes ASCII
    Ok(String::from_utf8_lossy(&out).into_owned())
}
