//! Version 2.00 decoder (binary records)
//!
//! Body layout after the preamble is described in [`super::header`]. Vertex
//! records come in two widths:
//!
//! ```text
//! 0x00: position   f32 × 3
//! 0x0C: normal     f32 × 3
//! 0x18: uv         f32 × 2
//! 0x20: extended   i8 × 4
//! 0x24: color      u8 × 4   (40-byte records only)
//! ```
//!
//! Face records are three u32 zero-based indices. They are shifted to
//! one-based on decode and otherwise passed through unchecked.

use std::io::Read;

use super::header::{FACE_RECORD_SIZE, MeshHeaderV2, VertexLayout};
use super::{MeshVersion, read_full};
use crate::error::{FormatError, Result};
use crate::model::{DEFAULT_COLOR, Face, Mesh, Vertex};

/// Bytes of the header that carry fields. The rest is reserved.
const HEADER_FIELDS_SIZE: usize = 12;

/// Upper bound on capacity reserved from header counts before any record is read.
const MAX_PREALLOCATED_RECORDS: usize = 1 << 16;

/// Largest record the decoder handles.
const MAX_VERTEX_RECORD_SIZE: usize = 40;

/// Output of the 2.00 decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryGeometry {
    pub header: MeshHeaderV2,
    pub vertices: Vec<Vertex>,
    /// One-based indices
    pub faces: Vec<Face>,
}

impl BinaryGeometry {
    pub fn into_mesh(self) -> Mesh {
        Mesh {
            version: MeshVersion::V2_00,
            vertices: self.vertices,
            faces: self.faces,
        }
    }
}

/// Decode a 2.00 body. The preamble must already be consumed.
pub fn decode_binary<R: Read>(r: &mut R) -> Result<BinaryGeometry> {
    let header = read_header(r)?;

    let layout = header
        .vertex_layout()
        .ok_or(FormatError::UnsupportedVertexRecordSize(header.sizeof_vertex))?;

    if header.sizeof_face as usize != FACE_RECORD_SIZE {
        tracing::warn!(
            "Header declares {}-byte faces, reading {}-byte records",
            header.sizeof_face,
            FACE_RECORD_SIZE
        );
    }

    tracing::debug!(
        "Mesh 2.00 header: {} vertices ({} bytes each), {} faces",
        header.num_verts,
        header.sizeof_vertex,
        header.num_faces
    );

    let vertices = read_vertices(r, layout, header.num_verts)?;
    let faces = read_faces(r, header.num_faces)?;

    Ok(BinaryGeometry {
        header,
        vertices,
        faces,
    })
}

fn read_header<R: Read>(r: &mut R) -> Result<MeshHeaderV2> {
    let mut bytes = [0u8; MeshHeaderV2::SIZE];

    // Packed fields are 12 bytes but sizeof_header is 16; the full 16 are
    // consumed before the vertex records, matching the declared size.
    let n = read_full(r, &mut bytes[..HEADER_FIELDS_SIZE])?;
    // The size field alone decides validity, even if the rest is missing
    if n >= 2 {
        let found = u16::from_le_bytes([bytes[0], bytes[1]]);
        if found as usize != MeshHeaderV2::SIZE {
            return Err(FormatError::InvalidHeaderSize {
                found,
                expected: MeshHeaderV2::SIZE as u16,
            }
            .into());
        }
    }

    let n = n + read_full(r, &mut bytes[n..])?;
    let truncated = FormatError::TruncatedGeometry {
        unit: "header bytes",
        expected: MeshHeaderV2::SIZE as u64,
        found: n as u64,
    };
    if n < MeshHeaderV2::SIZE {
        return Err(truncated.into());
    }

    Ok(MeshHeaderV2::from_bytes(&bytes).ok_or(truncated)?)
}

fn read_vertices<R: Read>(r: &mut R, layout: VertexLayout, count: u32) -> Result<Vec<Vertex>> {
    let mut vertices = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_RECORDS));
    let mut record = [0u8; MAX_VERTEX_RECORD_SIZE];
    let record = &mut record[..layout.record_size()];

    for i in 0..count {
        if read_full(r, record)? < record.len() {
            return Err(FormatError::TruncatedGeometry {
                unit: "vertex records",
                expected: count as u64,
                found: i as u64,
            }
            .into());
        }
        vertices.push(decode_vertex(record, layout));
    }

    Ok(vertices)
}

fn read_faces<R: Read>(r: &mut R, count: u32) -> Result<Vec<Face>> {
    let mut faces = Vec::with_capacity((count as usize).min(MAX_PREALLOCATED_RECORDS));
    let mut record = [0u8; FACE_RECORD_SIZE];

    for i in 0..count {
        if read_full(r, &mut record)? < FACE_RECORD_SIZE {
            return Err(FormatError::TruncatedGeometry {
                unit: "face records",
                expected: count as u64,
                found: i as u64,
            }
            .into());
        }
        let index = |at: usize| {
            u32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
                .wrapping_add(1)
        };
        faces.push(Face::new(index(0), index(4), index(8)));
    }

    Ok(faces)
}

fn decode_vertex(record: &[u8], layout: VertexLayout) -> Vertex {
    let float = |i: usize| {
        let at = i * 4;
        f32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
    };
    let extended = |i: usize| record[32 + i] as i8 as f32;

    let color = match layout {
        VertexLayout::WithColor => [record[36], record[37], record[38], record[39]],
        VertexLayout::NoColor => DEFAULT_COLOR,
    };

    Vertex {
        position: [float(0), float(1), float(2)],
        normal: [float(3), float(4), float(5)],
        uv: [float(6), float(7), 0.0],
        extended: [extended(0), extended(1), extended(2), extended(3)],
        color,
    }
}
