//! Version 1.00 / 1.01 decoder (text tuples)
//!
//! Body layout after the preamble:
//!
//! ```text
//! <face count>\n
//! [px,py,pz][nx,ny,nz][tu,tv,tw][px,py,pz]...
//! ```
//!
//! Each face owns three unshared vertices and each vertex is three tuples:
//! position, normal, uv. Version 1.00 stores positions at twice their size.
//!
//! The tuple stream is tokenized one byte at a time so arbitrarily large files
//! never need to be buffered whole.

use std::io::{self, Read};

use super::MeshVersion;
use crate::error::{FormatError, MeshError, Result};
use crate::model::{Face, Mesh, Vertex};

/// Tuples that make up one vertex (position, normal, uv).
pub const TUPLES_PER_VERTEX: usize = 3;

/// Vertices owned by one face.
pub const VERTICES_PER_FACE: usize = 3;

/// Longest face count line accepted, newline excluded.
const MAX_FACE_COUNT_LINE: usize = 64;

/// Upper bound on capacity reserved from the face count before any tuple is read.
const MAX_PREALLOCATED_VERTICES: usize = 1 << 16;

/// Output of the 1.00 / 1.01 decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct TextGeometry {
    pub version: MeshVersion,
    pub face_count: usize,
    /// `3 × face_count` vertices, positions already scaled
    pub vertices: Vec<Vertex>,
}

impl TextGeometry {
    pub fn scale(&self) -> f32 {
        self.version.position_scale()
    }

    /// Faces are implicit: face `k` uses vertices `3k+1`, `3k+2`, `3k+3`.
    pub fn into_mesh(self) -> Mesh {
        let faces = (0..self.face_count as u32)
            .map(|k| Face::new(3 * k + 1, 3 * k + 2, 3 * k + 3))
            .collect();

        Mesh {
            version: self.version,
            vertices: self.vertices,
            faces,
        }
    }
}

/// Decode a 1.00 / 1.01 body. The preamble must already be consumed.
///
/// Reads byte by byte; pass a buffered reader.
pub fn decode_text<R: Read>(r: &mut R, version: MeshVersion) -> Result<TextGeometry> {
    let mut bytes = r.bytes();

    let face_count = read_face_count(&mut bytes)?;
    let vertex_count = face_count
        .checked_mul(VERTICES_PER_FACE)
        .filter(|&n| n <= u32::MAX as usize)
        .ok_or_else(|| FormatError::MalformedFaceCount(face_count.to_string()))?;
    let tuple_count = vertex_count * TUPLES_PER_VERTEX;

    tracing::debug!(
        "Mesh {} body: {} faces, expecting {} tuples",
        version,
        face_count,
        tuple_count
    );

    let scale = version.position_scale();
    let mut vertices = Vec::with_capacity(vertex_count.min(MAX_PREALLOCATED_VERTICES));
    let mut tokenizer = TupleTokenizer::new(bytes);
    let mut pending = [[0.0f32; 3]; TUPLES_PER_VERTEX];

    for read in 0..tuple_count {
        let tuple = match tokenizer.next() {
            Some(tuple) => tuple?,
            None => {
                return Err(FormatError::TruncatedGeometry {
                    unit: "tuples",
                    expected: tuple_count as u64,
                    found: read as u64,
                }
                .into());
            }
        };

        let slot = read % TUPLES_PER_VERTEX;
        pending[slot] = tuple;
        if slot == TUPLES_PER_VERTEX - 1 {
            let [position, normal, uv] = pending;
            vertices.push(Vertex {
                position: position.map(|c| c * scale),
                normal,
                uv: [uv[0], uv[1], 0.0],
                ..Vertex::default()
            });
        }
    }
    // Anything after the last required tuple is ignored

    Ok(TextGeometry {
        version,
        face_count,
        vertices,
    })
}

fn read_face_count<I>(bytes: &mut I) -> Result<usize>
where
    I: Iterator<Item = io::Result<u8>>,
{
    let mut line = Vec::new();
    for byte in bytes.by_ref() {
        match byte? {
            b'\n' => break,
            b => {
                line.push(b);
                if line.len() > MAX_FACE_COUNT_LINE {
                    break;
                }
            }
        }
    }

    let text = String::from_utf8_lossy(&line);
    let count: i64 = text
        .trim()
        .parse()
        .map_err(|_| FormatError::MalformedFaceCount(text.clone().into_owned()))?;

    usize::try_from(count).map_err(|_| FormatError::MalformedFaceCount(text.into_owned()).into())
}

/// Streaming tokenizer for `[a,b,c]` tuples.
///
/// `[` is skipped, `,` commits a field, `]` commits the last field and the
/// tuple. Every other byte is part of the current number. A partial token at
/// end of stream is dropped.
pub struct TupleTokenizer<I> {
    bytes: I,
    token: Vec<u8>,
    fields: [f32; 3],
    field: usize,
    emitted: usize,
}

impl<I> TupleTokenizer<I>
where
    I: Iterator<Item = io::Result<u8>>,
{
    pub fn new(bytes: I) -> Self {
        Self {
            bytes,
            token: Vec::new(),
            fields: [0.0; 3],
            field: 0,
            emitted: 0,
        }
    }

    fn step(&mut self) -> Result<Option<[f32; 3]>> {
        while let Some(byte) = self.bytes.next() {
            match byte? {
                b'[' => {}
                b',' => self.commit_field()?,
                b']' => {
                    self.commit_field()?;
                    if self.field != self.fields.len() {
                        return Err(self.malformed_tuple(self.field));
                    }
                    self.field = 0;
                    self.emitted += 1;
                    return Ok(Some(self.fields));
                }
                b => self.token.push(b),
            }
        }
        Ok(None)
    }

    fn commit_field(&mut self) -> Result<()> {
        if self.field >= self.fields.len() {
            return Err(self.malformed_tuple(self.field + 1));
        }

        let value = {
            let text = String::from_utf8_lossy(&self.token);
            let text = text.trim();
            text.parse::<f32>()
                .map_err(|_| FormatError::MalformedNumber(text.to_string()))?
        };

        self.fields[self.field] = value;
        self.field += 1;
        self.token.clear();
        Ok(())
    }

    fn malformed_tuple(&self, fields: usize) -> MeshError {
        FormatError::MalformedTuple {
            index: self.emitted,
            fields,
        }
        .into()
    }
}

impl<I> Iterator for TupleTokenizer<I>
where
    I: Iterator<Item = io::Result<u8>>,
{
    type Item = Result<[f32; 3]>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step().transpose()
    }
}
