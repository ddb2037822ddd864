//! Version 2.00 mesh header
//!
//! Follows the `version 2.00\n` preamble. Little-endian, no padding.
//!
//! # Layout
//! ```text
//! 0x00: sizeof_header u16 (always 16)
//! 0x02: sizeof_vertex u8  (36 or 40)
//! 0x03: sizeof_face   u8  (12)
//! 0x04: num_verts     u32
//! 0x08: num_faces     u32
//! 0x0C: reserved      (4 bytes, ignored)
//! 0x10: vertex records (num_verts × sizeof_vertex)
//! var:  face records   (num_faces × 12)
//! ```

/// Version 2.00 mesh header (16 bytes on disk)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshHeaderV2 {
    pub sizeof_header: u16,
    pub sizeof_vertex: u8,
    pub sizeof_face: u8,
    pub num_verts: u32,
    pub num_faces: u32,
}

/// Size of one face record (three u32 indices)
pub const FACE_RECORD_SIZE: usize = 12;

impl MeshHeaderV2 {
    pub const SIZE: usize = 16;

    pub fn new(layout: VertexLayout, num_verts: u32, num_faces: u32) -> Self {
        Self {
            sizeof_header: Self::SIZE as u16,
            sizeof_vertex: layout.record_size() as u8,
            sizeof_face: FACE_RECORD_SIZE as u8,
            num_verts,
            num_faces,
        }
    }

    /// Vertex layout selected by `sizeof_vertex`, if one exists.
    pub fn vertex_layout(&self) -> Option<VertexLayout> {
        VertexLayout::from_record_size(self.sizeof_vertex)
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.sizeof_header.to_le_bytes());
        bytes[2] = self.sizeof_vertex;
        bytes[3] = self.sizeof_face;
        bytes[4..8].copy_from_slice(&self.num_verts.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.num_faces.to_le_bytes());
        // reserved bytes stay 0
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            sizeof_header: u16::from_le_bytes([bytes[0], bytes[1]]),
            sizeof_vertex: bytes[2],
            sizeof_face: bytes[3],
            num_verts: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            num_faces: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// Vertex record layouts understood by the 2.00 decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// 8 × f32 + 4 × i8 + 4 × u8 color (40 bytes)
    WithColor,
    /// 8 × f32 + 4 × i8, color implied white (36 bytes)
    NoColor,
}

impl VertexLayout {
    pub fn from_record_size(size: u8) -> Option<Self> {
        match size {
            40 => Some(Self::WithColor),
            36 => Some(Self::NoColor),
            _ => None,
        }
    }

    pub fn record_size(&self) -> usize {
        match self {
            Self::WithColor => 40,
            Self::NoColor => 36,
        }
    }
}
