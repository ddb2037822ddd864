//! Intermediate mesh model shared by both decoders and the OBJ emitter

use crate::formats::MeshVersion;

/// Color used when a vertex record carries none (opaque white).
pub const DEFAULT_COLOR: [u8; 4] = [255, 255, 255, 255];

/// One mesh corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Texture coordinate. The third component is always 0.0.
    pub uv: [f32; 3],
    /// Extra per-vertex values stored after the UV in v2 records.
    /// Decoded for completeness, never emitted.
    pub extended: [f32; 4],
    pub color: [u8; 4],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 3],
            extended: [0.0; 4],
            color: DEFAULT_COLOR,
        }
    }
}

/// Triangle with one-based vertex references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Face {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }
}

/// Decoded geometry ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub version: MeshVersion,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}
