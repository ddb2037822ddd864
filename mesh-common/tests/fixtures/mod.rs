//! Builders for sample mesh files

use mesh_common::formats::{MeshHeaderV2, VertexLayout};

/// Attributes of one 2.00 vertex record.
#[derive(Clone, Copy)]
pub struct Record {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub extended: [i8; 4],
    pub color: [u8; 4],
}

impl Record {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0, 1.0, 0.0],
            uv: [0.5, 0.5],
            extended: [0; 4],
            color: [255; 4],
        }
    }
}

/// Complete 2.00 file: preamble, header, records.
pub fn v2_mesh(layout: VertexLayout, records: &[Record], faces: &[[u32; 3]]) -> Vec<u8> {
    let header = MeshHeaderV2::new(layout, records.len() as u32, faces.len() as u32);
    v2_mesh_with_header(header, layout, records, faces)
}

/// 2.00 file with an arbitrary (possibly inconsistent) header.
pub fn v2_mesh_with_header(
    header: MeshHeaderV2,
    layout: VertexLayout,
    records: &[Record],
    faces: &[[u32; 3]],
) -> Vec<u8> {
    let mut out = b"version 2.00\n".to_vec();
    out.extend_from_slice(&header.to_bytes());

    for r in records {
        let floats = [
            r.position[0],
            r.position[1],
            r.position[2],
            r.normal[0],
            r.normal[1],
            r.normal[2],
            r.uv[0],
            r.uv[1],
        ];
        for f in floats {
            out.extend_from_slice(&f.to_le_bytes());
        }
        out.extend(r.extended.iter().map(|&b| b as u8));
        if layout == VertexLayout::WithColor {
            out.extend_from_slice(&r.color);
        }
    }

    for face in faces {
        for i in face {
            out.extend_from_slice(&i.to_le_bytes());
        }
    }

    out
}

/// Complete 1.0x file. Each vertex is `(position, normal, uv)`.
pub fn v1_mesh(tag: &str, vertices: &[([f32; 3], [f32; 3], [f32; 2])]) -> Vec<u8> {
    let mut out = format!("version {tag}\n{}\n", vertices.len() / 3);
    for (p, n, uv) in vertices {
        out.push_str(&format!("[{},{},{}]", p[0], p[1], p[2]));
        out.push_str(&format!("[{},{},{}]", n[0], n[1], n[2]));
        out.push_str(&format!("[{},{},0]", uv[0], uv[1]));
    }
    out.into_bytes()
}
