//! Wavefront OBJ emitter
//!
//! Output order is fixed: header comment, `v`, `vt`, `vn`, `s 1`, `f`.
//! Every face corner references the same index for position, uv and normal.

use std::fmt;
use std::io::{self, Write};

use crate::formats::MeshVersion;
use crate::model::{Mesh, Vertex};

/// Emitter settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjOptions {
    /// Reproduce the legacy converter's last-vertex reuse: every `vt` line
    /// carries the last vertex's uv, and for 1.0x meshes every `vn` line
    /// carries the last vertex's normal. Number text still uses [`ObjFloat`],
    /// so output is not byte-identical to the legacy tool.
    pub strict_legacy_compat: bool,
}

impl ObjOptions {
    pub fn legacy() -> Self {
        Self {
            strict_legacy_compat: true,
        }
    }
}

/// Whole numbers at or above this magnitude print in exponent form.
const EXPONENT_THRESHOLD: f32 = 1e16;

/// Float formatted the way OBJ consumers and the legacy output expect:
/// shortest round-trip digits, always with a fractional part. Very large
/// whole numbers use exponent form (`1e20`).
#[derive(Debug, Clone, Copy)]
pub struct ObjFloat(pub f32);

impl fmt::Display for ObjFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_finite() && v.abs() >= EXPONENT_THRESHOLD {
            write!(f, "{v:e}")
        } else if v.is_finite() && v.fract() == 0.0 {
            write!(f, "{v:.1}")
        } else {
            write!(f, "{v}")
        }
    }
}

/// Comment line naming the source format.
pub fn header_comment(version: MeshVersion) -> String {
    match version {
        MeshVersion::V1_00 | MeshVersion::V1_01 => format!(
            "# ROBLOX .mesh version 1.0 (scale = {})",
            ObjFloat(version.position_scale())
        ),
        MeshVersion::V2_00 => "# ROBLOX .mesh version 2.00".to_string(),
    }
}

/// Serialize a decoded mesh.
///
/// Performs no geometric validation; only write errors are reported.
pub fn write_obj<W: Write>(w: &mut W, mesh: &Mesh, options: &ObjOptions) -> io::Result<()> {
    let text = mesh.version.is_text();
    let reuse_uv = options.strict_legacy_compat;
    let reuse_normal = options.strict_legacy_compat && text;
    let last = mesh.vertices.last();

    writeln!(w, "{}", header_comment(mesh.version))?;

    for v in &mesh.vertices {
        let [x, y, z] = v.position;
        writeln!(w, "v {} {} {}", ObjFloat(x), ObjFloat(y), ObjFloat(z))?;
    }

    for v in &mesh.vertices {
        let [u, t, _] = pick(v, last, reuse_uv).uv;
        writeln!(w, "vt {} {}", ObjFloat(u), ObjFloat(t))?;
    }

    for v in &mesh.vertices {
        let [x, y, z] = pick(v, last, reuse_normal).normal;
        // 2.00 normals are stored with z mirrored
        let z = if text { z } else { 1.0 - z };
        writeln!(w, "vn {} {} {}", ObjFloat(x), ObjFloat(y), ObjFloat(z))?;
    }

    writeln!(w, "s 1")?;

    for face in &mesh.faces {
        let [a, b, c] = face.indices();
        writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
    }

    Ok(())
}

fn pick<'a>(v: &'a Vertex, last: Option<&'a Vertex>, reuse_last: bool) -> &'a Vertex {
    match last {
        Some(last) if reuse_last => last,
        _ => v,
    }
}
