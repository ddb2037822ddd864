//! Mesh file to OBJ file conversion

use anyhow::{Context, Result};
use mesh_common::formats::{VERSION_TAG_LEN, VERSION_TOKEN};
use mesh_common::{ConversionSummary, ObjOptions, looks_like_mesh};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Decode a mesh file and return the OBJ text without touching the filesystem.
pub fn convert_mesh_to_memory(
    input: &Path,
    options: &ObjOptions,
) -> Result<(ConversionSummary, Vec<u8>)> {
    let file = File::open(input).with_context(|| format!("Failed to open mesh: {:?}", input))?;
    let mut reader = BufReader::new(file);

    let mut obj = Vec::new();
    let summary = mesh_common::convert(&mut reader, &mut obj, options)
        .with_context(|| format!("Failed to convert mesh: {:?}", input))?;

    Ok((summary, obj))
}

/// Convert a mesh file to an OBJ file.
///
/// `output` must not exist. It is only created once the whole mesh has
/// decoded, so a failed conversion leaves nothing behind.
pub fn convert_mesh_file(
    input: &Path,
    output: &Path,
    options: &ObjOptions,
) -> Result<ConversionSummary> {
    let (summary, obj) = convert_mesh_to_memory(input, options)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .with_context(|| format!("Failed to create output: {:?}", output))?;

    if let Err(e) = file.write_all(&obj).and_then(|_| file.flush()) {
        drop(file);
        let _ = std::fs::remove_file(output);
        return Err(e).with_context(|| format!("Failed to write {:?}", output));
    }

    tracing::info!(
        "Converted mesh {}: {} vertices, {} faces",
        summary.version,
        summary.vertex_count,
        summary.face_count
    );

    Ok(summary)
}

/// Whether the file starts with a supported mesh preamble.
pub fn is_mesh_file(path: &Path) -> Result<bool> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;

    let mut prefix = Vec::with_capacity(VERSION_TOKEN.len() + VERSION_TAG_LEN);
    file.take((VERSION_TOKEN.len() + VERSION_TAG_LEN) as u64)
        .read_to_end(&mut prefix)
        .with_context(|| format!("Failed to read {:?}", path))?;

    Ok(looks_like_mesh(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRIANGLE: &[u8] =
        b"version 1.01\n1\n[0,0,0][0,0,1][0,0,0][1,0,0][0,0,1][1,0,0][0,1,0][0,0,1][0,1,0]";

    #[test]
    fn test_convert_mesh_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tri.mesh");
        let output = dir.path().join("tri.obj");
        fs::write(&input, TRIANGLE).unwrap();

        let summary = convert_mesh_file(&input, &output, &ObjOptions::default()).unwrap();
        assert_eq!(summary.vertex_count, 3);
        assert_eq!(summary.face_count, 1);

        let obj = fs::read_to_string(&output).unwrap();
        assert!(obj.starts_with("# ROBLOX .mesh version 1.0 (scale = 1.0)\nv 0.0 0.0 0.0\n"));
        assert!(obj.ends_with("s 1\nf 1/1/1 2/2/2 3/3/3\n"));

        let (_, in_memory) = convert_mesh_to_memory(&input, &ObjOptions::default()).unwrap();
        assert_eq!(in_memory, obj.as_bytes());
    }

    #[test]
    fn test_failed_conversion_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.mesh");
        let output = dir.path().join("bad.obj");
        fs::write(&input, &TRIANGLE[..TRIANGLE.len() - 4]).unwrap();

        let err = convert_mesh_file(&input, &output, &ObjOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to convert mesh"));
        assert!(!output.exists());
    }

    #[test]
    fn test_existing_output_refused() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tri.mesh");
        let output = dir.path().join("tri.obj");
        fs::write(&input, TRIANGLE).unwrap();
        fs::write(&output, b"keep").unwrap();

        assert!(convert_mesh_file(&input, &output, &ObjOptions::default()).is_err());
        assert_eq!(fs::read(&output).unwrap(), b"keep");
    }

    #[test]
    fn test_is_mesh_file() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = dir.path().join("a");
        let png = dir.path().join("b");
        let short = dir.path().join("c");
        fs::write(&mesh, b"version 2.00\n\x10\x00").unwrap();
        fs::write(&png, b"\x89PNG\r\n\x1a\n0000000000").unwrap();
        fs::write(&short, b"version").unwrap();

        assert!(is_mesh_file(&mesh).unwrap());
        assert!(!is_mesh_file(&png).unwrap());
        assert!(!is_mesh_file(&short).unwrap());
    }
}
