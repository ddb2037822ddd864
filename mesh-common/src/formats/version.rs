//! Version sniffing
//!
//! Every mesh file starts with a 13-byte ASCII preamble:
//!
//! ```text
//! 0x00: "version "  (8 bytes, literal)
//! 0x08: tag         (5 bytes: "1.00\n", "1.01\n" or "2.00\n")
//! ```

use std::fmt;
use std::io::Read;

use super::read_full;
use crate::error::{FormatError, Result};

/// Literal token that opens every mesh file.
pub const VERSION_TOKEN: &[u8; 8] = b"version ";

/// Width of the version tag following [`VERSION_TOKEN`].
pub const VERSION_TAG_LEN: usize = 5;

/// Mesh format revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshVersion {
    /// Text tuples, positions stored at double size
    V1_00,
    /// Text tuples, positions stored at true size
    V1_01,
    /// Fixed-layout binary records
    V2_00,
}

impl MeshVersion {
    /// Match a raw 5-byte tag.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"1.00\n" => Some(Self::V1_00),
            b"1.01\n" => Some(Self::V1_01),
            b"2.00\n" => Some(Self::V2_00),
            _ => None,
        }
    }

    /// Version string without the trailing newline.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_00 => "1.00",
            Self::V1_01 => "1.01",
            Self::V2_00 => "2.00",
        }
    }

    /// True for the text tuple revisions.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::V1_00 | Self::V1_01)
    }

    /// Factor applied to v1 positions. 1.00 files store positions doubled.
    pub fn position_scale(&self) -> f32 {
        match self {
            Self::V1_00 => 0.5,
            Self::V1_01 | Self::V2_00 => 1.0,
        }
    }
}

impl fmt::Display for MeshVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the preamble and identify the format revision.
///
/// Consumes exactly 8 bytes when the token is missing and exactly 13 otherwise.
pub fn sniff_version<R: Read>(r: &mut R) -> Result<MeshVersion> {
    let mut token = [0u8; VERSION_TOKEN.len()];
    let n = read_full(r, &mut token)?;
    if n < token.len() || &token != VERSION_TOKEN {
        return Err(FormatError::NotAMeshFile.into());
    }

    let mut tag = [0u8; VERSION_TAG_LEN];
    let n = read_full(r, &mut tag)?;
    MeshVersion::from_tag(&tag[..n]).ok_or_else(|| {
        FormatError::UnknownVersion(String::from_utf8_lossy(&tag[..n]).into_owned()).into()
    })
}

/// Cheap check on an in-memory prefix, used to pick mesh candidates out of a cache.
pub fn looks_like_mesh(prefix: &[u8]) -> bool {
    let end = VERSION_TOKEN.len() + VERSION_TAG_LEN;
    prefix.len() >= end
        && prefix.starts_with(VERSION_TOKEN)
        && MeshVersion::from_tag(&prefix[VERSION_TOKEN.len()..end]).is_some()
}
