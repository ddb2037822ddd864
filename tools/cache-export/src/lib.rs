//! cache-export library
//!
//! Pulls payloads out of an HTTP cache directory and turns cached meshes into
//! Wavefront OBJ files.
//!
//! - [`envelope`] - Strip the cache envelope from one entry
//! - [`scan`] - Walk cache directories and extract every usable entry
//! - [`convert`] - Mesh file to OBJ file
//! - [`config`] - cache-export.toml

pub mod config;
pub mod convert;
pub mod envelope;
pub mod scan;

pub use config::{DEFAULT_CONFIG_FILE, ExtractConfig};
pub use convert::{convert_mesh_file, convert_mesh_to_memory, is_mesh_file};
pub use envelope::{StripOutcome, strip_file};
pub use scan::{ExtractSummary, extract_all};
