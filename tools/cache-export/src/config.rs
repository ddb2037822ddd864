//! cache-export.toml parsing
//!
//! All paths come from this file or from CLI flags. Nothing is derived from
//! the environment.

use anyhow::{Context, Result, bail};
use mesh_common::ObjOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::scan::DEFAULT_MIN_SIZE;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cache-export.toml";

/// cache-export.toml structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    #[serde(default)]
    pub extract: ExtractSection,
    #[serde(default)]
    pub mesh: MeshSection,
}

/// Cache extraction section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractSection {
    /// Cache directories to scan (not recursive)
    #[serde(default)]
    pub sources: Vec<PathBuf>,

    /// Directory receiving extracted payloads. Created if missing.
    /// Default: "cache"
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Files smaller than this are skipped.
    /// Default: 92
    #[serde(default = "default_min_size")]
    pub min_size: u64,

    /// Convert extracted payloads that are meshes to sibling .obj files.
    /// Default: false
    #[serde(default)]
    pub convert_meshes: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("cache")
}

fn default_min_size() -> u64 {
    DEFAULT_MIN_SIZE
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            output: default_output(),
            min_size: default_min_size(),
            convert_meshes: false,
        }
    }
}

/// Mesh conversion section
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshSection {
    /// Reproduce the legacy converter's uv/normal output exactly.
    /// Default: false
    #[serde(default)]
    pub strict_legacy_compat: bool,
}

impl MeshSection {
    pub fn obj_options(&self) -> ObjOptions {
        ObjOptions {
            strict_legacy_compat: self.strict_legacy_compat,
        }
    }
}

impl ExtractConfig {
    /// Load config from file. Relative paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse config from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse cache-export.toml")
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let paths = self
            .extract
            .sources
            .iter_mut()
            .chain(std::iter::once(&mut self.extract.output));
        for p in paths {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    /// Check the config is usable for extraction.
    pub fn validate(&self) -> Result<()> {
        if self.extract.sources.is_empty() {
            bail!("No cache sources configured (set extract.sources or pass --source)");
        }
        if self.extract.sources.contains(&self.extract.output) {
            bail!(
                "Output directory {} is also a source",
                self.extract.output.display()
            );
        }
        if self.extract.min_size < DEFAULT_MIN_SIZE {
            tracing::warn!(
                "min_size {} is below {} bytes; files that cannot hold a mesh header will be extracted",
                self.extract.min_size,
                DEFAULT_MIN_SIZE
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ExtractConfig::parse(
            r#"
            [extract]
            sources = ["/tmp/cache/http", "/tmp/cache/sounds"]
            output = "/tmp/out"
            min_size = 128
            convert_meshes = true

            [mesh]
            strict_legacy_compat = true
            "#,
        )
        .unwrap();

        assert_eq!(config.extract.sources.len(), 2);
        assert_eq!(config.extract.output, PathBuf::from("/tmp/out"));
        assert_eq!(config.extract.min_size, 128);
        assert!(config.extract.convert_meshes);
        assert!(config.mesh.obj_options().strict_legacy_compat);
    }

    #[test]
    fn test_defaults() {
        let config = ExtractConfig::parse("").unwrap();
        assert!(config.extract.sources.is_empty());
        assert_eq!(config.extract.output, PathBuf::from("cache"));
        assert_eq!(config.extract.min_size, 92);
        assert!(!config.extract.convert_meshes);
        assert_eq!(config.mesh.obj_options(), ObjOptions::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ExtractConfig::parse("[extract]\nsource = []\n").is_err());
    }

    #[test]
    fn test_validate() {
        let config = ExtractConfig::default();
        assert!(config.validate().is_err());

        let config = ExtractConfig::parse("[extract]\nsources = [\"a\"]\noutput = \"a\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = ExtractConfig::parse("[extract]\nsources = [\"a\"]\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "[extract]\nsources = [\"http\", \"/abs/sounds\"]\noutput = \"out\"\n",
        )
        .unwrap();

        let config = ExtractConfig::load(&path).unwrap();
        assert_eq!(config.extract.sources[0], dir.path().join("http"));
        assert_eq!(config.extract.sources[1], PathBuf::from("/abs/sounds"));
        assert_eq!(config.extract.output, dir.path().join("out"));
    }
}
