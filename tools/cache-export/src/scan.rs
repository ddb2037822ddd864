//! Cache directory scanning and bulk extraction

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use mesh_common::ObjOptions;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::config::ExtractConfig;
use crate::convert::{convert_mesh_file, is_mesh_file};
use crate::envelope::{StripOutcome, strip_file};

/// Smallest cache entry worth extracting. Anything shorter cannot hold a
/// minimal binary mesh.
pub const DEFAULT_MIN_SIZE: u64 = 92;

/// Timestamp prefix of extracted file names
const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// One file found in a cache directory.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub file_name: OsString,
    pub size: u64,
    pub modified: SystemTime,
    /// Creation time, or modification time where the platform has none
    pub created: SystemTime,
}

/// Totals for one [`extract_all`] run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub scanned: usize,
    pub stripped: usize,
    pub copied: usize,
    pub skipped_existing: usize,
    pub skipped_status: usize,
    pub failed: usize,
    pub converted: usize,
    pub conversion_failures: usize,
}

/// Files found in one cache directory.
#[derive(Debug, Default)]
pub struct Candidates {
    /// Most recently modified first
    pub entries: Vec<CacheEntry>,
    /// Entries that vanished or could not be stat'ed while listing
    pub unreadable: usize,
}

/// List regular files directly inside `dir` of at least `min_size` bytes,
/// most recently modified first.
///
/// Only a failure to open `dir` itself is an error; entries that cannot be
/// inspected are logged and counted.
pub fn collect_candidates(dir: &Path, min_size: u64) -> Result<Candidates> {
    let mut candidates = Candidates::default();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| format!("Failed to list {:?}", dir));
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                candidates.unreadable += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        match stat_entry(entry.path()) {
            Ok(found) if found.size >= min_size => candidates.entries.push(found),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("{:#}", e);
                candidates.unreadable += 1;
            }
        }
    }

    candidates.entries.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(candidates)
}

/// Size and timestamps of one cache file.
fn stat_entry(path: &Path) -> Result<CacheEntry> {
    let metadata =
        std::fs::symlink_metadata(path).with_context(|| format!("Failed to stat {:?}", path))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("No modification time for {:?}", path))?;

    Ok(CacheEntry {
        path: path.to_path_buf(),
        file_name: path.file_name().unwrap_or_default().to_owned(),
        size: metadata.len(),
        modified,
        created: metadata.created().unwrap_or(modified),
    })
}

/// `<created %Y%m%d%H%M%S> <file name>` in local time.
pub fn output_name(entry: &CacheEntry) -> OsString {
    let created: DateTime<Local> = entry.created.into();
    let mut name = OsString::from(created.format(NAME_TIMESTAMP_FORMAT).to_string());
    name.push(" ");
    name.push(&entry.file_name);
    name
}

/// Path of the OBJ written next to an extracted mesh.
pub fn obj_path_for(extracted: &Path) -> PathBuf {
    let mut name = extracted.as_os_str().to_owned();
    name.push(".obj");
    PathBuf::from(name)
}

/// Extract every candidate from every configured source.
///
/// Per-entry failures are logged and counted; only setup problems (missing
/// directories, unreadable listings) abort the run.
pub fn extract_all(config: &ExtractConfig) -> Result<ExtractSummary> {
    let section = &config.extract;
    let options = config.mesh.obj_options();

    std::fs::create_dir_all(&section.output)
        .with_context(|| format!("Failed to create output directory: {:?}", section.output))?;

    for dir in section.sources.iter().chain(std::iter::once(&section.output)) {
        if !dir.is_dir() {
            bail!("Not a directory: {:?}", dir);
        }
    }

    let mut summary = ExtractSummary::default();

    for source in &section.sources {
        let candidates = collect_candidates(source, section.min_size)?;
        tracing::info!(
            "Scanning {:?}: {} candidates",
            source,
            candidates.entries.len()
        );
        summary.failed += candidates.unreadable;

        for entry in candidates.entries {
            summary.scanned += 1;

            let dest = section.output.join(output_name(&entry));
            if dest.exists() {
                summary.skipped_existing += 1;
                continue;
            }

            match strip_file(&entry.path, &dest) {
                Ok(StripOutcome::Stripped { .. }) => summary.stripped += 1,
                Ok(StripOutcome::Copied { .. }) => summary.copied += 1,
                Ok(StripOutcome::SkippedStatus(_)) => {
                    summary.skipped_status += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("{:#}", e);
                    summary.failed += 1;
                    continue;
                }
            }

            if section.convert_meshes {
                convert_extracted(&dest, &options, &mut summary);
            }
        }
    }

    tracing::info!(
        "Extracted {} ({} stripped, {} copied), skipped {} existing and {} non-success, {} failed",
        summary.stripped + summary.copied,
        summary.stripped,
        summary.copied,
        summary.skipped_existing,
        summary.skipped_status,
        summary.failed
    );
    if section.convert_meshes {
        tracing::info!(
            "Converted {} meshes, {} failed",
            summary.converted,
            summary.conversion_failures
        );
    }

    Ok(summary)
}

fn convert_extracted(extracted: &Path, options: &ObjOptions, summary: &mut ExtractSummary) {
    match is_mesh_file(extracted) {
        Ok(true) => {}
        Ok(false) => return,
        Err(e) => {
            tracing::warn!("{:#}", e);
            return;
        }
    }

    let obj = obj_path_for(extracted);
    if obj.exists() {
        return;
    }

    match convert_mesh_file(extracted, &obj, options) {
        Ok(_) => summary.converted += 1,
        Err(e) => {
            tracing::warn!("{:#}", e);
            summary.conversion_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::wrap_payload;
    use std::fs::{self, File};
    use std::time::Duration;

    fn write_with_mtime(path: &Path, contents: &[u8], secs_ago: u64) {
        fs::write(path, contents).unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[test]
    fn test_collect_candidates_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(&dir.path().join("old"), &[1; 100], 300);
        write_with_mtime(&dir.path().join("new"), &[1; 100], 10);
        write_with_mtime(&dir.path().join("mid"), &[1; 92], 100);
        write_with_mtime(&dir.path().join("tiny"), &[1; 91], 1);
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_with_mtime(&dir.path().join("nested").join("deep"), &[1; 200], 1);

        let candidates = collect_candidates(dir.path(), DEFAULT_MIN_SIZE).unwrap();
        assert_eq!(candidates.unreadable, 0);
        let entries = candidates.entries;
        let names: Vec<String> = entries
            .iter()
            .map(|e| e.file_name.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
        assert_eq!(entries[1].size, 92);
    }

    #[test]
    fn test_vanished_entry_is_an_error_for_that_entry_only() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept");
        write_with_mtime(&kept, &[1; 100], 5);

        assert!(stat_entry(&dir.path().join("vanished")).is_err());

        let found = stat_entry(&kept).unwrap();
        assert_eq!(found.size, 100);
        assert_eq!(found.file_name, OsString::from("kept"));
    }

    #[test]
    fn test_missing_directory_fails_listing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_candidates(&dir.path().join("nope"), DEFAULT_MIN_SIZE).is_err());
    }

    #[test]
    fn test_output_name_format() {
        let created = SystemTime::now();
        let entry = CacheEntry {
            path: PathBuf::from("/cache/abc123"),
            file_name: OsString::from("abc123"),
            size: 100,
            modified: created,
            created,
        };

        let expected = format!(
            "{} abc123",
            DateTime::<Local>::from(created).format("%Y%m%d%H%M%S")
        );
        let name = output_name(&entry);
        assert_eq!(name, OsString::from(&expected));
        // 14 digit timestamp, space, original name
        assert_eq!(expected.len(), 14 + 1 + 6);
    }

    #[test]
    fn test_obj_path_keeps_full_name() {
        assert_eq!(
            obj_path_for(Path::new("/out/20240101000000 a.b")),
            PathBuf::from("/out/20240101000000 a.b.obj")
        );
    }

    #[test]
    fn test_extract_all() {
        let root = tempfile::tempdir().unwrap();
        let http = root.path().join("http");
        let out = root.path().join("out");
        fs::create_dir(&http).unwrap();

        let mesh = {
            let mut m = b"version 1.01\n1\n".to_vec();
            m.extend_from_slice(&b"[0,0,0]".repeat(9));
            m
        };
        fs::write(http.join("mesh"), wrap_payload("https://x/mesh", 200, b"", &mesh)).unwrap();
        fs::write(http.join("gone"), wrap_payload("https://x/gone", 404, b"", &[0; 80])).unwrap();
        fs::write(http.join("raw"), [7u8; 120]).unwrap();
        fs::write(http.join("small"), [7u8; 10]).unwrap();

        let config = ExtractConfig::parse(&format!(
            "[extract]\nsources = [{:?}]\noutput = {:?}\nconvert_meshes = true\n",
            http, out
        ))
        .unwrap();

        let summary = extract_all(&config).unwrap();
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.stripped, 1);
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.skipped_status, 1);
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.conversion_failures, 0);

        let mut names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 3);
        assert!(names.iter().any(|n| n.ends_with(" mesh")));
        assert!(names.iter().any(|n| n.ends_with(" mesh.obj")));
        assert!(names.iter().any(|n| n.ends_with(" raw")));

        // Second run finds everything already extracted
        let again = extract_all(&config).unwrap();
        assert_eq!(again.skipped_existing, 2);
        assert_eq!(again.skipped_status, 1);
        assert_eq!(again.stripped + again.copied, 0);
    }

    #[test]
    fn test_extract_all_rejects_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let config = ExtractConfig::parse(&format!(
            "[extract]\nsources = [{:?}]\noutput = {:?}\n",
            root.path().join("nope"),
            root.path().join("out")
        ))
        .unwrap();

        assert!(extract_all(&config).is_err());
    }
}
