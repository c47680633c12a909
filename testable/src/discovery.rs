//! File discovery for finding Swift sources with `@Testable` types.

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::expansion::TestableMacro;
use crate::source_updater::BEGIN_MARKER;

pub const SWIFT_EXTENSION: &str = "swift";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
}

/// Discovered source file with basic metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Path relative to the scanned root, `/`-separated.
    pub relative_path: String,
}

/// Discover all Swift files under `root` that declare `@Testable` types or
/// still hold generated regions.
///
/// `root` may also be a single file. Hidden directories are skipped, as are
/// paths whose relative form matches one of `exclude`. Results are sorted by
/// relative path.
pub fn discover_sources(root: &Path, exclude: &[Regex]) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::Missing(root.to_path_buf()));
    }

    let mut discovered = Vec::new();

    if root.is_file() {
        if is_swift(root) && needs_generation(root)? {
            let relative_path = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            discovered.push(DiscoveredFile {
                path: root.to_path_buf(),
                relative_path,
            });
        }
        return Ok(discovered);
    }

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_swift(path) {
            continue;
        }

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        if exclude.iter().any(|pattern| pattern.is_match(&relative_path)) {
            log::trace!("excluded {relative_path}");
            continue;
        }

        if needs_generation(path)? {
            discovered.push(DiscoveredFile {
                path: path.to_path_buf(),
                relative_path,
            });
        }
    }

    discovered.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    log::debug!("discovered {} candidate file(s) under {}", discovered.len(), root.display());
    Ok(discovered)
}

fn is_swift(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SWIFT_EXTENSION)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Quick text check before doing full parsing.
fn needs_generation(path: &Path) -> Result<bool, DiscoveryError> {
    let content = std::fs::read_to_string(path).map_err(|source| DiscoveryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let annotation = format!("@{}", TestableMacro::ATTRIBUTE);
    Ok(content.contains(&annotation) || content.contains(BEGIN_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discovers_annotated_swift_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "Sources/App/Model.swift", "@Testable\nclass Model {}\n");
        write(root, "Sources/App/Plain.swift", "class Plain {}\n");
        write(root, "Sources/App/Notes.md", "@Testable\n");
        write(root, "Sources/App/.hidden/Secret.swift", "@Testable\nclass Secret {}\n");
        write(root, "Sources/Lib/Old.swift", "class Old {}\n// testable:begin Old\n// testable:end Old\n");
        write(root, "Pods/Vendor/Thing.swift", "@Testable\nclass Thing {}\n");

        let exclude = vec![Regex::new("^Pods/").unwrap()];
        let files = discover_sources(root, &exclude).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["Sources/App/Model.swift", "Sources/Lib/Old.swift"]);
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Model.swift", "@Testable\nstruct Model {}\n");
        let files = discover_sources(&dir.path().join("Model.swift"), &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "Model.swift");
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_sources(&dir.path().join("nope"), &[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::Missing(_)));
    }
}
