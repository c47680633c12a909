//! In-place updates of generated regions in Swift source files.
//!
//! The generated extension reads `private` members, so it has to live in
//! the same file as the type. Each one is kept between marker lines:
//!
//! ```text
//! // testable:begin MyClass
//! extension MyClass { ... }
//! // testable:end MyClass
//! ```
//!
//! Regions are appended at the end of the file, one per annotated type in
//! source order, each preceded by a blank line.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::expansion::{TestableMacro, TypeExpansion};
use crate::syntax::ParseError;

pub const BEGIN_MARKER: &str = "// testable:begin";
pub const END_MARKER: &str = "// testable:end";

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("failed to parse source: {0}")]
    Parse(#[from] ParseError),

    #[error("line {line}: region for '{type_name}' is never closed")]
    UnterminatedRegion { type_name: String, line: usize },

    #[error("line {line}: expected '// testable:end {expected}', found '{found}'")]
    MismatchedRegion {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("line {line}: '// testable:end' without a matching begin marker")]
    UnopenedRegion { line: usize },

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A generated region found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub type_name: String,
    /// Byte range covering both marker lines and their line endings.
    pub start: usize,
    pub end: usize,
    /// Text between the markers, without its final newline.
    pub body: String,
}

/// Every generated region in `content`, in order.
pub fn find_regions(content: &str) -> Result<Vec<Region>, UpdateError> {
    let mut regions = Vec::new();
    let mut open: Option<(String, usize, usize, usize)> = None;
    let mut offset = 0;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        let line_end = offset + line.len();

        if let Some(name) = trimmed.strip_prefix(BEGIN_MARKER) {
            if let Some((type_name, _, _, begin_line)) = &open {
                return Err(UpdateError::UnterminatedRegion {
                    type_name: type_name.clone(),
                    line: *begin_line,
                });
            }
            open = Some((name.trim().to_owned(), offset, line_end, line_number));
        } else if let Some(name) = trimmed.strip_prefix(END_MARKER) {
            let Some((type_name, start, body_start, _)) = open.take() else {
                return Err(UpdateError::UnopenedRegion { line: line_number });
            };
            let found = name.trim();
            if found != type_name {
                return Err(UpdateError::MismatchedRegion {
                    expected: type_name,
                    found: found.to_owned(),
                    line: line_number,
                });
            }
            let body = content[body_start..offset].trim_end_matches('\n').to_owned();
            regions.push(Region {
                type_name,
                start,
                end: line_end,
                body,
            });
        }

        offset = line_end;
    }

    match open {
        Some((type_name, _, _, line)) => Err(UpdateError::UnterminatedRegion { type_name, line }),
        None => Ok(regions),
    }
}

/// `content` with every generated region removed, along with the blank
/// line that precedes each one.
pub fn strip_regions(content: &str, regions: &[Region]) -> String {
    let mut stripped = String::with_capacity(content.len());
    let mut cursor = 0;
    for region in regions {
        let mut start = region.start;
        if start > cursor && content[..start].ends_with("\n\n") {
            start -= 1;
        }
        stripped.push_str(&content[cursor..start]);
        cursor = region.end;
    }
    stripped.push_str(&content[cursor..]);
    stripped
}

/// Updated text of one source file.
#[derive(Debug, Clone)]
pub struct SourceUpdate {
    pub content: String,
    pub changed: bool,
    pub expansions: Vec<TypeExpansion>,
    /// Regions dropped because their type is no longer annotated.
    pub removed: Vec<String>,
}

/// Regenerate every region of `source`.
///
/// A type whose expansion fails keeps its previous region, if it had one.
pub fn update_source(source: &str, generator: &TestableMacro) -> Result<SourceUpdate, UpdateError> {
    let regions = find_regions(source)?;
    let base = strip_regions(source, &regions);
    let mut previous: HashMap<&str, &str> = regions
        .iter()
        .map(|region| (region.type_name.as_str(), region.body.as_str()))
        .collect();

    let expansions = generator.expand_source(&base)?;

    let mut content = base;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for expansion in &expansions {
        let body = match (expansion.extension(), previous.remove(expansion.type_name.as_str())) {
            (Some(extension), _) => extension.source.as_str(),
            (None, Some(body)) => body,
            (None, None) => continue,
        };
        content.push('\n');
        content.push_str(&render_region(&expansion.type_name, body));
    }

    let mut removed: Vec<String> = previous.into_keys().map(str::to_owned).collect();
    removed.sort();
    Ok(SourceUpdate {
        changed: content != source,
        content,
        expansions,
        removed,
    })
}

fn render_region(type_name: &str, body: &str) -> String {
    format!("{BEGIN_MARKER} {type_name}\n{body}\n{END_MARKER} {type_name}\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Updated,
    Unchanged,
    /// Out of date, not written (check mode).
    Stale,
}

/// Result of updating one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: WriteOutcome,
    pub expansions: Vec<TypeExpansion>,
    pub removed: Vec<String>,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        self.expansions.iter().any(|expansion| !expansion.is_ok())
    }
}

/// Update the generated regions of the file at `path`, writing it only when
/// its content changes. In check mode nothing is written and a file that
/// would change is reported as stale.
pub fn update_file(path: &Path, generator: &TestableMacro, check: bool) -> Result<FileReport, UpdateError> {
    let source = std::fs::read_to_string(path).map_err(|source| UpdateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let update = update_source(&source, generator)?;

    let outcome = match (update.changed, check) {
        (false, _) => WriteOutcome::Unchanged,
        (true, true) => WriteOutcome::Stale,
        (true, false) => {
            std::fs::write(path, &update.content).map_err(|source| UpdateError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            log::debug!("updated {}", path.display());
            WriteOutcome::Updated
        }
    };

    Ok(FileReport {
        path: path.to_path_buf(),
        outcome,
        expansions: update.expansions,
        removed: update.removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "@Testable\nclass Counter {\n    private var count: Int = 0\n}\n";

    #[test]
    fn test_region_is_appended() {
        let update = update_source(SOURCE, &TestableMacro::default()).unwrap();
        assert!(update.changed);
        assert!(update.content.starts_with(SOURCE));
        assert!(update.content[SOURCE.len()..].starts_with("\n// testable:begin Counter\nextension Counter {\n"));
        assert!(update.content.ends_with("}\n// testable:end Counter\n"));
    }

    #[test]
    fn test_update_is_idempotent() {
        let generator = TestableMacro::default();
        let first = update_source(SOURCE, &generator).unwrap();
        let second = update_source(&first.content, &generator).unwrap();
        assert!(!second.changed);
        assert_eq!(second.content, first.content);
    }

    #[test]
    fn test_stale_region_is_replaced() {
        let generator = TestableMacro::default();
        let first = update_source(SOURCE, &generator).unwrap();
        let edited = first
            .content
            .replace("private var count: Int = 0", "private var count: Int = 0\n    private let step: Int = 1");
        let second = update_source(&edited, &generator).unwrap();
        assert!(second.changed);
        assert!(second.content.contains("var step: Int {"));
        assert_eq!(second.content.matches(BEGIN_MARKER).count(), 1);
    }

    #[test]
    fn test_region_without_annotation_is_removed() {
        let generator = TestableMacro::default();
        let first = update_source(SOURCE, &generator).unwrap();
        let unannotated = first.content.replace("@Testable\n", "");
        let second = update_source(&unannotated, &generator).unwrap();
        assert_eq!(second.content, SOURCE.replace("@Testable\n", ""));
        assert_eq!(second.removed, vec!["Counter".to_owned()]);
    }

    #[test]
    fn test_failed_expansion_keeps_previous_region() {
        let source = "@Testable\nprotocol Service {}\n\n// testable:begin Service\nextension Service {}\n// testable:end Service\n";
        let update = update_source(source, &TestableMacro::default()).unwrap();
        assert!(!update.changed);
        assert!(!update.expansions[0].is_ok());
    }

    #[test]
    fn test_marker_errors() {
        assert!(matches!(
            find_regions("// testable:begin A\nextension A {}\n"),
            Err(UpdateError::UnterminatedRegion { line: 1, .. })
        ));
        assert!(matches!(
            find_regions("// testable:begin A\n// testable:end B\n"),
            Err(UpdateError::MismatchedRegion { line: 2, .. })
        ));
        assert!(matches!(
            find_regions("// testable:end A\n"),
            Err(UpdateError::UnopenedRegion { line: 1 })
        ));
    }

    #[test]
    fn test_update_file_check_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Counter.swift");
        std::fs::write(&path, SOURCE).unwrap();
        let generator = TestableMacro::default();

        let report = update_file(&path, &generator, true).unwrap();
        assert_eq!(report.outcome, WriteOutcome::Stale);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), SOURCE);

        let report = update_file(&path, &generator, false).unwrap();
        assert_eq!(report.outcome, WriteOutcome::Updated);
        let report = update_file(&path, &generator, false).unwrap();
        assert_eq!(report.outcome, WriteOutcome::Unchanged);
        assert!(!report.has_errors());
    }
}
