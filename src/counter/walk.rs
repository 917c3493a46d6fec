//! Candidate file discovery.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CountError, Result};

/// Extensions scanned when none are requested.
pub const DEFAULT_EXTENSIONS: [&str; 8] = ["txt", "json", "csv", "md", "py", "js", "html", "css"];

/// Case-insensitive set of file extensions.
///
/// Extensions may be given with or without the leading dot.
///
/// # Example
/// ```
/// use std::path::Path;
/// use counttokens::counter::ExtensionFilter;
///
/// let filter = ExtensionFilter::new([".TXT", "py"]);
/// assert!(filter.matches(Path::new("notes.txt")));
/// assert!(filter.matches(Path::new("main.PY")));
/// assert!(!filter.matches(Path::new("data.bin")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl ExtensionFilter {
    /// Build a filter from extensions; blank entries are ignored.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { extensions }
    }

    /// Whether `path` has one of the extensions.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(&e.to_ascii_lowercase()))
    }

    /// Normalized extensions, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Whether the filter matches nothing
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// List files under `root` that pass `filter`.
///
/// Symlinked directories are never followed. Subdirectories that cannot be
/// listed are skipped with a warning. The order of the returned paths is
/// unspecified.
pub(crate) fn collect_candidates(
    root: &Path,
    filter: &ExtensionFilter,
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(CountError::NotADirectory(root.to_path_buf()));
    }

    let mut candidates = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(e.into()),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            },
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                    continue;
                },
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping entry");
                    continue;
                },
            };

            if file_type.is_dir() {
                if recursive {
                    pending.push(path);
                }
                continue;
            }

            if file_type.is_symlink() {
                // Dangling links stay candidates and fail on read.
                if fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
                    tracing::debug!(path = %path.display(), "Not following directory symlink");
                    continue;
                }
            } else if !file_type.is_file() {
                continue;
            }

            if filter.matches(&path) {
                candidates.push(path);
            }
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    #[test]
    fn test_normalizes_extensions() {
        let filter = ExtensionFilter::new([".Md", " txt ", "", "."]);
        assert_eq!(filter.iter().collect::<Vec<_>>(), vec!["md", "txt"]);
    }

    #[test]
    fn test_default_extensions() {
        let filter = ExtensionFilter::default();
        for ext in DEFAULT_EXTENSIONS {
            assert!(filter.matches(Path::new(&format!("file.{ext}"))));
        }
        assert!(!filter.matches(Path::new("file.rs")));
        assert!(!filter.matches(Path::new("README")));
    }

    #[test]
    fn test_recursive_flag() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("x.txt"));
        touch(&root.join("sub/y.txt"));
        touch(&root.join("sub/deeper/z.txt"));
        let filter = ExtensionFilter::new(["txt"]);

        let flat = collect_candidates(root, &filter, false).unwrap();
        assert_eq!(flat, vec![root.join("x.txt")]);

        let deep = sorted(collect_candidates(root, &filter, true).unwrap());
        assert_eq!(
            deep,
            vec![
                root.join("sub/deeper/z.txt"),
                root.join("sub/y.txt"),
                root.join("x.txt"),
            ]
        );
    }

    #[test]
    fn test_filter_excludes_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.txt"));
        touch(&root.join("b.py"));
        touch(&root.join("c.bin"));

        let found = sorted(collect_candidates(root, &ExtensionFilter::new(["txt", "py"]), true).unwrap());
        assert_eq!(found, vec![root.join("a.txt"), root.join("b.py")]);
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        touch(&file);

        let err = collect_candidates(&file, &ExtensionFilter::default(), true).unwrap_err();
        assert!(matches!(err, CountError::NotADirectory(_)));

        let err = collect_candidates(&dir.path().join("missing"), &ExtensionFilter::default(), true)
            .unwrap_err();
        assert!(matches!(err, CountError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("sub/a.txt"));
        std::os::unix::fs::symlink(root, root.join("sub/loop")).unwrap();
        std::os::unix::fs::symlink(root.join("nowhere.txt"), root.join("dangling.txt")).unwrap();

        let found = sorted(collect_candidates(root, &ExtensionFilter::new(["txt"]), true).unwrap());
        assert_eq!(found, vec![root.join("dangling.txt"), root.join("sub/a.txt")]);
    }
}
