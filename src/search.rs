//! Template search path resolution.
//! Turns the configured template path entries into an ordered list of
//! search directories, substituting `@{CWD}` and `@{ORIGIN}` placeholders.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{PLACEHOLDER_CWD, PLACEHOLDER_ORIGIN, PLACEHOLDER_PREFIX};
use crate::error::Result;
use crate::files::{absolute_path, normalize_path};
use crate::report::Reporter;

/// A directory registered as a template source.
#[derive(Debug, PartialEq, Eq)]
pub struct SearchDir {
    root: PathBuf,
}

impl SearchDir {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a template name onto a file below this directory.
    ///
    /// The name is split on `/`; empty and `.` segments are dropped, a `..`
    /// segment makes the name unresolvable.
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for piece in name.split('/') {
            match piece {
                "" | "." => continue,
                ".." => return None,
                _ => path.push(piece),
            }
        }
        if path.is_file() {
            Some(normalize_path(path))
        } else {
            None
        }
    }

    /// Reads the template source, if the name resolves below this directory.
    pub fn load(&self, name: &str) -> std::io::Result<Option<(PathBuf, String)>> {
        match self.locate(name) {
            Some(path) => {
                let source = fs::read_to_string(&path)?;
                Ok(Some((path, source)))
            }
            None => Ok(None),
        }
    }
}

/// Finds the first search directory that knows `name`.
pub fn find_template(dirs: &[Arc<SearchDir>], name: &str) -> Option<PathBuf> {
    dirs.iter().find_map(|d| d.locate(name))
}

/// Origin directory of a single render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Absolute, normalized directory
    pub dir: PathBuf,
    /// The origin was given as an absolute path, so `/` joins the search chain
    pub want_root: bool,
}

/// Resolves an origin argument: a file stands for its directory, a
/// directory for itself. Anything else is reported and yields no origin.
pub fn resolve_origin<P: AsRef<Path>>(origin: P, reporter: &Reporter) -> Result<Option<Origin>> {
    let origin = origin.as_ref();
    if !origin.exists() {
        reporter.warn("resolve_origin", format!("does not exist: {:?}", origin.display().to_string()))?;
        return Ok(None);
    }

    let normalized = normalize_path(origin);
    let dir = if normalized.is_dir() {
        normalized
    } else if normalized.is_file() {
        match normalized.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        reporter.warn(
            "resolve_origin",
            format!("not a file or directory: {:?}", origin.display().to_string()),
        )?;
        return Ok(None);
    };

    let want_root = dir.is_absolute();
    Ok(Some(Origin { dir: absolute_path(dir)?, want_root }))
}

/// The configured template path together with the lookup handles created
/// for it so far.
///
/// Handles are cached for the lifetime of the resolver, keyed by absolute
/// path, so resolving the same directory twice hands out the same handle.
#[derive(Debug, Default)]
pub struct TemplatePath {
    entries: Vec<String>,
    handles: HashMap<PathBuf, Arc<SearchDir>>,
}

impl TemplatePath {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries.into_iter().map(Into::into).filter(|s: &String| !s.is_empty()).collect();
        Self { entries, handles: HashMap::new() }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of distinct lookup handles created so far.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    fn ensure_handle(&mut self, dir: &Path) -> Option<Arc<SearchDir>> {
        if let Some(handle) = self.handles.get(dir) {
            return Some(Arc::clone(handle));
        }
        if !dir.is_dir() {
            return None;
        }
        let handle = Arc::new(SearchDir { root: dir.to_path_buf() });
        self.handles.insert(dir.to_path_buf(), Arc::clone(&handle));
        Some(handle)
    }

    /// Resolves the template path into existing, de-duplicated directories,
    /// in configuration order.
    ///
    /// With `resolve_placeholders` unset every entry carrying a placeholder is
    /// skipped. Otherwise `@{CWD}` is always substituted and `@{ORIGIN}` only
    /// when `origin` resolves; entries still carrying a placeholder are
    /// skipped with a warning.
    pub fn resolve(
        &mut self,
        resolve_placeholders: bool,
        origin: Option<&Path>,
        reporter: &Reporter,
    ) -> Result<Vec<Arc<SearchDir>>> {
        const SOURCE: &str = "resolve_template_path";

        let origin = match origin {
            Some(o) => resolve_origin(o, reporter)?,
            None => None,
        };

        let mut dirs: Vec<PathBuf> = Vec::new();
        for entry in &self.entries {
            let mut s = entry.clone();
            if s.contains(PLACEHOLDER_PREFIX) {
                if !resolve_placeholders {
                    reporter.debug(SOURCE, format!("not going to resolve template path: {s:?}"));
                    continue;
                }
                let cwd = std::env::current_dir()?;
                s = s.replace(PLACEHOLDER_CWD, &cwd.to_string_lossy());
                if let Some(origin) = &origin {
                    s = s.replace(PLACEHOLDER_ORIGIN, &origin.dir.to_string_lossy());
                }
                if s.contains(PLACEHOLDER_PREFIX) {
                    reporter.warn(SOURCE, format!("failed to resolve template path: {s:?}"))?;
                    continue;
                }
            }

            let dir = absolute_path(&s)?;
            if dirs.contains(&dir) {
                reporter.info(SOURCE, format!("duplicate template path: {:?}", dir.display().to_string()));
                continue;
            }
            dirs.push(dir);
        }

        if origin.as_ref().is_some_and(|o| o.want_root) {
            let root = PathBuf::from("/");
            if dirs.contains(&root) {
                reporter.info(SOURCE, "duplicate template path: \"/\"");
            } else {
                dirs.push(root);
            }
        }

        let mut resolved = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match self.ensure_handle(&dir) {
                Some(handle) => resolved.push(handle),
                None => reporter.warn(
                    SOURCE,
                    format!("failed to load template directory: {:?}", dir.display().to_string()),
                )?,
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_refuses_parent_segments() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.j2"), "x").unwrap();
        let dir = SearchDir { root: temp_dir.path().to_path_buf() };

        assert_eq!(dir.locate("a.j2"), Some(temp_dir.path().join("a.j2")));
        assert_eq!(dir.locate("./a.j2"), Some(temp_dir.path().join("a.j2")));
        assert_eq!(dir.locate("sub/../a.j2"), None);
        assert_eq!(dir.locate("missing.j2"), None);
    }

    #[test]
    fn test_root_dir_serves_absolute_names() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.j2");
        fs::write(&file, "x").unwrap();
        let root = SearchDir { root: PathBuf::from("/") };
        assert_eq!(root.locate(&file.to_string_lossy()), Some(file));
    }
}
