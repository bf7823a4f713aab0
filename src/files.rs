//! Path helpers and standard stream detection.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use crate::constants::{STDIN_PATH, STDOUT_PATH, STREAM_MARKER};

/// Lexically normalizes a path: drops `.` segments and folds `..` into the
/// preceding segment. Symbolic links are not resolved.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // ".." at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Makes a path absolute against the working directory and normalizes it.
pub fn absolute_path<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        Ok(normalize_path(std::env::current_dir()?.join(path)))
    }
}

#[cfg(unix)]
fn file_identity(path: &Path) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).ok().map(|m| (m.dev(), m.ino()))
}

#[cfg(not(unix))]
fn file_identity(_path: &Path) -> Option<(u64, u64)> {
    None
}

fn stdin_identity() -> Option<(u64, u64)> {
    static STDIN: OnceLock<Option<(u64, u64)>> = OnceLock::new();
    *STDIN.get_or_init(|| file_identity(Path::new(STDIN_PATH)))
}

fn stdout_identity() -> Option<(u64, u64)> {
    static STDOUT: OnceLock<Option<(u64, u64)>> = OnceLock::new();
    *STDOUT.get_or_init(|| file_identity(Path::new(STDOUT_PATH)))
}

fn is_stream(path: &Path, device: &str, identity: Option<(u64, u64)>) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    if path == Path::new(STREAM_MARKER) || path == Path::new(device) {
        return true;
    }
    match identity {
        Some(stream) => path.exists() && file_identity(path) == Some(stream),
        None => false,
    }
}

/// Whether the path designates the standard input stream.
pub fn is_stdin<P: AsRef<Path>>(path: P) -> bool {
    is_stream(path.as_ref(), STDIN_PATH, stdin_identity())
}

/// Whether the path designates the standard output stream.
pub fn is_stdout<P: AsRef<Path>>(path: P) -> bool {
    is_stream(path.as_ref(), STDOUT_PATH, stdout_identity())
}

/// Whether both paths point at the same file on disk.
pub fn is_same_file<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> io::Result<bool> {
    let (a, b) = (a.as_ref(), b.as_ref());
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let (ma, mb) = (fs::metadata(a)?, fs::metadata(b)?);
        Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
    }
    #[cfg(not(unix))]
    {
        Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/./b/../c"), PathBuf::from("/a/c"));
        assert_eq!(normalize_path("/../x"), PathBuf::from("/x"));
        assert_eq!(normalize_path("a/.."), PathBuf::from("."));
        assert_eq!(normalize_path("../a"), PathBuf::from("../a"));
        assert_eq!(normalize_path("/a/b/"), PathBuf::from("/a/b"));
        assert_eq!(normalize_path(""), PathBuf::from("."));
    }

    #[test]
    fn test_absolute_path_is_normalized() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_path("x/../y").unwrap(), normalize_path(cwd.join("y")));
        assert_eq!(absolute_path("/tmp/./z").unwrap(), PathBuf::from("/tmp/z"));
    }

    #[test]
    fn test_stream_markers() {
        assert!(is_stdin("-"));
        assert!(is_stdin("/dev/stdin"));
        assert!(is_stdout("-"));
        assert!(is_stdout("/dev/stdout"));
        assert!(!is_stdin(""));
        assert!(!is_stdin("some/file.j2"));
    }

    #[test]
    fn test_is_same_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "x").unwrap();
        assert!(is_same_file(&a, dir.path().join(".").join("a.txt")).unwrap());
        let b = dir.path().join("b.txt");
        fs::write(&b, "x").unwrap();
        assert!(!is_same_file(&a, &b).unwrap());
    }
}
