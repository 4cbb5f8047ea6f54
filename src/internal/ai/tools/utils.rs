//! Path helpers shared by the file tools.

use std::path::{Component, Path, PathBuf};

use crate::internal::ai::tools::error::{ToolError, ToolResult};

/// Resolve a model-supplied path against the working directory.
///
/// Relative paths are joined onto `working_dir`; the result is normalized
/// lexically and must stay inside `working_dir`.
pub fn resolve_path(raw: &str, working_dir: &Path) -> ToolResult<PathBuf> {
    if raw.trim().is_empty() {
        return Err(ToolError::InvalidArguments("path must not be empty".into()));
    }

    let path = Path::new(raw);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    };

    let resolved = normalize(&joined);
    if !resolved.starts_with(normalize(working_dir)) {
        return Err(ToolError::OutsideWorkingDir(resolved));
    }
    Ok(resolved)
}

/// Lexical normalization: drops `.` and folds `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Display form of `path` relative to `working_dir` when possible.
pub fn display_path(path: &Path, working_dir: &Path) -> String {
    path.strip_prefix(working_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_joined() {
        let working_dir = PathBuf::from("/tmp/work");
        let resolved = resolve_path("src/main.rs", &working_dir).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/work/src/main.rs"));
    }

    #[test]
    fn test_absolute_path_inside_accepted() {
        let working_dir = PathBuf::from("/tmp/work");
        let resolved = resolve_path("/tmp/work/./a/../b.txt", &working_dir).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/work/b.txt"));
    }

    #[test]
    fn test_escaping_paths_rejected() {
        let working_dir = PathBuf::from("/tmp/work");
        assert!(matches!(
            resolve_path("../secret", &working_dir),
            Err(ToolError::OutsideWorkingDir(_))
        ));
        assert!(matches!(
            resolve_path("/etc/passwd", &working_dir),
            Err(ToolError::OutsideWorkingDir(_))
        ));
        assert!(matches!(
            resolve_path("/tmp/workshop/x", &working_dir),
            Err(ToolError::OutsideWorkingDir(_))
        ));
    }

    #[test]
    fn test_empty_path_rejected() {
        let working_dir = PathBuf::from("/tmp/work");
        assert!(matches!(
            resolve_path("  ", &working_dir),
            Err(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_display_path() {
        let working_dir = PathBuf::from("/tmp/work");
        assert_eq!(
            display_path(Path::new("/tmp/work/a/b.txt"), &working_dir),
            "a/b.txt"
        );
        assert_eq!(display_path(Path::new("/etc/hosts"), &working_dir), "/etc/hosts");
    }
}
