//! Dependency cache relocation
//!
//! Moves `<project>/node_modules` to `<project>/node_modules.nosync` (or
//! creates the latter) and leaves a symlink at the original path. Sync tools
//! that honour the `.nosync` suffix then skip the dependency tree while
//! package managers keep working through the link.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, info};

/// What relocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationKind {
    /// An existing cache folder was renamed to the no-sync sibling
    Moved,
    /// The no-sync sibling was created empty
    Created,
    /// The cache path already linked to the sibling
    AlreadyLinked,
}

/// Result of [`relocate_cache`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub kind: RelocationKind,
    /// Symlink at the original cache path
    pub link: Utf8PathBuf,
    /// No-sync folder the link points to
    pub target: Utf8PathBuf,
}

/// Relocate `cache_dir` inside `project_dir` to `cache_dir + suffix`
///
/// The link target is absolute. A relative `project_dir` is resolved
/// against the current working directory first.
///
/// # Errors
/// Returns [`Error::RelocationFailed`] if the cache path is a file, is a
/// symlink pointing elsewhere, or if any rename, create, or link fails.
pub fn relocate_cache(project_dir: &Utf8Path, cache_dir: &str, suffix: &str) -> Result<Relocation> {
    let project_dir = absolute(project_dir)?;
    if !project_dir.is_dir() {
        return Err(Error::relocation_failed(
            project_dir.as_str(),
            "project folder does not exist",
        ));
    }
    let link = project_dir.join(cache_dir);
    let target = project_dir.join(format!("{}{}", cache_dir, suffix));

    let kind = match fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let current =
                fs::read_link(&link).map_err(|e| Error::relocation_failed(link.as_str(), e))?;
            let resolved = if current.is_absolute() {
                current.clone()
            } else {
                project_dir.as_std_path().join(&current)
            };
            if !same_location(&resolved, target.as_std_path()) {
                return Err(Error::relocation_failed(
                    link.as_str(),
                    format!("already a symlink to {}", current.display()),
                ));
            }
            if !target.exists() {
                fs::create_dir_all(&target)
                    .map_err(|e| Error::relocation_failed(target.as_str(), e))?;
            }
            debug!("{} already links to {}", link, target);
            return Ok(Relocation {
                kind: RelocationKind::AlreadyLinked,
                link,
                target,
            });
        }
        Ok(meta) if meta.is_dir() => {
            if fs::symlink_metadata(&target).is_ok() {
                return Err(Error::relocation_failed(
                    target.as_str(),
                    "destination already exists",
                ));
            }
            info!("Moving {} -> {}", link, target);
            fs::rename(&link, &target).map_err(|e| Error::relocation_failed(link.as_str(), e))?;
            RelocationKind::Moved
        }
        Ok(_) => {
            return Err(Error::relocation_failed(
                link.as_str(),
                "exists but is not a directory",
            ));
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("Creating {}", target);
            fs::create_dir_all(&target)
                .map_err(|e| Error::relocation_failed(target.as_str(), e))?;
            RelocationKind::Created
        }
        Err(e) => return Err(Error::relocation_failed(link.as_str(), e)),
    };

    symlink_dir(&target, &link).map_err(|e| Error::relocation_failed(link.as_str(), e))?;
    info!("Linked {} -> {}", link, target);

    Ok(Relocation { kind, link, target })
}

fn absolute(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let abs = std::path::absolute(path).map_err(|e| Error::relocation_failed(path.as_str(), e))?;
    Utf8PathBuf::try_from(abs)
        .map_err(|_| Error::relocation_failed(path.as_str(), "path is not valid UTF-8"))
}

fn same_location(a: &std::path::Path, b: &std::path::Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Utf8Path, link: &Utf8Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Utf8Path, link: &Utf8Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        (temp, dir)
    }

    #[test]
    fn test_moves_existing_cache() {
        let (_temp, dir) = project();
        fs::create_dir(dir.join("node_modules")).unwrap();
        fs::write(dir.join("node_modules").join("marker"), "x").unwrap();

        let result = relocate_cache(&dir, "node_modules", ".nosync").unwrap();
        assert_eq!(result.kind, RelocationKind::Moved);
        assert_eq!(result.link, dir.join("node_modules"));
        assert_eq!(result.target, dir.join("node_modules.nosync"));

        let meta = fs::symlink_metadata(&result.link).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&result.link).unwrap(), result.target.as_std_path());
        // Contents survive and are reachable through the link
        assert!(dir.join("node_modules.nosync").join("marker").exists());
        assert!(dir.join("node_modules").join("marker").exists());
    }

    #[test]
    fn test_creates_missing_cache() {
        let (_temp, dir) = project();

        let result = relocate_cache(&dir, "node_modules", ".nosync").unwrap();
        assert_eq!(result.kind, RelocationKind::Created);
        assert!(result.target.is_dir());
        assert_eq!(fs::read_dir(&result.target).unwrap().count(), 0);
        assert!(fs::symlink_metadata(&result.link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(
            fs::canonicalize(&result.link).unwrap(),
            fs::canonicalize(&result.target).unwrap()
        );
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let (_temp, dir) = project();
        relocate_cache(&dir, "node_modules", ".nosync").unwrap();

        let again = relocate_cache(&dir, "node_modules", ".nosync").unwrap();
        assert_eq!(again.kind, RelocationKind::AlreadyLinked);
    }

    #[test]
    fn test_file_at_cache_path_fails() {
        let (_temp, dir) = project();
        fs::write(dir.join("node_modules"), "not a dir").unwrap();

        let err = relocate_cache(&dir, "node_modules", ".nosync").unwrap_err();
        assert!(matches!(err, Error::RelocationFailed { .. }));
    }

    #[test]
    fn test_existing_sibling_blocks_move() {
        let (_temp, dir) = project();
        fs::create_dir(dir.join("node_modules")).unwrap();
        fs::create_dir(dir.join("node_modules.nosync")).unwrap();

        let err = relocate_cache(&dir, "node_modules", ".nosync").unwrap_err();
        assert!(matches!(
            err,
            Error::RelocationFailed { ref path, .. } if path.ends_with("node_modules.nosync")
        ));
        // Nothing was moved
        assert!(!fs::symlink_metadata(dir.join("node_modules"))
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn test_foreign_symlink_fails() {
        let (_temp, dir) = project();
        fs::create_dir(dir.join("elsewhere")).unwrap();
        std::os::unix::fs::symlink(dir.join("elsewhere"), dir.join("node_modules")).unwrap();

        let err = relocate_cache(&dir, "node_modules", ".nosync").unwrap_err();
        assert!(err.to_string().contains("already a symlink"));
    }

    #[test]
    fn test_missing_project_dir_fails() {
        let (_temp, dir) = project();
        let err = relocate_cache(&dir.join("absent"), "node_modules", ".nosync").unwrap_err();
        assert!(matches!(err, Error::RelocationFailed { .. }));
    }
}
