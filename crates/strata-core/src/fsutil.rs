//! Filesystem utilities: crash-safe writes and snapshot-tree traversal.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StrataResult;

/// Write data to a file atomically using temp-file-then-rename.
///
/// On POSIX, `rename()` within the same filesystem is atomic: either the
/// old file or the new file is visible, never a partial write. We fsync
/// the temp file before renaming so the data is durable on disk.
pub fn atomic_write(path: &Path, data: &[u8]) -> StrataResult<()> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_data()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// One entry of a snapshot tree, relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the traversal root.
    pub rel_path: PathBuf,
    pub is_dir: bool,
}

/// Enumerate a directory tree as `(relative path, is_dir)` pairs.
///
/// The traversal is depth-first with entries sorted by name, so the
/// result is deterministic and parents always precede their children.
/// The root itself is not included. Pure with respect to the caller:
/// no copying or deletion happens here.
pub fn walk_tree(root: &Path) -> StrataResult<Vec<TreeEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let rel_path = match entry.path().strip_prefix(root) {
            Ok(p) => p.to_path_buf(),
            Err(_) => continue,
        };
        entries.push(TreeEntry {
            rel_path,
            is_dir: entry.file_type().is_dir(),
        });
    }

    Ok(entries)
}

/// Copy every entry of `src` into `dst`, byte for byte.
///
/// `dst` must already exist. Consumes the pure [`walk_tree`]
/// enumeration; directories are created before their contents because
/// the traversal yields parents first.
pub fn copy_tree(src: &Path, dst: &Path) -> StrataResult<()> {
    for entry in walk_tree(src)? {
        let target = dst.join(&entry.rel_path);
        if entry.is_dir {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(src.join(&entry.rel_path), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("current");

        atomic_write(&path, b"0").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0");

        atomic_write(&path, b"17").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "17");
    }

    #[test]
    fn test_walk_tree_empty() {
        let dir = tempdir().unwrap();
        assert!(walk_tree(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_walk_tree_nested() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b").unwrap();

        let entries = walk_tree(dir.path()).unwrap();
        let paths: Vec<_> = entries
            .iter()
            .map(|e| (e.rel_path.to_string_lossy().to_string(), e.is_dir))
            .collect();

        assert_eq!(
            paths,
            vec![
                ("a.txt".to_string(), false),
                ("sub".to_string(), true),
                ("sub/b.txt".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_copy_tree_nested() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(src.path().join("sub")).unwrap();
        fs::write(src.path().join("sub/b.txt"), "beta").unwrap();

        copy_tree(src.path(), dst.path()).unwrap();

        assert_eq!(fs::read_to_string(dst.path().join("a.txt")).unwrap(), "alpha");
        assert_eq!(
            fs::read_to_string(dst.path().join("sub/b.txt")).unwrap(),
            "beta"
        );
    }

    #[test]
    fn test_copy_tree_overwrites_existing_files() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        fs::write(src.path().join("a.txt"), "new").unwrap();
        fs::write(dst.path().join("a.txt"), "old").unwrap();

        copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(fs::read_to_string(dst.path().join("a.txt")).unwrap(), "new");
    }
}
