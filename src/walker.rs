//! Post-order enumeration of the fMRIPrep tree.
//!
//! The walk groups entries by directory and yields one [`DirLevel`] per
//! directory, deepest first: a directory's level comes after the levels of
//! all its subdirectories. Symlinks are never followed, so the walk cannot
//! cycle. Listings are sorted by file name to keep runs deterministic.

use crate::error::CleanupResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One directory of the tree with its direct children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirLevel {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Non-directory entries directly inside (regular files and symlinks).
    pub files: Vec<PathBuf>,
    /// Immediate subdirectories.
    pub subdirs: Vec<PathBuf>,
}

/// Collects directory levels under a root.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    skip: Vec<PathBuf>,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skip: Vec::new(),
        }
    }

    /// Leaves `path` and everything below it out of the walk.
    pub fn skip(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the tree and returns its levels in post-order.
    ///
    /// The root's own level is always last. The listing is taken in full
    /// before anything is returned, so callers may mutate the tree while
    /// working through the levels.
    pub fn levels(&self) -> CleanupResult<Vec<DirLevel>> {
        let mut pending: HashMap<PathBuf, DirLevel> = HashMap::new();
        let mut levels = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.skip.iter().any(|s| entry.path() == s.as_path()));

        for entry in walker {
            let entry = entry?;
            let path = entry.path().to_path_buf();
            let is_dir = entry.file_type().is_dir();

            if entry.depth() > 0
                && let Some(parent) = path.parent()
            {
                let parent_level = pending
                    .entry(parent.to_path_buf())
                    .or_insert_with(|| DirLevel {
                        path: parent.to_path_buf(),
                        ..Default::default()
                    });
                if is_dir {
                    parent_level.subdirs.push(path.clone());
                } else {
                    parent_level.files.push(path.clone());
                }
            }

            // With contents_first, a directory arrives after everything in it
            if is_dir {
                let level = pending.remove(&path).unwrap_or_else(|| DirLevel {
                    path: path.clone(),
                    ..Default::default()
                });
                levels.push(level);
            }
        }

        log::debug!(
            "walked {} directories under {}",
            levels.len(),
            self.root.display()
        );
        Ok(levels)
    }
}

/// Path of `path` relative to `root`, or `path` itself when outside it.
pub fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn position(levels: &[DirLevel], path: &Path) -> usize {
        levels.iter().position(|l| l.path == path).unwrap()
    }

    #[test]
    fn test_levels_are_post_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "sub-01/anat/a.nii.gz");
        touch(root, "sub-01/func/b.nii.gz");
        touch(root, "sub-01.html");

        let levels = TreeWalker::new(root).levels().unwrap();

        assert_eq!(levels.len(), 4);
        assert_eq!(levels.last().unwrap().path, root);
        let sub = position(&levels, &root.join("sub-01"));
        assert!(position(&levels, &root.join("sub-01/anat")) < sub);
        assert!(position(&levels, &root.join("sub-01/func")) < sub);
    }

    #[test]
    fn test_levels_expose_files_and_subdirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "sub-01/anat/b.nii.gz");
        touch(root, "sub-01/anat/a.nii.gz");
        touch(root, "sub-01/sub-01.html");

        let levels = TreeWalker::new(root).levels().unwrap();
        let sub = &levels[position(&levels, &root.join("sub-01"))];
        assert_eq!(sub.files, vec![root.join("sub-01/sub-01.html")]);
        assert_eq!(sub.subdirs, vec![root.join("sub-01/anat")]);

        let anat = &levels[position(&levels, &root.join("sub-01/anat"))];
        assert_eq!(
            anat.files,
            vec![root.join("sub-01/anat/a.nii.gz"), root.join("sub-01/anat/b.nii.gz")]
        );
        assert!(anat.subdirs.is_empty());
    }

    #[test]
    fn test_empty_directories_get_a_level() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("logs/empty")).unwrap();

        let levels = TreeWalker::new(root).levels().unwrap();
        let empty = &levels[position(&levels, &root.join("logs/empty"))];
        assert!(empty.files.is_empty() && empty.subdirs.is_empty());
    }

    #[test]
    fn test_skip_excludes_subtree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "keep/a.txt");
        touch(root, "skipped/b.txt");

        let levels = TreeWalker::new(root)
            .skip(root.join("skipped"))
            .levels()
            .unwrap();
        assert!(levels.iter().all(|l| !l.path.starts_with(root.join("skipped"))));
        assert_eq!(levels.last().unwrap().subdirs, vec![root.join("keep")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "sub-01/a.txt");
        std::os::unix::fs::symlink(root, root.join("sub-01/loop")).unwrap();

        let levels = TreeWalker::new(root).levels().unwrap();
        assert_eq!(levels.len(), 2);
        let sub = &levels[position(&levels, &root.join("sub-01"))];
        assert!(sub.files.contains(&root.join("sub-01/loop")));
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/data/fmriprep");
        assert_eq!(
            relative_to(Path::new("/data/fmriprep/sub-01/anat"), root),
            Path::new("sub-01/anat")
        );
        assert_eq!(relative_to(Path::new("/elsewhere"), root), Path::new("/elsewhere"));
    }
}
