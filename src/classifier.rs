//! Per-file and per-directory retention decisions.
//!
//! Classification depends only on the file's name, its path relative to the
//! root, and the resolved [`StringSets`]. It never looks at file contents or
//! at sibling decisions, so the order of the walk cannot change the outcome.

use crate::string_sets::{SPECIAL_DIR_MARKERS, StringSets};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Whether a file survives the cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Retain,
    Remove,
}

impl Classification {
    /// Name of the simulation subtree that mirrors files with this outcome.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Classification::Retain => "Retained",
            Classification::Remove => "Deleted",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Retain => write!(f, "RETAIN"),
            Classification::Remove => write!(f, "REMOVE"),
        }
    }
}

/// True when `relative_path` lies in (or is) a special directory.
///
/// Markers are matched against the path relative to the root, so the
/// location of the root itself never makes everything special.
pub fn is_special_path(relative_path: &Path) -> bool {
    let path = relative_path.to_string_lossy();
    SPECIAL_DIR_MARKERS
        .iter()
        .any(|marker| path.contains(marker))
}

/// Applies the resolved string sets to files.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    sets: &'a StringSets,
}

impl<'a> Classifier<'a> {
    pub fn new(sets: &'a StringSets) -> Self {
        Self { sets }
    }

    /// Classifies one file by its name and its path relative to the root.
    ///
    /// Inside special directories only a keep string can save a file. Anywhere
    /// else a file is retained when it contains a target and no exclusion.
    pub fn classify(&self, relative_path: &Path, file_name: &str) -> Classification {
        if is_special_path(relative_path) {
            if self.sets.matches_keep(file_name) {
                return Classification::Retain;
            }
            return Classification::Remove;
        }
        self.classify_name(file_name)
    }

    /// Target/exclusion rule on its own, ignoring special directories.
    pub fn classify_name(&self, file_name: &str) -> Classification {
        if self.sets.matches_target(file_name) && !self.sets.matches_exclusion(file_name) {
            Classification::Retain
        } else {
            Classification::Remove
        }
    }

    /// A special directory is removed outright (not just emptied) when no keep
    /// strings exist, since nothing inside it can be retained.
    pub fn purge_whole_directory(&self, relative_dir: &Path) -> bool {
        is_special_path(relative_dir) && !self.sets.has_keep_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(keep: &[&str], delete: &[&str]) -> StringSets {
        let keep: Vec<String> = keep.iter().map(|s| s.to_string()).collect();
        let delete: Vec<String> = delete.iter().map(|s| s.to_string()).collect();
        StringSets::resolve(&keep, &delete)
    }

    const PREPROC: &str = "sub-01/func/sub-01_task-rest_bold_preproc.nii.gz";
    const SIDECAR: &str = "sub-01/func/sub-01_task-rest_bold.json";

    fn classify(sets: &StringSets, rel: &str) -> Classification {
        let path = Path::new(rel);
        let name = path.file_name().unwrap().to_string_lossy();
        Classifier::new(sets).classify(path, &name)
    }

    #[test]
    fn test_defaults_keep_preproc_and_drop_sidecar() {
        let sets = sets(&[], &[]);
        assert_eq!(classify(&sets, PREPROC), Classification::Retain);
        assert_eq!(classify(&sets, SIDECAR), Classification::Remove);
    }

    #[test]
    fn test_exclusion_overrides_target() {
        let sets = sets(&[], &["preproc"]);
        assert_eq!(classify(&sets, PREPROC), Classification::Remove);
    }

    #[test]
    fn test_keep_restores_after_conflict() {
        let sets = sets(&["preproc"], &["preproc"]);
        assert_eq!(classify(&sets, PREPROC), Classification::Retain);
    }

    #[test]
    fn test_index_html_removed() {
        let sets = sets(&[], &[]);
        assert_eq!(classify(&sets, "sub-01/index.html"), Classification::Remove);
        assert_eq!(classify(&sets, "sub-01.html"), Classification::Retain);
    }

    #[test]
    fn test_special_directory_purged_without_keep() {
        let sets = sets(&[], &[]);
        assert_eq!(
            classify(&sets, "sub-01/anat/single_subject_report.html"),
            Classification::Remove
        );
        assert_eq!(
            classify(&sets, "sourcedata/freesurfer/fsaverage/surf/lh.preproc"),
            Classification::Remove
        );
    }

    #[test]
    fn test_special_directory_keep_override() {
        let sets = sets(&["lh."], &[]);
        assert_eq!(
            classify(&sets, "fsaverage/surf/lh.pial"),
            Classification::Retain
        );
        // Default targets do not count inside special directories
        assert_eq!(
            classify(&sets, "fsaverage/surf/rh.preproc.svg"),
            Classification::Remove
        );
    }

    #[test]
    fn test_classification_ignores_root_location() {
        let sets = sets(&[], &[]);
        let classifier = Classifier::new(&sets);
        assert_eq!(
            classifier.classify(Path::new("sub-01/anat/x_preproc.nii.gz"), "x_preproc.nii.gz"),
            Classification::Retain
        );
        assert!(!is_special_path(Path::new("sub-01/anat")));
        assert!(is_special_path(Path::new("sub-01/figures/single_subject_01_wf")));
    }

    #[test]
    fn test_purge_whole_directory() {
        let without_keep = sets(&[], &[]);
        let with_keep = sets(&["aseg"], &[]);
        let dir = Path::new("work/single_subject_01_wf");
        assert!(Classifier::new(&without_keep).purge_whole_directory(dir));
        assert!(!Classifier::new(&with_keep).purge_whole_directory(dir));
        assert!(!Classifier::new(&without_keep).purge_whole_directory(Path::new("sub-01")));
    }

    #[test]
    fn test_dir_names() {
        assert_eq!(Classification::Retain.dir_name(), "Retained");
        assert_eq!(Classification::Remove.dir_name(), "Deleted");
        assert_eq!(Classification::Remove.to_string(), "REMOVE");
    }
}
