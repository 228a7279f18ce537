//! Light check that a directory looks like fMRIPrep output.
//!
//! The probe only advises. It never blocks a run by itself; the caller
//! decides whether to ask the user for confirmation based on the outcome.

use std::path::Path;
use walkdir::WalkDir;

/// Substring of a subject output folder name.
pub const SUBJECT_MARKER: &str = "sub-";

/// Substring of a preprocessed file name.
pub const PREPROC_MARKER: &str = "preproc";

/// What the probe found, from most to least reassuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Subject folders exist and at least one holds a preprocessed file.
    LooksValid,
    /// Subject folders exist but none holds a preprocessed file.
    NoPreprocFiles,
    /// No subject folders at all.
    NoSubjectFolders,
}

impl ProbeOutcome {
    pub fn needs_confirmation(&self) -> bool {
        !matches!(self, ProbeOutcome::LooksValid)
    }

    /// Message shown to the user for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            ProbeOutcome::LooksValid => "fMRIPrep folder appears to contain fMRIPrep output...",
            ProbeOutcome::NoPreprocFiles => {
                "This does not appear to be an fMRIPrep output folder. While it contains folders with the string 'sub-' in their name, no files within contain the string 'preproc' (preprocessed files)."
            }
            ProbeOutcome::NoSubjectFolders => {
                "This does not appear to be an fMRIPrep output folder, as it does not contain any folders with the string 'sub-' in their name."
            }
        }
    }
}

/// Scans `root` for subject folders and preprocessed files inside them.
///
/// Stops at the first preprocessed file found under a subject folder.
/// Unreadable entries are skipped rather than reported.
pub fn probe(root: &Path) -> ProbeOutcome {
    probe_with_skip(root, None)
}

/// Like [`probe`], leaving `skip` and everything under it out of the scan.
pub fn probe_with_skip(root: &Path, skip: Option<&Path>) -> ProbeOutcome {
    let mut subject_found = false;

    let subject_dirs = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| skip.is_none_or(|s| entry.path() != s))
        .flatten()
        .filter(|entry| {
            entry.file_type().is_dir()
                && entry.file_name().to_string_lossy().contains(SUBJECT_MARKER)
        });

    for subject_dir in subject_dirs {
        subject_found = true;
        let has_preproc = WalkDir::new(subject_dir.path())
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| skip.is_none_or(|s| entry.path() != s))
            .flatten()
            .any(|entry| {
                !entry.file_type().is_dir()
                    && entry.file_name().to_string_lossy().contains(PREPROC_MARKER)
            });
        if has_preproc {
            log::debug!("probe: preprocessed file under {}", subject_dir.path().display());
            return ProbeOutcome::LooksValid;
        }
    }

    if subject_found {
        ProbeOutcome::NoPreprocFiles
    } else {
        ProbeOutcome::NoSubjectFolders
    }
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

    #[test]
    fn test_valid_output() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub-01/func/sub-01_task-rest_desc-preproc_bold.nii.gz");
        assert_eq!(probe(dir.path()), ProbeOutcome::LooksValid);
        assert!(!ProbeOutcome::LooksValid.needs_confirmation());
    }

    #[test]
    fn test_subject_without_preproc() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub-01/func/sub-01_task-rest_bold.json");
        // preproc outside any subject folder does not count
        touch(dir.path(), "logs/preproc.log");
        assert_eq!(probe(dir.path()), ProbeOutcome::NoPreprocFiles);
    }

    #[test]
    fn test_no_subject_folders() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "photos/holiday.jpg");
        let outcome = probe(dir.path());
        assert_eq!(outcome, ProbeOutcome::NoSubjectFolders);
        assert!(outcome.needs_confirmation());
    }

    #[test]
    fn test_subject_file_is_not_a_folder() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub-01.html");
        assert_eq!(probe(dir.path()), ProbeOutcome::NoSubjectFolders);
    }

    #[test]
    fn test_skipped_subtree_inside_subject_is_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub-01/func/sub-01_task-rest_bold.json");
        touch(
            dir.path(),
            "sub-01/fMRIPrepCleanup_Simulation_link/Retained/sub-01/a_preproc.nii.gz",
        );
        let skip = dir.path().join("sub-01/fMRIPrepCleanup_Simulation_link");
        assert_eq!(
            probe_with_skip(dir.path(), Some(&skip)),
            ProbeOutcome::NoPreprocFiles
        );
        assert_eq!(probe(dir.path()), ProbeOutcome::LooksValid);
    }

    #[test]
    fn test_skipped_subtree_is_ignored() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sim/Retained/sub-01/a_preproc.nii.gz");
        let skip = dir.path().join("sim");
        assert_eq!(
            probe_with_skip(dir.path(), Some(&skip)),
            ProbeOutcome::NoSubjectFolders
        );
    }
}
