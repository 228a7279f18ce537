//! Applies classifications to the filesystem in one of three modes.
//!
//! `Delete` works on the fMRIPrep tree itself. The two simulation modes
//! never touch it: they build a fresh `Retained`/`Deleted` mirror of the
//! tree out of symbolic links or copies. Every action is written to the
//! transcript as it happens.

use crate::classifier::{Classification, Classifier};
use crate::error::{CleanupError, CleanupResult};
use crate::output::{Action, OutputFormatter};
use crate::walker::{DirLevel, TreeWalker, relative_to};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the simulation folder created in the output directory.
pub const SIMULATION_PREFIX: &str = "fMRIPrepCleanup_Simulation_";

/// How classifications are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Mirror the outcome with symbolic links.
    #[value(name = "sim_link")]
    SimLink,
    /// Mirror the outcome with copies.
    #[value(name = "sim_copy")]
    SimCopy,
    /// Delete for real.
    #[value(name = "delete")]
    Delete,
}

impl Method {
    pub fn is_simulation(&self) -> bool {
        !matches!(self, Method::Delete)
    }

    /// Name of the simulation folder, `None` in delete mode.
    pub fn simulation_dir_name(&self) -> Option<String> {
        match self {
            Method::SimLink => Some(format!("{}link", SIMULATION_PREFIX)),
            Method::SimCopy => Some(format!("{}copy", SIMULATION_PREFIX)),
            Method::Delete => None,
        }
    }
}

/// Where one file ended up, relative to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub relative_path: PathBuf,
    pub classification: Classification,
}

/// Counts and placements gathered during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub retained: usize,
    pub removed: usize,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    pub links_created: usize,
    pub files_copied: usize,
    /// Directories that vanished or filled up between listing and removal.
    pub prune_skipped: usize,
    /// Every file visited, in walk order.
    pub placements: Vec<Placement>,
}

impl CleanupReport {
    fn record(&mut self, relative_path: &Path, classification: Classification) {
        match classification {
            Classification::Retain => self.retained += 1,
            Classification::Remove => self.removed += 1,
        }
        self.placements.push(Placement {
            relative_path: relative_path.to_path_buf(),
            classification,
        });
    }

    /// Relative paths with the given outcome, in walk order.
    pub fn paths_with(&self, classification: Classification) -> Vec<&Path> {
        self.placements
            .iter()
            .filter(|p| p.classification == classification)
            .map(|p| p.relative_path.as_path())
            .collect()
    }

    /// Rows for the end-of-run summary table.
    pub fn summary_rows(&self, method: Method) -> Vec<(&'static str, usize)> {
        let mut rows = vec![("Retained files", self.retained), ("Removed files", self.removed)];
        match method {
            Method::Delete => {
                rows.push(("Files deleted", self.files_deleted));
                rows.push(("Directories deleted", self.dirs_deleted));
                if self.prune_skipped > 0 {
                    rows.push(("Directories skipped", self.prune_skipped));
                }
            }
            Method::SimLink => rows.push(("Links created", self.links_created)),
            Method::SimCopy => {
                rows.push(("Files copied", self.files_copied));
                if self.links_created > 0 {
                    rows.push(("Links created", self.links_created));
                }
            }
        }
        rows
    }
}

/// JSON manifest of a finished run.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub timestamp: String,
    pub method: Method,
    pub root: &'a Path,
    pub simulation_root: Option<&'a Path>,
    pub report: &'a CleanupReport,
}

impl<'a> Manifest<'a> {
    pub fn new(
        method: Method,
        root: &'a Path,
        simulation_root: Option<&'a Path>,
        report: &'a CleanupReport,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            method,
            root,
            simulation_root,
            report,
        }
    }

    /// Writes the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> CleanupResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CleanupError::Manifest(format!("JSON serialization failed: {}", e)))?;
        fs::write(path, json).map_err(|e| CleanupError::io(path, e))
    }
}

/// Carries out one run over a root directory.
pub struct Executor<'a> {
    root: PathBuf,
    classifier: Classifier<'a>,
    method: Method,
    simulation_root: Option<PathBuf>,
}

impl<'a> Executor<'a> {
    /// Sets up a run. `out_dir` is where the simulation folder goes and is
    /// ignored in delete mode.
    pub fn new(root: &Path, classifier: Classifier<'a>, method: Method, out_dir: &Path) -> Self {
        let simulation_root = method
            .simulation_dir_name()
            .map(|name| out_dir.join(name));
        Self {
            root: root.to_path_buf(),
            classifier,
            method,
            simulation_root,
        }
    }

    /// `<out_dir>/fMRIPrepCleanup_Simulation_<mode>` in simulation modes.
    pub fn simulation_root(&self) -> Option<&Path> {
        self.simulation_root.as_deref()
    }

    /// Walks the root in post-order and applies the selected mode.
    ///
    /// In simulation modes the simulation folder is recreated first and left
    /// out of the walk. In delete mode each level is handled after all of its
    /// subdirectories, so emptied directories can be pruned on the way up.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::SimulationOverlapsRoot`] when the simulation
    /// folder would contain the root, and [`CleanupError::Io`] when a file
    /// cannot be deleted, linked or copied. Failed pruning of an empty
    /// directory is not an error; it is counted in
    /// [`CleanupReport::prune_skipped`].
    pub fn run(&self) -> CleanupResult<CleanupReport> {
        let mut report = CleanupReport::default();

        let mut walker = TreeWalker::new(&self.root);
        if let Some(sim_root) = &self.simulation_root {
            self.prepare_simulation_root(sim_root)?;
            walker = walker.skip(sim_root);
        }

        for level in walker.levels()? {
            match &self.simulation_root {
                Some(sim_root) => self.mirror_level(&level, sim_root, &mut report)?,
                None => self.delete_level(&level, &mut report)?,
            }
        }

        log::info!(
            "{} retained, {} removed under {}",
            report.retained,
            report.removed,
            self.root.display()
        );
        Ok(report)
    }

    fn classify_file(&self, file: &Path) -> (PathBuf, Classification) {
        let relative = relative_to(file, &self.root).to_path_buf();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let classification = self.classifier.classify(&relative, &file_name);
        log::debug!("{}: {}", classification, relative.display());
        (relative, classification)
    }

    /// Deletes and recreates the simulation folder.
    fn prepare_simulation_root(&self, sim_root: &Path) -> CleanupResult<()> {
        if self.root.starts_with(sim_root) {
            return Err(CleanupError::SimulationOverlapsRoot {
                sim_root: sim_root.to_path_buf(),
                root: self.root.clone(),
            });
        }

        if sim_root.exists() {
            OutputFormatter::action(Action::ReplaceSimulationFolder, sim_root);
            fs::remove_dir_all(sim_root).map_err(|e| CleanupError::io(sim_root, e))?;
            fs::create_dir(sim_root).map_err(|e| CleanupError::io(sim_root, e))?;
        } else {
            fs::create_dir(sim_root).map_err(|e| CleanupError::io(sim_root, e))?;
            OutputFormatter::action(Action::CreateSimulationFolder, sim_root);
        }
        Ok(())
    }

    /// Links or copies each file of a level under `Retained` or `Deleted`.
    fn mirror_level(
        &self,
        level: &DirLevel,
        sim_root: &Path,
        report: &mut CleanupReport,
    ) -> CleanupResult<()> {
        for file in &level.files {
            let (relative, classification) = self.classify_file(file);
            let destination = sim_root.join(classification.dir_name()).join(&relative);

            if let Some(parent) = destination.parent()
                && !parent.exists()
            {
                fs::create_dir_all(parent).map_err(|e| CleanupError::io(parent, e))?;
            }

            if self.method == Method::SimLink || links_to_directory(file) {
                make_link(file, &destination).map_err(|e| CleanupError::io(&destination, e))?;
                OutputFormatter::action(Action::CreateLink, &destination);
                report.links_created += 1;
            } else {
                fs::copy(file, &destination).map_err(|e| CleanupError::io(file, e))?;
                OutputFormatter::action(Action::CopyFile, &destination);
                report.files_copied += 1;
            }

            report.record(&relative, classification);
        }
        Ok(())
    }

    /// Deletes removable files of a level, purges special subdirectories,
    /// then prunes subdirectories left empty.
    fn delete_level(&self, level: &DirLevel, report: &mut CleanupReport) -> CleanupResult<()> {
        for file in &level.files {
            let (relative, classification) = self.classify_file(file);
            if classification == Classification::Remove {
                OutputFormatter::action(Action::DeleteFile, file);
                fs::remove_file(file).map_err(|e| CleanupError::io(file, e))?;
                report.files_deleted += 1;
            }
            report.record(&relative, classification);
        }

        for subdir in &level.subdirs {
            let relative = relative_to(subdir, &self.root);
            if self.classifier.purge_whole_directory(relative) && subdir.exists() {
                fs::remove_dir_all(subdir).map_err(|e| CleanupError::io(subdir, e))?;
                OutputFormatter::action(Action::DeleteDirectory, subdir);
                report.dirs_deleted += 1;
            }
        }

        for subdir in &level.subdirs {
            self.prune_if_empty(subdir, report);
        }
        Ok(())
    }

    /// Removes `dir` when it has no entries. Failures are skipped: the
    /// directory may have vanished or gained entries since it was listed.
    fn prune_if_empty(&self, dir: &Path, report: &mut CleanupReport) {
        if !dir.exists() {
            return;
        }

        let is_empty = match fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) => {
                log::debug!("skipping prune of {}: {}", dir.display(), e);
                report.prune_skipped += 1;
                return;
            }
        };

        if is_empty {
            match fs::remove_dir(dir) {
                Ok(()) => {
                    OutputFormatter::action(Action::DeleteEmptyDirectory, dir);
                    report.dirs_deleted += 1;
                }
                Err(e) => {
                    log::debug!("skipping prune of {}: {}", dir.display(), e);
                    report.prune_skipped += 1;
                }
            }
        }
    }
}

/// True for a symlink whose target is a directory. Such entries cannot be
/// copied as files, so copy simulations mirror them as links.
fn links_to_directory(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
        && fs::metadata(path).is_ok_and(|m| m.is_dir())
}

#[cfg(unix)]
fn make_link(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn make_link(original: &Path, link: &Path) -> std::io::Result<()> {
    if fs::metadata(original).is_ok_and(|m| m.is_dir()) {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}
