//! Command-line orchestration for fmriprep-cleanup.
//!
//! A run goes through the same gates in every mode:
//! 1. Validate the request (paths, list values, mode/output combination)
//! 2. Resolve the target and exclusion strings
//! 3. Show the plan and ask for confirmation
//! 4. Probe the tree and ask again if it does not look like fMRIPrep output
//! 5. Delete, or build the simulation folder
//!
//! Nothing on disk changes before step 5.

use crate::classifier::Classifier;
use crate::config::{CleanupConfig, parse_string_list};
use crate::error::{CleanupError, CleanupResult};
use crate::executor::{CleanupReport, Executor, Manifest, Method};
use crate::output::OutputFormatter;
use crate::probe::{ProbeOutcome, probe_with_skip};
use crate::prompt::Confirm;
use crate::string_sets::StringSets;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a run needs, after argument parsing.
#[derive(Debug, Clone)]
pub struct CleanupRequest {
    /// The fMRIPrep output directory.
    pub root: PathBuf,
    pub method: Method,
    /// Where the simulation folder is created. Defaults to the current directory.
    pub out_path: Option<PathBuf>,
    pub also_keep: Vec<String>,
    pub also_delete: Vec<String>,
    /// Optional JSON manifest of the finished run.
    pub manifest: Option<PathBuf>,
}

impl CleanupRequest {
    pub fn new(root: impl Into<PathBuf>, method: Method) -> Self {
        Self {
            root: root.into(),
            method,
            out_path: None,
            also_keep: Vec::new(),
            also_delete: Vec::new(),
            manifest: None,
        }
    }

    /// Appends comma separated keep strings, validating them first.
    pub fn with_also_keep(mut self, value: &str) -> CleanupResult<Self> {
        self.also_keep
            .extend(parse_string_list("--also-keep", value)?);
        Ok(self)
    }

    /// Appends comma separated delete strings, validating them first.
    pub fn with_also_delete(mut self, value: &str) -> CleanupResult<Self> {
        self.also_delete
            .extend(parse_string_list("--also-delete", value)?);
        Ok(self)
    }

    pub fn with_out_path(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = Some(out_path.into());
        self
    }

    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    /// Folds in list entries and the output directory from a config file.
    ///
    /// Config entries come first. An output path already on the request wins.
    pub fn merge_config(mut self, config: CleanupConfig) -> Self {
        let mut also_keep = config.strings.also_keep;
        also_keep.append(&mut self.also_keep);
        self.also_keep = also_keep;

        let mut also_delete = config.strings.also_delete;
        also_delete.append(&mut self.also_delete);
        self.also_delete = also_delete;

        // A configured output directory only matters for simulations
        if self.out_path.is_none() && self.method.is_simulation() {
            self.out_path = config.output.out_path;
        }
        self
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The action ran to completion.
    Completed(CleanupReport),
    /// The user declined at a confirmation gate. Nothing was changed.
    Aborted,
}

/// Runs a cleanup with configuration looked up in the default locations.
///
/// # Arguments
///
/// * `request` - Root, method and lists gathered from the command line
/// * `confirm` - Answers the confirmation gates
///
/// # Examples
///
/// ```no_run
/// use fmriprep_cleanup::cli::{run_cli, CleanupRequest, RunOutcome};
/// use fmriprep_cleanup::{AssumeYes, Method};
///
/// let request = CleanupRequest::new("/data/derivatives/fmriprep", Method::SimLink)
///     .with_out_path("/scratch");
/// match run_cli(request, &mut AssumeYes) {
///     Ok(RunOutcome::Completed(report)) => println!("{} files retained", report.retained),
///     Ok(RunOutcome::Aborted) => println!("Nothing was changed"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli<C: Confirm + ?Sized>(
    request: CleanupRequest,
    confirm: &mut C,
) -> CleanupResult<RunOutcome> {
    run_cli_with_config(request, None, confirm)
}

/// Runs a cleanup, loading configuration from `config_path` when given.
///
/// # Arguments
///
/// * `request` - Root, method and lists gathered from the command line
/// * `config_path` - Optional path to a TOML configuration file
/// * `confirm` - Answers the confirmation gates
pub fn run_cli_with_config<C: Confirm + ?Sized>(
    request: CleanupRequest,
    config_path: Option<&Path>,
    confirm: &mut C,
) -> CleanupResult<RunOutcome> {
    let config = CleanupConfig::load(config_path)?;
    run_request(request.merge_config(config), confirm)
}

/// Runs an already complete request, without consulting any config file.
///
/// The steps are:
/// 1. Validates the root and output directory
/// 2. Resolves the keep and delete strings against the defaults
/// 3. Prints the plan and asks for confirmation
/// 4. Probes the root and asks again when it does not look like fMRIPrep output
/// 5. Deletes, or builds the simulation folder
/// 6. Writes the manifest, if requested, and prints the summary
///
/// A negative answer at either gate returns [`RunOutcome::Aborted`] before
/// anything on disk has changed.
pub fn run_request<C: Confirm + ?Sized>(
    request: CleanupRequest,
    confirm: &mut C,
) -> CleanupResult<RunOutcome> {
    let (root, out_dir) = validate_paths(&request)?;
    let sets = StringSets::resolve(&request.also_keep, &request.also_delete);

    print_plan(&request, &root, &sets);
    if !ask(confirm, "Please confirm the plan above.") {
        return Ok(RunOutcome::Aborted);
    }

    let classifier = Classifier::new(&sets);
    let executor = Executor::new(&root, classifier, request.method, &out_dir);

    let outcome = probe_with_skip(&root, executor.simulation_root());
    log::debug!("probe outcome: {:?}", outcome);
    match outcome {
        ProbeOutcome::LooksValid => OutputFormatter::plain(outcome.message()),
        _ => {
            OutputFormatter::warning(outcome.message());
            OutputFormatter::warning(&format!(
                "Please carefully check your provided fMRIPrep directory ({}) before proceeding.",
                OutputFormatter::emphasize_path(&root, true)
            ));
            if !ask(confirm, "The directory may not be fMRIPrep output.") {
                return Ok(RunOutcome::Aborted);
            }
        }
    }

    let report = executor.run()?;

    if let Some(manifest_path) = &request.manifest {
        Manifest::new(request.method, &root, executor.simulation_root(), &report)
            .save(manifest_path)?;
        OutputFormatter::info(&format!("Manifest written to {}", manifest_path.display()));
    }

    OutputFormatter::summary_table(&report.summary_rows(request.method));
    if request.method.is_simulation() {
        OutputFormatter::success("Simulation complete. No files in the fMRIPrep directory were modified.");
    } else {
        OutputFormatter::success("Cleanup complete.");
    }

    Ok(RunOutcome::Completed(report))
}

/// Checks the request before anything is touched.
///
/// Returns the canonical root and the directory the simulation folder goes in.
fn validate_paths(request: &CleanupRequest) -> CleanupResult<(PathBuf, PathBuf)> {
    if request.method == Method::Delete && request.out_path.is_some() {
        return Err(CleanupError::OutPathInDeleteMode);
    }

    if !request.root.exists() {
        return Err(CleanupError::RootNotFound(request.root.clone()));
    }
    if !request.root.is_dir() {
        return Err(CleanupError::RootNotADirectory(request.root.clone()));
    }
    let root = fs::canonicalize(&request.root).map_err(|e| CleanupError::io(&request.root, e))?;

    let out_dir = match &request.out_path {
        Some(out_path) => {
            if !out_path.is_dir() {
                return Err(CleanupError::OutputDirNotFound(out_path.clone()));
            }
            fs::canonicalize(out_path).map_err(|e| CleanupError::io(out_path, e))?
        }
        None => std::env::current_dir().map_err(|e| CleanupError::io(".", e))?,
    };

    Ok((root, out_dir))
}

/// Asks the confirmation gate and echoes the answer.
fn ask<C: Confirm + ?Sized>(confirm: &mut C, message: &str) -> bool {
    if confirm.confirm(message) {
        OutputFormatter::plain("Proceeding...");
        true
    } else {
        OutputFormatter::plain("Exiting...");
        false
    }
}

/// Prints what is about to happen, mode by mode.
fn print_plan(request: &CleanupRequest, root: &Path, sets: &StringSets) {
    OutputFormatter::header(
        "---------------------------------- Welcome to fMRIPrepCleanup! ----------------------------------",
    );

    let location = match &request.out_path {
        Some(out_path) => format!(
            "within your provided output directory {}",
            OutputFormatter::emphasize_path(out_path, false)
        ),
        None => "in your current working directory".to_string(),
    };
    let root_text = OutputFormatter::emphasize_path(root, true);

    match request.method {
        Method::SimLink => {
            OutputFormatter::info(&format!(
                "You have selected SIMULATION LINK mode. Symbolic links will be used to create a replica of how your fMRIPrep data would look after cleanup, {}.",
                location
            ));
            OutputFormatter::plain("This will include the creation of 'Deleted' and 'Retained' folders, so you can check that you'd keep what you'd expect to keep, and nothing important would be deleted.");
            OutputFormatter::plain(&format!(
                "No actual files will be lost or moved. This will simulate deleting all files within {} that do not contain one of the following strings:",
                root_text
            ));
        }
        Method::SimCopy => {
            OutputFormatter::info(&format!(
                "You have selected SIMULATION COPY mode. Files will be copied to create a replica of how your fMRIPrep data would look after cleanup, {}.",
                location
            ));
            OutputFormatter::plain("This will include the creation of 'Deleted' and 'Retained' folders, so you can check that you'd keep what you'd expect to keep, and nothing important would be deleted. Please delete the copied directory after you've checked this, to avoid using unnecessary storage.");
            OutputFormatter::plain(&format!(
                "Files in your original directory will not be impacted. This will simulate deleting all files within {} that do not contain one of the following strings:",
                root_text
            ));
        }
        Method::Delete => {
            OutputFormatter::warning(&format!(
                "WARNING, you have selected DELETION mode, and are about to delete all files within {} that do not contain one of the following strings:",
                root_text
            ));
        }
    }

    for target in sets.targets() {
        OutputFormatter::bullet(target);
    }
    OutputFormatter::plain("Files inside 'single_subject' working directories and 'fsaverage' subfolders are deleted regardless, unless they contain a keep string.");

    if request.method == Method::Delete {
        OutputFormatter::warning("Please carefully check that you have selected the correct path, and that all folders and files contained are output from fMRIPrep.");
    }

    if sets.has_keep_list() {
        OutputFormatter::success("You have additionally selected to KEEP (or simulate keeping) any files with the following strings in their names:");
        for keep in sets.keep() {
            OutputFormatter::bullet(keep);
        }
    }

    let user_exclusions: Vec<&str> = sets.user_exclusions().collect();
    if !user_exclusions.is_empty() {
        OutputFormatter::warning("You have additionally selected to DELETE (or simulate deleting) any files with the following strings in their names:");
        for exclusion in &user_exclusions {
            OutputFormatter::bullet(exclusion);
        }
        if request.method == Method::Delete {
            OutputFormatter::warning("Please check these strings VERY carefully before proceeding, to prevent accidental deletion of important files.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_request_builders_validate_lists() {
        let request = CleanupRequest::new("/data", Method::SimLink)
            .with_also_keep("aseg,aparc")
            .unwrap()
            .with_also_delete("T2w")
            .unwrap();
        assert_eq!(request.also_keep, vec!["aseg", "aparc"]);
        assert_eq!(request.also_delete, vec!["T2w"]);

        let err = CleanupRequest::new("/data", Method::SimLink)
            .with_also_keep("aseg, aparc")
            .unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_merge_config_order_and_out_path() {
        let mut config = CleanupConfig::default();
        config.strings.also_keep = vec!["from_config".to_string()];
        config.output.out_path = Some(PathBuf::from("/scratch"));

        let request = CleanupRequest::new("/data", Method::SimCopy)
            .with_also_keep("from_cli")
            .unwrap()
            .merge_config(config.clone());
        assert_eq!(request.also_keep, vec!["from_config", "from_cli"]);
        assert_eq!(request.out_path, Some(PathBuf::from("/scratch")));

        let request = CleanupRequest::new("/data", Method::SimCopy)
            .with_out_path("/elsewhere")
            .merge_config(config.clone());
        assert_eq!(request.out_path, Some(PathBuf::from("/elsewhere")));

        // Delete mode never picks up a configured output directory
        let request = CleanupRequest::new("/data", Method::Delete).merge_config(config);
        assert_eq!(request.out_path, None);
    }

    #[test]
    fn test_out_path_rejected_in_delete_mode() {
        let dir = TempDir::new().unwrap();
        let request = CleanupRequest::new(dir.path(), Method::Delete).with_out_path(dir.path());
        let result = validate_paths(&request);
        assert!(matches!(result, Err(CleanupError::OutPathInDeleteMode)));
    }

    #[test]
    fn test_missing_paths_rejected() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let request = CleanupRequest::new(&missing, Method::SimLink);
        assert!(matches!(
            validate_paths(&request),
            Err(CleanupError::RootNotFound(_))
        ));

        let request = CleanupRequest::new(dir.path(), Method::SimLink).with_out_path(&missing);
        assert!(matches!(
            validate_paths(&request),
            Err(CleanupError::OutputDirNotFound(_))
        ));
    }

    #[test]
    fn test_declining_plan_aborts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let request = CleanupRequest::new(dir.path(), Method::Delete);
        let outcome = run_request(request, &mut |_: &str| false).unwrap();

        assert!(matches!(outcome, RunOutcome::Aborted));
        assert!(dir.path().join("notes.txt").exists());
    }
}
