//! fmriprep-cleanup - remove intermediate fMRIPrep outputs by filename
//!
//! This library walks an fMRIPrep output directory and decides, per file,
//! whether to keep or remove it based on substrings of the file name. The
//! decision can be carried out for real, or simulated by mirroring the tree
//! into `Retained` and `Deleted` folders made of symbolic links or copies.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod output;
pub mod probe;
pub mod prompt;
pub mod string_sets;
pub mod walker;

pub use classifier::{Classification, Classifier};
pub use config::{CleanupConfig, parse_string_list};
pub use error::{CleanupError, CleanupResult};
pub use executor::{CleanupReport, Executor, Method, Placement};
pub use probe::{ProbeOutcome, probe};
pub use prompt::{AssumeYes, Confirm, LineConfirm, TerminalConfirm};
pub use string_sets::StringSets;
pub use walker::{DirLevel, TreeWalker};

pub use cli::{CleanupRequest, RunOutcome, run_cli, run_cli_with_config};
