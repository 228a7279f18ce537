use clap::Parser;
use fmriprep_cleanup::cli::{CleanupRequest, RunOutcome, run_cli_with_config};
use fmriprep_cleanup::executor::Method;
use fmriprep_cleanup::output::OutputFormatter;
use fmriprep_cleanup::prompt::{AssumeYes, TerminalConfirm};
use fmriprep_cleanup::{CleanupResult, Confirm};
use std::path::PathBuf;
use std::process::ExitCode;

/// Delete (or simulate deleting) intermediate files from fMRIPrep output.
#[derive(Parser, Debug)]
#[command(name = "fmriprep-cleanup", version)]
struct Args {
    /// The fMRIPrep output directory
    #[arg(long)]
    dir: PathBuf,

    /// sim_link, sim_copy, or delete
    #[arg(long, value_enum, ignore_case = true)]
    method: Method,

    /// Extra strings to keep, comma separated without spaces
    #[arg(long = "also-keep", alias = "also_keep", value_name = "STRINGS")]
    also_keep: Option<String>,

    /// Extra strings to delete, comma separated without spaces
    #[arg(long = "also-delete", alias = "also_delete", value_name = "STRINGS")]
    also_delete: Option<String>,

    /// Existing directory for the simulation folder (simulation modes only)
    #[arg(long = "out-path", alias = "out_path")]
    out_path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON manifest of the run to this file
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_request(args: &Args) -> CleanupResult<CleanupRequest> {
    let mut request = CleanupRequest::new(&args.dir, args.method);
    if let Some(value) = &args.also_keep {
        request = request.with_also_keep(value)?;
    }
    if let Some(value) = &args.also_delete {
        request = request.with_also_delete(value)?;
    }
    if let Some(out_path) = &args.out_path {
        request = request.with_out_path(out_path);
    }
    if let Some(manifest) = &args.manifest {
        request = request.with_manifest(manifest);
    }
    Ok(request)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm::new())
    };

    let result = build_request(&args).and_then(|request| {
        run_cli_with_config(request, args.config.as_deref(), confirm.as_mut())
    });

    match result {
        Ok(RunOutcome::Completed(_)) | Ok(RunOutcome::Aborted) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            if e.is_usage() {
                OutputFormatter::plain(
                    "Usage: fmriprep-cleanup --dir <fMRIPrep directory> --method <sim_link|sim_copy|delete> [--also-keep a,b] [--also-delete c,d] [--out-path <dir>]",
                );
            }
            ExitCode::FAILURE
        }
    }
}
