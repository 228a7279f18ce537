//! Output formatting and styling module.
//!
//! Every message the user sees goes through [`OutputFormatter`]: the plan
//! screen, warnings, and the per-action transcript that records each file
//! and directory touched during a run.

use colored::*;
use std::path::Path;

/// A physical action recorded in the run transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateLink,
    CopyFile,
    DeleteFile,
    DeleteDirectory,
    DeleteEmptyDirectory,
    CreateSimulationFolder,
    ReplaceSimulationFolder,
}

impl Action {
    /// Transcript label for this action.
    pub fn label(&self) -> &'static str {
        match self {
            Action::CreateLink => "Created symbolic link:",
            Action::CopyFile => "Copied file:",
            Action::DeleteFile => "Deleting file:",
            Action::DeleteDirectory => "Deleted directory:",
            Action::DeleteEmptyDirectory => "Deleted empty directory:",
            Action::CreateSimulationFolder => "Simulation folder created:",
            Action::ReplaceSimulationFolder => "Emptying and replacing simulation folder...:",
        }
    }

    fn is_destructive(&self) -> bool {
        matches!(
            self,
            Action::DeleteFile
                | Action::DeleteDirectory
                | Action::DeleteEmptyDirectory
                | Action::ReplaceSimulationFolder
        )
    }
}

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a bulleted list item, quoted.
    pub fn bullet(item: &str) {
        println!("- '{}'", item);
    }

    /// Prints one transcript line naming the action and the path.
    pub fn action(action: Action, path: &Path) {
        let label = if action.is_destructive() {
            action.label().red()
        } else {
            action.label().green()
        };
        println!("{} {}", label, path.display());
    }

    /// Highlights a path inside a longer message.
    pub fn emphasize_path(path: &Path, danger: bool) -> String {
        let quoted = format!("'{}'", path.display());
        if danger {
            quoted.red().bold().to_string()
        } else {
            quoted.green().bold().to_string()
        }
    }

    /// Prints a two-column summary table.
    ///
    /// Rows are printed in the order given, followed by nothing else, so
    /// callers choose both order and labels.
    pub fn summary_table(rows: &[(&str, usize)]) {
        Self::header("SUMMARY");

        let max_label_len = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Action" width

        println!(
            "{:<width$} | {}",
            "Action".bold(),
            "Count".bold(),
            width = max_label_len
        );
        println!("{}", "-".repeat(max_label_len + 10));

        for (label, count) in rows {
            println!(
                "{:<width$} | {}",
                label,
                count.to_string().green(),
                width = max_label_len
            );
        }

        println!("{}", "-".repeat(max_label_len + 10));
    }
}
