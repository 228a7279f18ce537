//! Yes/no confirmation gate.
//!
//! The cleanup run asks before it acts and again when the probe is unhappy.
//! Anything that maps a prompt message to a boolean can answer: the
//! terminal, `--yes`, or a closure in tests.

use dialoguer::Confirm as DialoguerConfirm;
use dialoguer::theme::ColorfulTheme;
use std::io::{self, BufRead, IsTerminal, Write};

/// Answers a yes/no question. `false` ends the run before any side effect.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Asks on the terminal. Only `y` or `n` close the prompt.
///
/// When stdin is not a terminal (`yes | fmriprep-cleanup ...`, batch jobs)
/// the answers are read line by line from stdin instead, through
/// [`LineConfirm`].
pub struct TerminalConfirm {
    theme: ColorfulTheme,
}

impl TerminalConfirm {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        if !io::stdin().is_terminal() {
            log::debug!("stdin is not a terminal, reading the answer as a line");
            return LineConfirm::new(io::stdin().lock(), io::stderr()).confirm(message);
        }

        let answer = DialoguerConfirm::with_theme(&self.theme)
            .with_prompt(format!("{} Do you want to continue?", message))
            .show_default(false)
            .wait_for_newline(true)
            .interact();

        match answer {
            Ok(answer) => answer,
            Err(e) => {
                // No terminal to ask on counts as a no
                log::warn!("confirmation prompt failed: {}", e);
                false
            }
        }
    }
}

/// Reads `y`/`yes`/`n`/`no` answers (any case) line by line.
///
/// Any other line repeats the question. End of input counts as a no, so a
/// closed pipe can never start a deletion.
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        loop {
            // Write failures never decide the answer
            let _ = write!(self.output, "{} Do you want to continue? [y/n] ", message);
            let _ = self.output.flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => return false,
                Ok(_) => match line.trim().to_lowercase().as_str() {
                    "y" | "yes" => return true,
                    "n" | "no" => return false,
                    other => log::debug!("unrecognised answer '{}', asking again", other),
                },
                Err(e) => {
                    log::warn!("failed to read confirmation: {}", e);
                    return false;
                }
            }
        }
    }
}

/// Answers yes to everything, for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, message: &str) -> bool {
        log::info!("auto-confirmed: {}", message);
        true
    }
}
