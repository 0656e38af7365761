//! Interactive input seam.
//!
//! Every question the option lifecycle asks goes through [`Prompter`], so
//! validation and re-prompt loops can be driven from scripted answers in
//! tests and from the controlling terminal in production.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Error type for interactive input.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Input reached end-of-file while an answer was required.
    #[error("Input closed while waiting for an answer")]
    Closed,

    /// Reading from or writing to the terminal failed.
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Source of user answers and sink for user-facing diagnostics.
pub trait Prompter {
    /// Shows `prompt` and reads one line, without the trailing newline.
    ///
    /// # Errors
    ///
    /// [`PromptError::Closed`] at end of input; [`PromptError::Io`] otherwise.
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Shows a diagnostic to the user.
    fn notify(&mut self, message: &str);

    /// Asks a yes/no question, returning `default` on an empty answer.
    ///
    /// Accepts `yes`, `ye`, `y`, `no` and `n` in any case; anything else
    /// is refused and the question asked again.
    ///
    /// # Errors
    ///
    /// Propagates [`Prompter::read_line`] failures.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, PromptError> {
        let suffix = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.read_line(&format!("{question} {suffix} "))?;
            match parse_yes_no(&answer) {
                Some(choice) => return Ok(choice),
                None if answer.trim().is_empty() => return Ok(default),
                None => self.notify("Please respond with 'yes' or 'no' (or 'y' or 'n')."),
            }
        }
    }
}

/// Interprets a yes/no answer; `None` for empty or unrecognized input.
#[must_use]
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "yes" | "ye" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

/// Prompter over the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdioPrompter;

impl Prompter for StdioPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}
