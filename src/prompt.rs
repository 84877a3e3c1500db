//! Interactive confirmation.
use std::io::{self, BufRead as _, Write as _};

/// Source of answers to yes/no questions.
#[cfg_attr(test, mockall::automock)]
pub trait Prompt: std::fmt::Debug {
    /// Show `question` and return the line the user typed.
    ///
    /// # Errors
    ///
    /// Returns an error if standard input cannot be read.
    fn ask(&self, question: &str) -> io::Result<String>;
}

/// [`Prompt`] that reads from the process's standard input.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    #[allow(clippy::print_stdout)]
    fn ask(&self, question: &str) -> io::Result<String> {
        print!("{question} [y/N] ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Whether a typed answer counts as consent: exactly `y` or `Y`.
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim_end_matches(['\r', '\n']), "y" | "Y")
}
