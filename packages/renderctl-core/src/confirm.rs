//! Yes/no confirmation as an injected capability.
//!
//! Resolution and cache deletion ask before acting on cached or probed
//! endpoints. The front-end decides how: a stdin prompt, or a preset
//! answer for non-interactive runs and tests.

use std::io::{BufRead, Write};

use parking_lot::Mutex;

/// Asks the user a yes/no question.
pub trait Confirm: Send + Sync {
    /// Returns true if the user accepted.
    fn confirm(&self, question: &str) -> bool;
}

/// Prompts on stdout and reads one line from stdin.
///
/// Only one prompt is outstanding at a time.
#[derive(Debug, Default)]
pub struct StdinConfirm {
    lock: Mutex<()>,
}

impl StdinConfirm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Accepts `y` / `yes` in any case; everything else declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> bool {
        let _guard = self.lock.lock();

        let mut stdout = std::io::stdout().lock();
        if write!(stdout, "{} (y/n): ", question)
            .and_then(|_| stdout.flush())
            .is_err()
        {
            return false;
        }
        drop(stdout);

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&answer),
        }
    }
}

/// Always gives the same answer and records the questions asked.
#[derive(Debug)]
pub struct PresetConfirm {
    answer: bool,
    asked: Mutex<Vec<String>>,
}

impl PresetConfirm {
    #[must_use]
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

impl Confirm for PresetConfirm {
    fn confirm(&self, question: &str) -> bool {
        log::info!("[Confirm] {} -> {}", question, if self.answer { "yes" } else { "no" });
        self.asked.lock().push(question.to_string());
        self.answer
    }
}
