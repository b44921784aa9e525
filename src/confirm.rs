use std::io::{self, BufRead, Write};

/// Answers accepted as "go ahead", compared after trimming and lowercasing.
pub const AFFIRMATIVE: &[&str] = &["s", "si", "sí", "y", "yes"];

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE.contains(&answer.as_str())
}

/// Asks the operator whether the run should proceed.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Reads a single line from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> bool {
        print!("\n{} (s/n): ", question);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => is_affirmative(&line),
            Err(e) => {
                log::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

/// Fixed answer, for `--yes` and tests.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}
