use std::io::{self, BufRead, Write};

use crate::engine::Prompter;

/// Asks on stderr, reads answers from stdin. End of input cancels.
pub struct StdinPrompter {
    /// `--yes`: every confirmation is accepted without asking
    pub assume_yes: bool,
}

impl StdinPrompter {
    pub fn new(assume_yes: bool) -> Self {
        StdinPrompter { assume_yes }
    }

    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        }
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", message);
        let _ = io::stderr().flush();
        self.read_line()
            .is_some_and(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        match default {
            Some(d) => eprint!("{} [{}]: ", message, d),
            None => eprint!("{}: ", message),
        }
        let _ = io::stderr().flush();
        let answer = self.read_line()?;
        match default {
            Some(d) if answer.is_empty() => Some(d.to_string()),
            _ => Some(answer),
        }
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}
