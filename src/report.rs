use std::io::{self, Write};

/// Operator-facing output. Progress lines are suppressed in quiet mode;
/// warnings always print.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

/// Blocking `>> ` prompt, printed regardless of quiet mode since an answer
/// is required to continue.
pub fn prompt() {
    print!(">> ");
    let _ = io::stdout().flush();
}

/// Warnings bypass quiet mode.
pub fn warn(message: &str) {
    println!("WARNING: {message}");
}
