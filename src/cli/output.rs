//! Colored operator output.
//!
//! Progress, detail and summary lines go to stdout; warnings and errors go
//! to stderr. Colors are disabled when the stream is not a terminal or
//! `NO_COLOR` is set.

use std::io::{IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Terminal output manager honoring verbose and quiet modes.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout_color: ColorChoice,
    stderr_color: ColorChoice,
}

#[derive(Clone, Copy)]
enum Target {
    Stdout,
    Stderr,
}

impl OutputManager {
    /// Create a new output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            stdout_color: color_choice(std::io::stdout().is_terminal()),
            stderr_color: color_choice(std::io::stderr().is_terminal()),
        }
    }

    fn write(&self, target: Target, color: Option<Color>, bold: bool, message: &str) {
        let mut stream = match target {
            Target::Stdout => StandardStream::stdout(self.stdout_color),
            Target::Stderr => StandardStream::stderr(self.stderr_color),
        };
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);

        // Output is best-effort; a closed pipe must not abort the build.
        let _ = stream.set_color(&spec);
        let _ = writeln!(stream, "{}", message);
        let _ = stream.reset();
    }

    /// Plain informational line.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.write(Target::Stdout, None, false, message);
        }
    }

    /// Bold section header.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            self.write(Target::Stdout, Some(Color::Cyan), true, title);
        }
    }

    /// Numbered pipeline step marker, e.g. `[2/5] Building package`.
    pub fn step(&self, index: usize, total: usize, message: &str) {
        if !self.quiet {
            self.write(
                Target::Stdout,
                Some(Color::Cyan),
                true,
                &format!("[{}/{}] {}", index, total, message),
            );
        }
    }

    /// Progress message for an action about to run.
    pub fn progress(&self, message: &str) {
        if !self.quiet {
            self.write(Target::Stdout, Some(Color::Blue), false, &format!("  → {}", message));
        }
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) {
        if !self.quiet {
            self.write(Target::Stdout, None, false, &format!("    {}", message));
        }
    }

    /// Tool output line flagged as an error. Shown even in quiet mode.
    pub fn highlight(&self, message: &str) {
        self.write(Target::Stdout, Some(Color::Red), false, &format!("    {}", message));
    }

    /// Success message.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.write(Target::Stdout, Some(Color::Green), false, &format!("  ✓ {}", message));
        }
    }

    /// Warning message.
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            self.write(Target::Stderr, Some(Color::Yellow), false, &format!("  ⚠ {}", message));
        }
    }

    /// Error message. Always shown.
    pub fn error(&self, message: &str) {
        self.write(Target::Stderr, Some(Color::Red), true, &format!("✗ {}", message));
    }

    /// Final result line. Always shown.
    pub fn result(&self, message: &str) {
        self.write(Target::Stdout, None, false, message);
    }

    /// Detail only shown in verbose mode.
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            self.write(Target::Stdout, Some(Color::White), false, &format!("    {}", message));
        }
    }
}

fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal && std::env::var_os("NO_COLOR").is_none() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
