//! Tool output classification.
//!
//! Text matching is only used to pick which lines to show the operator.
//! Pipeline control flow looks at exit status and artifact checks.

use regex::Regex;
use std::sync::LazyLock;

static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error").expect("error pattern is a valid regex"));

static WARNING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)warn").expect("warning pattern is a valid regex"));

/// How a tool's output is treated while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Drop everything.
    Discard,
    /// Print lines that look like errors, drop the rest.
    Filter {
        /// Also drop error-looking lines that mention a warning
        exclude_warnings: bool,
    },
    /// Keep every line for the caller.
    Capture,
}

impl OutputMode {
    /// Whether `line` should be shown to the operator in this mode.
    pub fn highlights(self, line: &str) -> bool {
        match self {
            OutputMode::Filter { exclude_warnings } => is_error_line(line, exclude_warnings),
            OutputMode::Discard | OutputMode::Capture => false,
        }
    }

    /// Whether lines are returned to the caller.
    pub fn keeps_lines(self) -> bool {
        matches!(self, OutputMode::Capture)
    }
}

/// Case-insensitive "error" match, optionally ignoring warning lines.
pub fn is_error_line(line: &str, exclude_warnings: bool) -> bool {
    ERROR_LINE.is_match(line) && !(exclude_warnings && WARNING_LINE.is_match(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_match_is_case_insensitive_substring() {
        assert!(is_error_line("src/index.ts(3,1): error TS2304", false));
        assert!(is_error_line("ERROR in ./main.ts", false));
        assert!(is_error_line("TypeError: x is undefined", false));
        assert!(!is_error_line("compiled successfully", false));
    }

    #[test]
    fn warning_exclusion_drops_warning_lines_only() {
        let warning = "WARNING in asset size limit: errors may occur";
        assert!(is_error_line(warning, false));
        assert!(!is_error_line(warning, true));
        assert!(is_error_line("Module build failed: Error", true));
    }

    #[test]
    fn only_filter_mode_highlights() {
        let line = "error: boom";
        assert!(OutputMode::Filter { exclude_warnings: true }.highlights(line));
        assert!(!OutputMode::Discard.highlights(line));
        assert!(!OutputMode::Capture.highlights(line));
        assert!(OutputMode::Capture.keeps_lines());
        assert!(!OutputMode::Filter { exclude_warnings: false }.keeps_lines());
    }
}
