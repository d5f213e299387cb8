//! Terminal Output
//!
//! Status line formatting for the command line tool

use colored::Colorize;

/// Kind of status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Success,
    Warning,
    Error,
    Info,
}

impl Style {
    fn tag(self) -> colored::ColoredString {
        match self {
            Style::Success => "Success".green().bold(),
            Style::Warning => "Warning".yellow().bold(),
            Style::Error => "Error".red().bold(),
            Style::Info => "Info".cyan().bold(),
        }
    }
}

/// Render `[ Tag ] message`
pub fn status_line(style: Style, message: &str) -> String {
    format!("[ {} ] {}", style.tag(), message)
}

/// `""` for exactly one, `"s"` otherwise
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_contains_tag_and_message() {
        let line = status_line(Style::Warning, "careful");
        assert!(line.starts_with("[ "));
        assert!(line.contains("Warning"));
        assert!(line.ends_with("] careful"));

        assert!(status_line(Style::Success, "ok").contains("Success"));
        assert!(status_line(Style::Error, "bad").contains("Error"));
        assert!(status_line(Style::Info, "fyi").contains("Info"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(0), "s");
        assert_eq!(plural(1), "");
        assert_eq!(plural(2), "s");
    }
}
