//! Styled terminal output.
//!
//! Commands print through [`Output`] so that `--json` switches every command
//! to machine-readable output in one place. Human-oriented lines go to
//! stdout; errors always go to stderr.

use console::{Term, style};
use serde::Serialize;
use std::fmt::Display;
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub struct Output {
    term: Term,
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self {
            term: Term::stdout(),
            json,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    // Broken pipes are ignored.
    fn line(&self, text: &str) {
        drop(self.term.write_line(text));
    }

    /// Confirmation after a write. Silent in JSON mode.
    pub fn success(&self, message: impl Display) {
        if !self.json {
            self.line(&format!("{} {message}", style("✓").green().bold()));
        }
    }

    pub fn error(&self, message: impl Display) {
        let line = format!("{} {message}", style("✗").red().bold());
        drop(Term::stderr().write_line(&line));
    }

    pub fn print(&self, message: impl Display) {
        self.line(&message.to_string());
    }

    pub fn newline(&self) {
        self.line("");
    }

    pub fn header(&self, message: impl Display) {
        self.line(&style(message).bold().cyan().to_string());
    }

    pub fn subheader(&self, message: impl Display) {
        self.line(&style(message).bold().to_string());
    }

    pub fn divider(&self, width: usize) {
        self.line(&style("─".repeat(width)).dim().to_string());
    }

    /// `  label: value`, with the label dimmed.
    pub fn labeled(&self, label: impl Display, value: impl Display) {
        self.line(&format!("  {}: {value}", style(label).dim()));
    }

    pub fn dim(&self, message: impl Display) {
        self.line(&style(message).dim().to_string());
    }

    pub fn count(&self, label: impl Display, count: usize) {
        self.line(&format!("{}: {}", style(label).dim(), style(count).cyan().bold()));
    }

    pub fn table<R: Tabled>(&self, rows: impl IntoIterator<Item = R>) {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        self.print(table);
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        self.line(&serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `...`.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_owned();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a rather long title", 10), "a rathe...");
        assert_eq!(truncate_str("héllo wörld", 8), "héllo...");
    }
}
