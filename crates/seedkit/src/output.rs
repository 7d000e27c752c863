//! Human-readable progress output.
//!
//! The runner and the list command never print directly; they hand each
//! message and its [`Level`] to an [`OutputSink`], which decides where it
//! goes and how it looks.

use std::io::Write;

use console::Style;

/// Message severity, used by sinks for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Unstyled detail line.
    Plain,
    /// Section header.
    Info,
    Success,
    Warning,
    Error,
}

/// Destination for progress messages.
pub trait OutputSink {
    /// Writes a complete line.
    fn write(&mut self, level: Level, message: &str);

    /// Writes a message without ending the line.
    fn write_inline(&mut self, level: Level, message: &str) {
        self.write(level, message);
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write(&mut self, level: Level, message: &str) {
        (**self).write(level, message);
    }

    fn write_inline(&mut self, level: Level, message: &str) {
        (**self).write_inline(level, message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutput;

impl OutputSink for NullOutput {
    fn write(&mut self, _level: Level, _message: &str) {}
}

/// Writes styled output to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleOutput {
    info: Style,
    success: Style,
    warning: Style,
    error: Style,
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self {
            info: Style::new().cyan().bold(),
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red(),
        }
    }

    fn styled(&self, level: Level, message: &str) -> String {
        match level {
            Level::Plain => message.to_string(),
            Level::Info => self.info.apply_to(message).to_string(),
            Level::Success => self.success.apply_to(message).to_string(),
            Level::Warning => self.warning.apply_to(message).to_string(),
            Level::Error => self.error.apply_to(message).to_string(),
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for ConsoleOutput {
    fn write(&mut self, level: Level, message: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.styled(level, message));
    }

    fn write_inline(&mut self, level: Level, message: &str) {
        let mut stdout = std::io::stdout().lock();
        // Progress output is best effort
        let _ = write!(stdout, "{}", self.styled(level, message));
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_output_survives_repeated_writes() {
        let mut output = ConsoleOutput::new();
        output.write_inline(Level::Plain, "  Importing setup_a.sql...");
        output.write(Level::Success, " OK");
        output.write(Level::Info, "Seeding complete!");
    }

    #[test]
    fn test_null_output_discards() {
        let mut output = NullOutput;
        output.write(Level::Error, "ignored");
        output.write_inline(Level::Plain, "ignored");
    }

    #[test]
    fn test_plain_is_unstyled() {
        let output = ConsoleOutput::new();
        assert_eq!(output.styled(Level::Plain, "    - setup_a.sql"), "    - setup_a.sql");
    }

    #[test]
    fn test_styled_keeps_message_text() {
        let output = ConsoleOutput::new();
        for level in [Level::Info, Level::Success, Level::Warning, Level::Error] {
            assert!(output.styled(level, "Seeding complete!").contains("Seeding complete!"));
        }
    }
}
