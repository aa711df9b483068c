use serde::{Deserialize, Serialize};

/// Terminal width assumed until the front-end reports one.
pub const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Per-run shell state threaded through the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    read_only: bool,
    command_index: u64,
    terminal_width: usize,
}

impl Session {
    /// Starts a session; `read_only` blocks mutating commands until toggled.
    #[must_use]
    pub const fn new(read_only: bool) -> Self {
        Self {
            read_only,
            command_index: 0,
            terminal_width: DEFAULT_TERMINAL_WIDTH,
        }
    }

    /// Whether mutating commands are refused.
    #[must_use]
    pub const fn read_only(&self) -> bool {
        self.read_only
    }

    /// Flips the write capability and returns the new read-only state.
    pub fn toggle_write(&mut self) -> bool {
        self.read_only = !self.read_only;
        self.read_only
    }

    /// Index of the next command.
    #[must_use]
    pub const fn command_index(&self) -> u64 {
        self.command_index
    }

    /// Moves on to the next command.
    pub fn advance(&mut self) {
        self.command_index += 1;
    }

    /// Width available for column layouts.
    #[must_use]
    pub const fn terminal_width(&self) -> usize {
        self.terminal_width
    }

    /// Records the current terminal width. Zero is ignored.
    pub fn set_terminal_width(&mut self, width: usize) {
        if width > 0 {
            self.terminal_width = width;
        }
    }

    /// Prompt shown before reading the next line, e.g. `(RO 0) > `.
    #[must_use]
    pub fn prompt(&self) -> String {
        let mode = if self.read_only { "RO" } else { "RW" };
        format!("({mode} {}) > ", self.command_index)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_shows_mode_and_index() {
        assert_eq!(Session::new(true).prompt(), "(RO 0) > ");
        let mut session = Session::new(false);
        session.advance();
        session.advance();
        assert_eq!(session.prompt(), "(RW 2) > ");
    }

    #[test]
    fn toggle_write_flips_once_per_call() {
        let mut session = Session::default();
        assert!(session.read_only());
        assert!(!session.toggle_write());
        assert!(session.toggle_write());
        assert_eq!(session.command_index(), 0);
    }

    #[test]
    fn ignores_zero_width() {
        let mut session = Session::default();
        session.set_terminal_width(0);
        assert_eq!(session.terminal_width(), DEFAULT_TERMINAL_WIDTH);
        session.set_terminal_width(120);
        assert_eq!(session.terminal_width(), 120);
    }
}
