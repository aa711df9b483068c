//! External editor round-trip used by `edit`.

use std::{env, fs, io::Write, process::Command};

use tempfile::Builder;

use crate::error::ShellError;

const FALLBACK_EDITOR: &str = "vi";

/// Lets the user rewrite a node payload.
pub trait NodeEditor {
    /// Returns the edited bytes for the node at `path`, starting from `current`.
    fn edit(&mut self, path: &str, current: &[u8]) -> Result<Vec<u8>, ShellError>;
}

/// Opens the payload in a temporary file with a terminal editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    program: String,
}

impl ExternalEditor {
    /// Uses `program`, which may carry arguments, e.g. `code --wait`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Picks `$VISUAL`, then `$EDITOR`, then `vi`.
    #[must_use]
    pub fn from_env() -> Self {
        let program = ["VISUAL", "EDITOR"]
            .into_iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_EDITOR.to_owned());
        Self::new(program)
    }

    /// Editor command line.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl NodeEditor for ExternalEditor {
    fn edit(&mut self, path: &str, current: &[u8]) -> Result<Vec<u8>, ShellError> {
        let editor_error = |err: std::io::Error| ShellError::Editor(err.to_string());
        let mut words = self.program.split_whitespace();
        let binary = words
            .next()
            .ok_or_else(|| ShellError::Editor("no editor configured".to_owned()))?;

        let suffix = path.rsplit('/').next().unwrap_or_default();
        let mut file = Builder::new()
            .prefix("treesh-")
            .suffix(&format!("-{suffix}"))
            .tempfile()
            .map_err(editor_error)?;
        file.write_all(current).map_err(editor_error)?;
        file.flush().map_err(editor_error)?;

        let status = Command::new(binary)
            .args(words)
            .arg(file.path())
            .status()
            .map_err(|err| ShellError::Editor(format!("cannot start `{binary}`: {err}")))?;
        if !status.success() {
            return Err(ShellError::Editor(format!("`{binary}` exited with {status}")));
        }
        fs::read(file.path()).map_err(editor_error)
    }
}
