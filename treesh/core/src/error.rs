use thiserror::Error;

use crate::{client::ClientError, lexicon::Keyword};

/// Errors returned by the shell core.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The line does not start with a known command.
    #[error("Command '{input}' not found")]
    UnknownCommand {
        /// The raw line as typed.
        input: String,
    },
    /// Known command, malformed arguments. Callers usually print the command usage after it.
    #[error("{message}")]
    CommandValidation {
        /// Command whose grammar was violated.
        keyword: Keyword,
        /// Human-readable reason.
        message: String,
    },
    /// A mutating command was attempted in read-only mode.
    #[error("Cannot run `{keyword}` in read-only mode. Run `toggle_write` to enable writes.")]
    UnauthorizedWrite {
        /// Command that was refused.
        keyword: Keyword,
    },
    /// The node does not exist.
    #[error("{path} does not exist")]
    NodeNotFound {
        /// Requested path.
        path: String,
    },
    /// The node still has children.
    #[error("{path} is not empty. Use `rmr` to delete it along with its children.")]
    NodeNotEmpty {
        /// Requested path.
        path: String,
    },
    /// Any other backend failure.
    #[error(transparent)]
    Client(ClientError),
    /// The external editor round-trip failed.
    #[error("editor failure: {0}")]
    Editor(String),
}

impl ShellError {
    /// Whether the shell loop should report the error and keep reading commands.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Client(ClientError::Connection(_)) | Self::Editor(_))
    }

    /// Short stable name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCommand { .. } => "unknown_command",
            Self::CommandValidation { .. } => "invalid_arguments",
            Self::UnauthorizedWrite { .. } => "unauthorized_write",
            Self::NodeNotFound { .. } => "node_not_found",
            Self::NodeNotEmpty { .. } => "node_not_empty",
            Self::Client(_) => "client",
            Self::Editor(_) => "editor",
        }
    }
}

impl From<ClientError> for ShellError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NoNode(path) => Self::NodeNotFound { path },
            ClientError::NotEmpty(path) => Self::NodeNotEmpty { path },
            other => Self::Client(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_are_rewritten_with_the_path() {
        let err = ShellError::from(ClientError::NotEmpty("/a".into()));
        assert_eq!(
            err.to_string(),
            "/a is not empty. Use `rmr` to delete it along with its children."
        );
        let err = ShellError::from(ClientError::NoNode("/b".into()));
        assert_eq!(err.to_string(), "/b does not exist");
        assert!(err.is_recoverable());
    }

    #[test]
    fn connection_failures_are_not_recoverable() {
        let err = ShellError::from(ClientError::Connection("session expired".into()));
        assert!(!err.is_recoverable());
        assert_eq!(err.kind(), "client");
    }
}
