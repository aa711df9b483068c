#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Command-language front-end for a hierarchical key-value tree service.

/// Backend capability trait and node metadata.
pub mod client;
/// Yes/no prompts for destructive commands.
pub mod confirm;
/// External editor round-trip.
pub mod editor;
/// Shell error types.
pub mod error;
/// Output rendering.
pub mod format;
/// Argument grammars and validation.
pub mod grammar;
/// Command handlers.
pub mod handlers;
/// Command documentation.
pub mod help;
/// Keywords and token patterns.
pub mod lexicon;
/// In-memory tree backend.
pub mod memory;
/// Static command table.
pub mod registry;
/// Line dispatcher.
pub mod runner;
/// Per-run shell state.
pub mod session;
/// Input tokenization.
pub mod tokenizer;

/// Telemetry helpers for the shell loop.
#[path = "../telemetry.rs"]
pub mod telemetry;

pub use client::{ClientError, NodeStat, TreeClient};
pub use confirm::{
    is_interruption, AssumeDefault, Confirm, ConfirmationPrompt, LineInput, TerminalConfirm,
};
pub use editor::{ExternalEditor, NodeEditor};
pub use error::ShellError;
pub use grammar::{validate_command_input, CommandValidator, ParsedCommand};
pub use help::{command_help, command_usage, general_help};
pub use lexicon::{Keyword, TokenKind};
pub use memory::MemoryTree;
pub use registry::{registry, CommandRegistry, CommandSpec};
pub use runner::{CommandRunner, Outcome, Reply};
pub use session::Session;
pub use telemetry::{ShellTelemetry, ShellTelemetryBuilder};
