//! Static command table: what each keyword accepts, whether it writes, whether it confirms.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::{
    confirm::ConfirmationPrompt,
    grammar::{self, ParsedCommand, Slot},
    handlers::{self, Handler},
    help::{self, CommandDoc},
    lexicon::Keyword,
};

/// Builds the confirmation question for a command about to run.
pub type ConfirmationBuilder = fn(&ParsedCommand) -> ConfirmationPrompt;

/// Everything the runner needs to know about one command.
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Command keyword.
    pub keyword: Keyword,
    /// Argument slots.
    pub grammar: &'static [Slot],
    /// Whether the command changes the tree; refused in read-only mode.
    pub mutating: bool,
    /// Question to ask before running, for destructive commands.
    pub confirmation: Option<ConfirmationBuilder>,
    /// Summary and usage.
    pub doc: &'static CommandDoc,
    /// Implementation.
    pub handler: Handler,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("keyword", &self.keyword)
            .field("grammar", &self.grammar)
            .field("mutating", &self.mutating)
            .field("destructive", &self.is_destructive())
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    /// Whether the command asks before running.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        self.confirmation.is_some()
    }
}

fn target(command: &ParsedCommand) -> &str {
    command.arg(0).unwrap_or_default()
}

fn confirm_delete(command: &ParsedCommand) -> ConfirmationPrompt {
    ConfirmationPrompt::new(
        format!("Are you sure you want to delete {}?", target(command)),
        false,
    )
}

fn confirm_rmr(command: &ParsedCommand) -> ConfirmationPrompt {
    ConfirmationPrompt::new(
        format!(
            "Are you sure you want to delete {} and all its children?",
            target(command)
        ),
        false,
    )
}

fn spec_for(keyword: Keyword) -> CommandSpec {
    let (mutating, confirmation, handler): (bool, Option<ConfirmationBuilder>, Handler) =
        match keyword {
            Keyword::Close | Keyword::Exit | Keyword::Quit => (false, None, handlers::terminate),
            Keyword::Create => (true, None, handlers::create),
            Keyword::Delete => (true, Some(confirm_delete), handlers::delete),
            Keyword::Edit => (true, None, handlers::edit),
            Keyword::Get => (false, None, handlers::get),
            Keyword::Help => (false, None, handlers::help),
            Keyword::Ls => (false, None, handlers::ls),
            Keyword::Raw => (false, None, handlers::raw),
            Keyword::Rmr => (true, Some(confirm_rmr), handlers::rmr),
            Keyword::Set => (true, None, handlers::set),
            Keyword::Stat => (false, None, handlers::stat),
            Keyword::ToggleWrite => (false, None, handlers::toggle_write),
        };
    CommandSpec {
        keyword,
        grammar: grammar::grammar(keyword),
        mutating,
        confirmation,
        doc: help::doc(keyword),
        handler,
    }
}

/// Keyword-ordered table of every command.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: IndexMap<Keyword, CommandSpec>,
}

impl CommandRegistry {
    fn build() -> Self {
        Self {
            commands: Keyword::ALL
                .into_iter()
                .map(|keyword| (keyword, spec_for(keyword)))
                .collect(),
        }
    }

    /// Entry for `keyword`.
    #[must_use]
    pub fn get(&self, keyword: Keyword) -> Option<&CommandSpec> {
        self.commands.get(&keyword)
    }

    /// Entries in keyword order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }

    /// Number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Always false once built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

static REGISTRY: Lazy<CommandRegistry> = Lazy::new(CommandRegistry::build);

/// The process-wide command table.
#[must_use]
pub fn registry() -> &'static CommandRegistry {
    &REGISTRY
}
