//! Per-command argument grammars and the validator enforcing them.
//!
//! A grammar is a list of typed slots. Validation scans the whole line strictly (see
//! [`tokenizer::scan`]) and requires every chunk after the keyword to land in a slot, so
//! extra tokens, tokens of the wrong kind and missing required arguments are all rejected.

use crate::{
    error::ShellError,
    lexicon::{Keyword, TokenKind},
    tokenizer::{self, Token},
};

/// One positional argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Token kind accepted in this position.
    pub kind: TokenKind,
    /// Whether the argument may be omitted.
    pub optional: bool,
}

impl Slot {
    /// A mandatory argument.
    #[must_use]
    pub const fn required(kind: TokenKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    /// An argument that may be left out.
    #[must_use]
    pub const fn optional(kind: TokenKind) -> Self {
        Self {
            kind,
            optional: true,
        }
    }
}

const NO_ARGUMENTS: &[Slot] = &[];
const PATH_ONLY: &[Slot] = &[Slot::required(TokenKind::Path)];
const SET_ARGUMENTS: &[Slot] = &[
    Slot::required(TokenKind::Path),
    Slot::optional(TokenKind::QuotedString),
];
const HELP_ARGUMENTS: &[Slot] = &[Slot::optional(TokenKind::Command)];
const RAW_ARGUMENTS: &[Slot] = &[Slot::required(TokenKind::AdminWord)];

/// Argument slots of `keyword`, the keyword itself excluded.
#[must_use]
pub const fn grammar(keyword: Keyword) -> &'static [Slot] {
    match keyword {
        Keyword::Ls
        | Keyword::Get
        | Keyword::Stat
        | Keyword::Create
        | Keyword::Delete
        | Keyword::Rmr
        | Keyword::Edit => PATH_ONLY,
        Keyword::Set => SET_ARGUMENTS,
        Keyword::Help => HELP_ARGUMENTS,
        Keyword::Raw => RAW_ARGUMENTS,
        Keyword::Quit | Keyword::Exit | Keyword::Close | Keyword::ToggleWrite => NO_ARGUMENTS,
    }
}

/// Whether `tokens` fill `slots` exactly. Optional slots may be skipped; no token may be left over.
#[must_use]
pub fn matches_slots(slots: &[Slot], tokens: &[Token]) -> bool {
    let Some((slot, remaining_slots)) = slots.split_first() else {
        return tokens.is_empty();
    };
    let consumed = tokens
        .split_first()
        .is_some_and(|(token, rest)| token.is_kind(slot.kind) && matches_slots(remaining_slots, rest));
    consumed || (slot.optional && matches_slots(remaining_slots, tokens))
}

/// A validated command: keyword and raw argument strings in token order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command to run.
    pub keyword: Keyword,
    /// Argument texts, quotes kept.
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Builds a command from the permissive token stream of a line.
    ///
    /// Returns `None` when the stream does not start with a keyword.
    #[must_use]
    pub fn from_tokens(tokens: Vec<Token>) -> Option<Self> {
        let mut tokens = tokens.into_iter();
        let keyword = tokens
            .next()
            .filter(|token| token.is_kind(TokenKind::Command))
            .and_then(|token| Keyword::from_word(&token.text))?;
        Some(Self {
            keyword,
            args: tokens.map(|token| token.text).collect(),
        })
    }

    /// Argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Checks one input line against the grammar of its leading keyword.
#[derive(Debug, Clone)]
pub struct CommandValidator<'a> {
    input: &'a str,
    keyword: Keyword,
    arguments: Vec<Token>,
}

impl<'a> CommandValidator<'a> {
    /// Resolves the leading keyword of `input`.
    ///
    /// Fails with [`ShellError::UnknownCommand`] when the first word is not a keyword.
    pub fn new(input: &'a str) -> Result<Self, ShellError> {
        let mut tokens = tokenizer::scan(input);
        let keyword = tokens
            .first()
            .filter(|token| token.is_kind(TokenKind::Command))
            .and_then(|token| Keyword::from_word(&token.text))
            .ok_or_else(|| ShellError::UnknownCommand {
                input: input.to_owned(),
            })?;
        tokens.remove(0);
        Ok(Self {
            input,
            keyword,
            arguments: tokens,
        })
    }

    /// The leading keyword.
    #[must_use]
    pub const fn keyword(&self) -> Keyword {
        self.keyword
    }

    /// Whether the arguments satisfy the keyword's grammar.
    #[must_use]
    pub fn validate(&self) -> bool {
        matches_slots(grammar(self.keyword), &self.arguments)
    }

    /// Like [`validate`](Self::validate) but reports failures as [`ShellError::CommandValidation`].
    pub fn check(&self) -> Result<Keyword, ShellError> {
        if self.validate() {
            Ok(self.keyword)
        } else {
            Err(ShellError::CommandValidation {
                keyword: self.keyword,
                message: format!("Command '{}' is invalid", self.input.trim()),
            })
        }
    }
}

/// Validates `input`, returning its keyword.
pub fn validate_command_input(input: &str) -> Result<Keyword, ShellError> {
    CommandValidator::new(input)?.check()
}
