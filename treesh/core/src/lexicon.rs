//! Command vocabulary and the token grammars shared by the tokenizer and the validator.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Every command the shell understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    /// `close`, alias of `quit`.
    Close,
    /// `create <path>`.
    Create,
    /// `delete <path>`.
    Delete,
    /// `edit <path>`.
    Edit,
    /// `exit`, alias of `quit`.
    Exit,
    /// `get <path>`.
    Get,
    /// `help [command]`.
    Help,
    /// `ls <path>`.
    Ls,
    /// `quit`.
    Quit,
    /// `raw <admin-word>`.
    Raw,
    /// `rmr <path>`.
    Rmr,
    /// `set <path> [value]`.
    Set,
    /// `stat <path>`.
    Stat,
    /// `toggle_write`.
    ToggleWrite,
}

impl Keyword {
    /// The whole vocabulary, alphabetically ordered.
    pub const ALL: [Self; 14] = [
        Self::Close,
        Self::Create,
        Self::Delete,
        Self::Edit,
        Self::Exit,
        Self::Get,
        Self::Help,
        Self::Ls,
        Self::Quit,
        Self::Raw,
        Self::Rmr,
        Self::Set,
        Self::Stat,
        Self::ToggleWrite,
    ];

    /// The word typed by the user.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Edit => "edit",
            Self::Exit => "exit",
            Self::Get => "get",
            Self::Help => "help",
            Self::Ls => "ls",
            Self::Quit => "quit",
            Self::Raw => "raw",
            Self::Rmr => "rmr",
            Self::Set => "set",
            Self::Stat => "stat",
            Self::ToggleWrite => "toggle_write",
        }
    }

    /// Resolves a word to its keyword. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|keyword| keyword.as_str() == word)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical category a grammar slot can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// A command keyword.
    Command,
    /// A `/`-prefixed node path without whitespace.
    Path,
    /// A single- or double-quoted string, quotes included.
    QuotedString,
    /// A four-letter administrative mnemonic.
    AdminWord,
}

impl TokenKind {
    /// Whether `text` is a complete token of this kind.
    #[must_use]
    pub fn matches(self, text: &str) -> bool {
        token_pattern(self).is_match(text)
    }
}

/// Four-letter words the server answers to.
pub const ADMIN_WORDS: [&str; 17] = [
    "conf", "cons", "crst", "dirs", "dump", "envi", "gtmk", "isro", "mntr", "ruok", "srst",
    "srvr", "stat", "stmk", "wchc", "wchp", "wchs",
];

const PATH: &str = r"/\S*";
const QUOTED: &str = r#"'[^']*'|"[^"]*""#;

fn alternation<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

fn anchored(fragment: &str) -> Regex {
    Regex::new(&format!("^(?:{fragment})$")).expect("lexicon patterns are valid")
}

static COMMAND_PATTERN: Lazy<Regex> =
    Lazy::new(|| anchored(&alternation(Keyword::ALL.iter().map(|keyword| keyword.as_str()))));
static PATH_PATTERN: Lazy<Regex> = Lazy::new(|| anchored(PATH));
static QUOTED_PATTERN: Lazy<Regex> = Lazy::new(|| anchored(QUOTED));
static ADMIN_PATTERN: Lazy<Regex> = Lazy::new(|| anchored(&alternation(ADMIN_WORDS)));
static CHUNK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{QUOTED}|\S+")).expect("lexicon patterns are valid"));

/// Full-token pattern for `kind`.
#[must_use]
pub fn token_pattern(kind: TokenKind) -> &'static Regex {
    match kind {
        TokenKind::Command => &*COMMAND_PATTERN,
        TokenKind::Path => &*PATH_PATTERN,
        TokenKind::QuotedString => &*QUOTED_PATTERN,
        TokenKind::AdminWord => &*ADMIN_PATTERN,
    }
}

/// Pattern splitting a line into candidate tokens: a quoted string or a run of non-blanks.
#[must_use]
pub fn chunk_pattern() -> &'static Regex {
    &*CHUNK_PATTERN
}

/// Whether `text` is a command keyword.
#[must_use]
pub fn is_keyword(text: &str) -> bool {
    TokenKind::Command.matches(text)
}

/// Whether `text` is an administrative four-letter word.
#[must_use]
pub fn is_admin_word(text: &str) -> bool {
    TokenKind::AdminWord.matches(text)
}

/// Keywords in the order help listings use.
#[must_use]
pub const fn keywords() -> &'static [Keyword] {
    &Keyword::ALL
}
