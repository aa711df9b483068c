//! Command summaries and usage texts.

use crate::lexicon::{self, Keyword};

/// One usage example, optionally annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    /// Line as the user would type it.
    pub command: &'static str,
    /// Trailing `#` remark.
    pub comment: Option<&'static str>,
}

const fn example(command: &'static str) -> Example {
    Example {
        command,
        comment: None,
    }
}

const fn commented(command: &'static str, comment: &'static str) -> Example {
    Example {
        command,
        comment: Some(comment),
    }
}

/// Documentation of one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDoc {
    /// One-line description.
    pub summary: &'static str,
    /// Synopsis, e.g. `ls <path>`.
    pub usage: &'static str,
    /// At least one example.
    pub examples: &'static [Example],
}

impl CommandDoc {
    /// `Usage:` line followed by the examples.
    #[must_use]
    pub fn usage_text(&self) -> String {
        let mut text = format!("Usage: {}\n", self.usage);
        match self.examples {
            [single] if single.comment.is_none() => {
                text.push_str(&format!("Example: {}", single.command));
            }
            examples => {
                text.push_str("Examples:");
                let width = examples.iter().map(|e| e.command.len()).max().unwrap_or(0) + 2;
                for example in examples {
                    let line = match example.comment {
                        Some(comment) => format!("{:<width$}# {comment}", example.command),
                        None => example.command.to_owned(),
                    };
                    text.push_str(&format!("\n- {line}"));
                }
            }
        }
        text
    }

    /// Summary, blank line, then usage.
    #[must_use]
    pub fn full_text(&self) -> String {
        format!("{}\n\n{}", self.summary, self.usage_text())
    }
}

const CLOSE_SHELL: &str = "Close the shell";

const CLOSE_DOC: CommandDoc = CommandDoc {
    summary: CLOSE_SHELL,
    usage: "close",
    examples: &[example("close")],
};

const CREATE_DOC: CommandDoc = CommandDoc {
    summary: "Recursively create a path if it doesn't exist",
    usage: "create <path>",
    examples: &[example("create /test/node")],
};

const DELETE_DOC: CommandDoc = CommandDoc {
    summary: "Delete a leaf node",
    usage: "delete <path>",
    examples: &[example("delete /test")],
};

const EDIT_DOC: CommandDoc = CommandDoc {
    summary: "Edit the content of a node",
    usage: "edit <path>",
    examples: &[example("edit /test")],
};

const EXIT_DOC: CommandDoc = CommandDoc {
    summary: CLOSE_SHELL,
    usage: "exit",
    examples: &[example("exit")],
};

const GET_DOC: CommandDoc = CommandDoc {
    summary: "Display the content of a node",
    usage: "get <path>",
    examples: &[example("get /test")],
};

const HELP_DOC: CommandDoc = CommandDoc {
    summary: "Print the help of a command",
    usage: "help [command]",
    examples: &[
        commented("help", "shows the list of commands"),
        commented("help ls", "shows a command help"),
    ],
};

const LS_DOC: CommandDoc = CommandDoc {
    summary: "Display the children of a node",
    usage: "ls <path>",
    examples: &[example("ls /test")],
};

const QUIT_DOC: CommandDoc = CommandDoc {
    summary: CLOSE_SHELL,
    usage: "quit",
    examples: &[example("quit")],
};

const RAW_DOC: CommandDoc = CommandDoc {
    summary: "Send a four-letter admin command to the server",
    usage: "raw <four-letter-word>",
    examples: &[
        commented("raw ruok", "checks that the server is running"),
        commented("raw srvr", "shows server statistics"),
    ],
};

const RMR_DOC: CommandDoc = CommandDoc {
    summary: "Recursively delete all children nodes, along with argument node",
    usage: "rmr <path>",
    examples: &[example("rmr /test")],
};

const SET_DOC: CommandDoc = CommandDoc {
    summary: "Set or update the content of a node",
    usage: "set <path> ['value']",
    examples: &[
        commented("set /test 'some data'", "stores `some data`"),
        commented(r#"set /test '{"key": "value"}'"#, "stores a JSON document"),
        commented("set /test", "stores an empty payload"),
    ],
};

const STAT_DOC: CommandDoc = CommandDoc {
    summary: "Display a node's metadata",
    usage: "stat <path>",
    examples: &[example("stat /test")],
};

const TOGGLE_WRITE_DOC: CommandDoc = CommandDoc {
    summary: "Activate/deactivate read-only mode",
    usage: "toggle_write",
    examples: &[example("toggle_write")],
};

/// Documentation of `keyword`.
#[must_use]
pub const fn doc(keyword: Keyword) -> &'static CommandDoc {
    match keyword {
        Keyword::Close => &CLOSE_DOC,
        Keyword::Create => &CREATE_DOC,
        Keyword::Delete => &DELETE_DOC,
        Keyword::Edit => &EDIT_DOC,
        Keyword::Exit => &EXIT_DOC,
        Keyword::Get => &GET_DOC,
        Keyword::Help => &HELP_DOC,
        Keyword::Ls => &LS_DOC,
        Keyword::Quit => &QUIT_DOC,
        Keyword::Raw => &RAW_DOC,
        Keyword::Rmr => &RMR_DOC,
        Keyword::Set => &SET_DOC,
        Keyword::Stat => &STAT_DOC,
        Keyword::ToggleWrite => &TOGGLE_WRITE_DOC,
    }
}

/// Usage text of `keyword`, printed after a malformed invocation.
#[must_use]
pub fn command_usage(keyword: Keyword) -> String {
    doc(keyword).usage_text()
}

/// Summary and usage of `keyword`.
#[must_use]
pub fn command_help(keyword: Keyword) -> String {
    doc(keyword).full_text()
}

/// One summary line per command, in keyword order.
#[must_use]
pub fn general_help() -> String {
    let mut text = String::from("Commands:");
    for keyword in lexicon::keywords() {
        text.push_str(&format!("\n- {keyword}: {}", doc(*keyword).summary));
    }
    text
}
