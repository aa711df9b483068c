//! One handler per command. Handlers run after validation, gating and confirmation.

use crate::{
    client::{child_path, TreeClient},
    editor::NodeEditor,
    error::ShellError,
    format,
    grammar::ParsedCommand,
    help,
    lexicon::Keyword,
    runner::{Outcome, Reply},
    session::Session,
};

/// Everything a handler may touch while running one command.
pub struct Context<'a> {
    /// Tree backend.
    pub client: &'a mut dyn TreeClient,
    /// Shell state.
    pub session: &'a mut Session,
    /// Editor used by `edit`.
    pub editor: &'a mut dyn NodeEditor,
}

/// Signature shared by every command handler.
pub type Handler = fn(&mut Context<'_>, &ParsedCommand) -> Result<Outcome, ShellError>;

fn path_arg(command: &ParsedCommand) -> Result<&str, ShellError> {
    command
        .arg(0)
        .ok_or_else(|| ShellError::CommandValidation {
            keyword: command.keyword,
            message: format!("`{}` needs a path", command.keyword),
        })
}

/// Removes one layer of matching single or double quotes.
#[must_use]
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Sorted children, `/`-suffixed when they have children of their own, in columns.
pub fn ls(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let path = path_arg(command)?;
    let mut children = ctx.client.list_children(path)?;
    children.sort();
    let mut names = Vec::with_capacity(children.len());
    for child in children {
        let has_children = !ctx
            .client
            .list_children(&child_path(path, &child))?
            .is_empty();
        names.push(if has_children { format!("{child}/") } else { child });
    }
    Ok(Outcome::text(format::columnize(
        &names,
        ctx.session.terminal_width(),
    )))
}

/// Payload of a node as text.
pub fn get(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let path = path_arg(command)?;
    let payload = ctx
        .client
        .read_payload(path)?
        .ok_or_else(|| ShellError::NodeNotFound {
            path: path.to_owned(),
        })?;
    Ok(Outcome::Continue(Reply::Payload(
        String::from_utf8_lossy(&payload).into_owned(),
    )))
}

/// Creates the path and any missing ancestors.
pub fn create(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    ctx.client.ensure_path(path_arg(command)?)?;
    Ok(Outcome::empty())
}

/// Creates or overwrites a node payload.
pub fn set(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let path = path_arg(command)?;
    let value = command.arg(1).map(strip_quotes).unwrap_or_default();
    ctx.client.write_payload(path, value.as_bytes())?;
    Ok(Outcome::empty())
}

/// Deletes a leaf node.
pub fn delete(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    ctx.client.delete_node(path_arg(command)?, false)?;
    Ok(Outcome::empty())
}

/// Deletes a node and its whole subtree.
pub fn rmr(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    ctx.client.delete_node(path_arg(command)?, true)?;
    Ok(Outcome::empty())
}

/// Node metadata.
pub fn stat(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let stat = ctx.client.describe(path_arg(command)?)?;
    Ok(Outcome::text(format::render_stat(&stat)))
}

/// Four-letter admin word, answered verbatim.
pub fn raw(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let word = command.arg(0).ok_or_else(|| ShellError::CommandValidation {
        keyword: command.keyword,
        message: "`raw` needs an admin word".to_owned(),
    })?;
    Ok(Outcome::text(ctx.client.send_admin(word)?))
}

/// General help, or the full help of one command.
pub fn help(_ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let text = match command.arg(0).and_then(Keyword::from_word) {
        Some(keyword) => help::command_help(keyword),
        None => help::general_help(),
    };
    Ok(Outcome::text(text))
}

/// Flips read-only mode.
pub fn toggle_write(ctx: &mut Context<'_>, _command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let read_only = ctx.session.toggle_write();
    let mode = if read_only { "read-only" } else { "read-write" };
    Ok(Outcome::text(format!("Switched to {mode} mode")))
}

/// `quit`, `exit` and `close`.
pub fn terminate(_ctx: &mut Context<'_>, _command: &ParsedCommand) -> Result<Outcome, ShellError> {
    Ok(Outcome::Terminate)
}

/// Round-trips the payload through the editor; writes only when it changed.
pub fn edit(ctx: &mut Context<'_>, command: &ParsedCommand) -> Result<Outcome, ShellError> {
    let path = path_arg(command)?;
    let current = ctx
        .client
        .read_payload(path)?
        .ok_or_else(|| ShellError::NodeNotFound {
            path: path.to_owned(),
        })?;
    let edited = ctx.editor.edit(path, &current)?;
    if edited == current {
        return Ok(Outcome::Continue(Reply::Unchanged(format!(
            "{path} unchanged"
        ))));
    }
    ctx.client.set_payload(path, &edited)?;
    Ok(Outcome::empty())
}
