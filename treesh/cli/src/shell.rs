//! Read loop and script runner around the command runner.

use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use treesh_core::{
    command_usage,
    format::render_payload,
    is_interruption, ConfirmationPrompt, Confirm, CommandRunner, LineInput, Outcome, Reply,
    ShellError, TerminalConfirm, TreeClient,
};

enum ReplControl {
    Continue,
    Exit,
}

/// Text shown for a successful line, if any.
pub fn render_outcome(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Continue(Reply::Empty) | Outcome::Terminate => None,
        Outcome::Continue(Reply::Text(text) | Reply::Unchanged(text)) => Some(text.clone()),
        Outcome::Continue(Reply::Payload(payload)) => Some(render_payload(payload)),
        Outcome::Declined => Some("Aborting".to_owned()),
    }
}

/// Text shown for a failed line. Malformed commands are followed by their usage.
pub fn render_error(err: &ShellError) -> String {
    match err {
        ShellError::CommandValidation { keyword, .. } => {
            format!("{err}\n\n{}", command_usage(*keyword))
        }
        other => other.to_string(),
    }
}

fn terminal_width() -> Option<usize> {
    crossterm::terminal::size()
        .ok()
        .map(|(columns, _)| usize::from(columns))
}

/// Interactive shell over a line source and an output stream.
pub struct Shell<C, R, W> {
    runner: CommandRunner<C>,
    input: R,
    output: W,
    confirm_quit_default: bool,
}

impl<C: TreeClient, R: LineInput, W: Write> Shell<C, R, W> {
    /// Wraps a configured runner.
    pub fn new(runner: CommandRunner<C>, input: R, output: W, confirm_quit_default: bool) -> Self {
        Self {
            runner,
            input,
            output,
            confirm_quit_default,
        }
    }

    /// Prints the server summary.
    pub fn print_banner(&mut self) -> Result<()> {
        let summary = self
            .runner
            .client()
            .send_admin("srvr")
            .context("querying server summary")?;
        writeln!(self.output, "{}", summary.trim_end())?;
        Ok(())
    }

    /// Prompts and runs lines until the user leaves.
    ///
    /// End of input or Ctrl-C asks whether to quit. Errors that leave the backend usable are
    /// printed; the others end the loop.
    pub fn interact(&mut self) -> Result<()> {
        loop {
            if let Some(width) = terminal_width() {
                self.runner.session_mut().set_terminal_width(width);
            }
            write!(self.output, "{}", self.runner.session().prompt())?;
            self.output.flush()?;

            let mut line = String::new();
            let read = match self.input.read_answer(&mut line) {
                Ok(read) => read,
                Err(err) if is_interruption(&err) => 0,
                Err(err) => return Err(err).context("reading command"),
            };
            if read == 0 {
                writeln!(self.output)?;
                if self.confirm_quit() {
                    return Ok(());
                }
                self.runner.session_mut().advance();
                continue;
            }
            match self.execute(line.trim_end_matches(['\n', '\r'])) {
                Ok(ReplControl::Continue) => {}
                Ok(ReplControl::Exit) => return Ok(()),
                Err(err) if err.is_recoverable() => {
                    writeln!(self.output, "{}", render_error(&err))?;
                }
                Err(err) => return Err(anyhow!(err).context("shell session aborted")),
            }
        }
    }

    /// Runs `lines` in order without prompting for commands.
    ///
    /// Stops at the first failure unless `continue_on_error` is set; unrecoverable failures
    /// always stop. Confirmations get whatever the runner's confirmer answers.
    pub fn run_script(&mut self, lines: &[String], continue_on_error: bool) -> Result<()> {
        for (idx, line) in lines.iter().enumerate() {
            match self.execute(line) {
                Ok(ReplControl::Continue) => {}
                Ok(ReplControl::Exit) => break,
                Err(err) => {
                    writeln!(self.output, "{}", render_error(&err))?;
                    if !(continue_on_error && err.is_recoverable()) {
                        bail!("command {} failed: {}", idx + 1, line.trim());
                    }
                }
            }
        }
        self.output.flush()?;
        Ok(())
    }

    /// Releases the runner and the streams.
    #[cfg(test)]
    pub fn into_parts(self) -> (CommandRunner<C>, R, W) {
        (self.runner, self.input, self.output)
    }

    fn execute(&mut self, line: &str) -> Result<ReplControl, ShellError> {
        let outcome = self.runner.run(line)?;
        if let Some(text) = render_outcome(&outcome) {
            // A failed write to the terminal leaves nothing else to report to.
            let _ = writeln!(self.output, "{text}");
        }
        Ok(match outcome {
            Outcome::Terminate => ReplControl::Exit,
            Outcome::Continue(_) | Outcome::Declined => ReplControl::Continue,
        })
    }

    fn confirm_quit(&mut self) -> bool {
        let prompt = ConfirmationPrompt::new("Quit?", self.confirm_quit_default);
        TerminalConfirm::new(&mut self.input, &mut self.output).confirm(&prompt)
    }
}
