//! Blocking yes/no prompts guarding destructive operations.

use std::io::{self, BufRead, Write};

/// A question to put to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    /// Question shown before the `[y/n]` marker.
    pub message: String,
    /// Answer assumed when input is interrupted or exhausted.
    pub default_on_interrupt: bool,
}

impl ConfirmationPrompt {
    /// Creates a prompt.
    #[must_use]
    pub fn new(message: impl Into<String>, default_on_interrupt: bool) -> Self {
        Self {
            message: message.into(),
            default_on_interrupt,
        }
    }
}

/// Source of yes/no answers.
pub trait Confirm {
    /// Asks until a definite answer is given; returns the prompt default on interruption.
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool;
}

/// Answers every prompt with its interruption default. Used when no terminal is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssumeDefault;

impl Confirm for AssumeDefault {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool {
        prompt.default_on_interrupt
    }
}

/// Line-oriented input answers are read from.
///
/// Implemented for process stdin without holding its lock between prompts, so the shell
/// loop can keep reading commands from the same stream. Bytes that are not UTF-8 are
/// replaced rather than failing the read.
pub trait LineInput {
    /// Appends the next line to `buf`; returns the number of bytes read, zero at end of input.
    ///
    /// A user cancelling the read is reported as [`io::ErrorKind::Interrupted`].
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize>;
}

/// Whether a failed read means the user cancelled it.
#[must_use]
pub fn is_interruption(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}

fn read_lossy<B: BufRead + ?Sized>(reader: &mut B, buf: &mut String) -> io::Result<usize> {
    let mut bytes = Vec::new();
    let read = reader.read_until(b'\n', &mut bytes)?;
    buf.push_str(&String::from_utf8_lossy(&bytes));
    Ok(read)
}

impl<R: LineInput + ?Sized> LineInput for &mut R {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        (**self).read_answer(buf)
    }
}

impl LineInput for io::Stdin {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        read_lossy(&mut self.lock(), buf)
    }
}

impl LineInput for io::StdinLock<'_> {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        read_lossy(self, buf)
    }
}

impl<T: AsRef<[u8]>> LineInput for io::Cursor<T> {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        read_lossy(self, buf)
    }
}

impl<R: io::Read> LineInput for io::BufReader<R> {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        read_lossy(self, buf)
    }
}

/// Prompts on a writer and reads answers line by line.
///
/// Only the first character of an answer counts, case-insensitively. Empty and
/// unrecognized answers re-prompt. A cancelled read, end of input or a failed read all
/// count as an interruption.
#[derive(Debug)]
pub struct TerminalConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: LineInput, W: Write> TerminalConfirm<R, W> {
    /// Wraps an input/output pair.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Releases the wrapped input and output.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{message} [y/n] ")?;
        self.output.flush()?;
        let mut answer = String::new();
        if self.input.read_answer(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer))
    }
}

impl<R: LineInput, W: Write> Confirm for TerminalConfirm<R, W> {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool {
        loop {
            let answer = match self.ask(&prompt.message) {
                Ok(Some(answer)) => answer,
                Ok(None) | Err(_) => {
                    let _ = writeln!(self.output);
                    return prompt.default_on_interrupt;
                }
            };
            match answer.chars().next().map(|c| c.to_ascii_lowercase()) {
                Some('y') => return true,
                Some('n') => return false,
                _ => continue,
            }
        }
    }
}
