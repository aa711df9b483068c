//! Terminal input where Ctrl-C cancels the read in progress instead of killing the shell.
//!
//! Stdin is read on a worker thread, one line per request, so nothing is consumed while an
//! external editor owns the terminal. A signal watcher pushes interrupts into the same queue,
//! which wakes whichever prompt is waiting.

use std::{
    io::{self, BufRead},
    sync::Arc,
    thread,
};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::{
    runtime::Builder,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use treesh_core::LineInput;

#[derive(Debug)]
enum InputEvent {
    Line(Vec<u8>),
    Interrupt,
    Failed(io::Error),
    Closed,
}

#[derive(Debug)]
struct Queue {
    requests: UnboundedSender<()>,
    events: UnboundedReceiver<InputEvent>,
    pending: bool,
    closed: bool,
}

impl Queue {
    fn next_line(&mut self, buf: &mut String) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        // A read cancelled by Ctrl-C stays outstanding and answers the next prompt.
        if !self.pending {
            if self.requests.send(()).is_err() {
                self.closed = true;
                return Ok(0);
            }
            self.pending = true;
        }
        match self.events.blocking_recv() {
            Some(InputEvent::Line(bytes)) => {
                self.pending = false;
                buf.push_str(&String::from_utf8_lossy(&bytes));
                Ok(bytes.len())
            }
            Some(InputEvent::Interrupt) => Err(io::ErrorKind::Interrupted.into()),
            Some(InputEvent::Failed(err)) => {
                self.pending = false;
                Err(err)
            }
            Some(InputEvent::Closed) | None => {
                self.pending = false;
                self.closed = true;
                Ok(0)
            }
        }
    }
}

/// Line source over process stdin. Clones share one queue, so the command loop and the
/// confirmation prompt read the same stream in order.
#[derive(Debug, Clone)]
pub struct TerminalInput {
    queue: Arc<Mutex<Queue>>,
}

impl TerminalInput {
    /// Starts the stdin reader and the Ctrl-C watcher.
    pub fn spawn() -> Result<Self> {
        let (input, events) = Self::with_reader(|| io::stdin().lock())?;
        watch_interrupts(events).context("installing the Ctrl-C handler")?;
        Ok(input)
    }

    fn with_reader<R, F>(open: F) -> Result<(Self, UnboundedSender<InputEvent>)>
    where
        R: BufRead,
        F: FnOnce() -> R + Send + 'static,
    {
        let (requests, pending_reads) = mpsc::unbounded_channel();
        let (events, received) = mpsc::unbounded_channel();
        let lines = events.clone();
        thread::Builder::new()
            .name("treesh-stdin".into())
            .spawn(move || serve_reads(open(), pending_reads, &lines))
            .context("starting the stdin reader")?;
        let queue = Queue {
            requests,
            events: received,
            pending: false,
            closed: false,
        };
        Ok((
            Self {
                queue: Arc::new(Mutex::new(queue)),
            },
            events,
        ))
    }
}

impl LineInput for TerminalInput {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        self.queue.lock().next_line(buf)
    }
}

fn serve_reads<R: BufRead>(
    mut reader: R,
    mut requests: UnboundedReceiver<()>,
    events: &UnboundedSender<InputEvent>,
) {
    while requests.blocking_recv().is_some() {
        let mut line = Vec::new();
        let event = match reader.read_until(b'\n', &mut line) {
            Ok(0) => InputEvent::Closed,
            Ok(_) => InputEvent::Line(line),
            Err(err) => InputEvent::Failed(err),
        };
        let closed = matches!(event, InputEvent::Closed);
        if events.send(event).is_err() || closed {
            break;
        }
    }
}

fn watch_interrupts(events: UnboundedSender<InputEvent>) -> Result<()> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    #[cfg(unix)]
    let mut interrupts = {
        let _guard = runtime.enter();
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?
    };
    thread::Builder::new()
        .name("treesh-interrupts".into())
        .spawn(move || {
            runtime.block_on(async move {
                loop {
                    #[cfg(unix)]
                    let received = interrupts.recv().await.is_some();
                    #[cfg(not(unix))]
                    let received = tokio::signal::ctrl_c().await.is_ok();
                    if !received || events.send(InputEvent::Interrupt).is_err() {
                        break;
                    }
                }
            });
        })?;
    Ok(())
}
