use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::{json, Value};
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::{Handle, Runtime};

use crate::{
    error::ShellError,
    grammar::ParsedCommand,
    lexicon::Keyword,
    registry::registry,
    runner::{Outcome, Reply},
    session::Session,
};

/// Event emitted after a successful mutating command.
pub const MUTATION_EVENT: &str = "tree.mutation";
/// Event emitted when the session switches between read-only and read-write.
pub const WRITE_MODE_EVENT: &str = "shell.write_mode";

/// Builder configuring shell telemetry.
pub struct ShellTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    log_level: LogLevel,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl ShellTelemetryBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            log_level: LogLevel::Info,
            event_publisher: None,
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the minimum level written to the log.
    #[must_use]
    pub const fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Assigns the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<ShellTelemetry> {
        ShellTelemetry::new(
            self.module,
            self.log_path,
            self.log_level,
            self.event_publisher,
        )
    }
}

/// Telemetry handle for the shell loop.
#[derive(Clone)]
pub struct ShellTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for ShellTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellTelemetry")
            .field("module", &self.inner.module)
            .field("logging", &self.inner.logger.is_some())
            .field("events", &self.inner.event.is_some())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
    event: Option<EventHandle>,
}

struct EventHandle {
    runtime: Runtime,
    publisher: Arc<dyn EventPublisher>,
}

impl EventHandle {
    fn new(publisher: Arc<dyn EventPublisher>) -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new()?,
            publisher,
        })
    }

    fn publish(&self, record: EventRecord) -> Result<()> {
        if let Ok(handle) = Handle::try_current() {
            let publisher = Arc::clone(&self.publisher);
            handle.spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("telemetry event publish failed: {err:?}");
                }
            });
            Ok(())
        } else {
            self.runtime.block_on(self.publisher.publish(record))
        }
    }
}

impl ShellTelemetry {
    fn new(
        module: impl Into<String>,
        log_path: Option<PathBuf>,
        log_level: LogLevel,
        event_publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Result<Self> {
        let logger = match log_path {
            Some(path) => Some(JsonLogger::new(path)?.with_min_level(log_level)),
            None => None,
        };
        let event = match event_publisher {
            Some(publisher) => Some(EventHandle::new(publisher)?),
            None => None,
        };
        Ok(Self {
            inner: Arc::new(TelemetryInner {
                module: module.into(),
                logger,
                event,
            }),
        })
    }

    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> ShellTelemetryBuilder {
        ShellTelemetryBuilder::new(module)
    }

    /// Logs a structured record.
    pub fn log(&self, level: LogLevel, message: &str, metadata: &Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            logger.log(&record)?;
        }
        Ok(())
    }

    /// Emits an event entry via the configured publisher.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(handle) = &self.inner.event {
            handle.publish(EventRecord::new(&self.inner.module, event_type, payload))?;
        }
        Ok(())
    }

    /// Records one dispatched line: a log entry always, an audit event for changes.
    ///
    /// `session` is the state after the command ran; `index` is the command's own index.
    pub fn record_command(
        &self,
        index: u64,
        session: &Session,
        command: Option<&ParsedCommand>,
        result: &Result<Outcome, ShellError>,
    ) -> Result<()> {
        let keyword = command.map(|command| command.keyword);
        let mut metadata = json!({
            "index": index,
            "keyword": keyword.map(Keyword::as_str),
            "read_only": session.read_only(),
        });
        let level = match result {
            Ok(outcome) => {
                metadata["outcome"] = json!(outcome.label());
                LogLevel::Info
            }
            Err(err) => {
                metadata["error"] = json!(err.kind());
                metadata["detail"] = json!(err.to_string());
                if err.is_recoverable() {
                    LogLevel::Warn
                } else {
                    LogLevel::Error
                }
            }
        };
        self.log(level, "shell.command", &metadata)?;

        let (Some(command), Ok(Outcome::Continue(reply))) = (command, result) else {
            return Ok(());
        };
        if matches!(reply, Reply::Unchanged(_)) {
            return Ok(());
        }
        if command.keyword == Keyword::ToggleWrite {
            self.event(
                WRITE_MODE_EVENT,
                json!({ "index": index, "read_only": session.read_only() }),
            )?;
        } else if registry()
            .get(command.keyword)
            .is_some_and(|spec| spec.mutating)
        {
            self.event(
                MUTATION_EVENT,
                json!({
                    "index": index,
                    "keyword": command.keyword.as_str(),
                    "path": command.arg(0),
                }),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_event_bus::MemoryEventBus;
    use tempfile::tempdir;

    fn command(keyword: Keyword, args: &[&str]) -> ParsedCommand {
        ParsedCommand {
            keyword,
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn telemetry_logs_and_emits() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("shell.log");
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = ShellTelemetry::builder("shell")
            .log_path(&log_path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "shell.test", &json!({ "artifact": "sample" }))
            .unwrap();
        telemetry
            .event("shell.test", json!({ "records": 1 }))
            .unwrap();
        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("shell.test"));
        assert_eq!(bus.snapshot().len(), 1);
    }

    #[test]
    fn successful_writes_become_mutation_events() {
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = ShellTelemetry::builder("shell")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let session = Session::new(false);
        let set = command(Keyword::Set, &["/a", "'x'"]);
        let done = Ok(Outcome::Continue(Reply::Empty));
        telemetry.record_command(3, &session, Some(&set), &done).unwrap();
        telemetry
            .record_command(4, &session, Some(&command(Keyword::Get, &["/a"])), &done)
            .unwrap();
        telemetry
            .record_command(5, &session, Some(&set), &Err(ShellError::UnauthorizedWrite {
                keyword: Keyword::Set,
            }))
            .unwrap();
        telemetry
            .record_command(6, &session, Some(&command(Keyword::Delete, &["/a"])), &Ok(Outcome::Declined))
            .unwrap();

        let mutations = bus.events_of_type(MUTATION_EVENT);
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].payload["index"], 3);
        assert_eq!(mutations[0].payload["path"], "/a");
        assert_eq!(bus.snapshot().len(), 1);
    }

    #[test]
    fn edits_without_changes_publish_nothing() {
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = ShellTelemetry::builder("shell")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let session = Session::new(false);
        let edit = command(Keyword::Edit, &["/a"]);
        telemetry
            .record_command(
                0,
                &session,
                Some(&edit),
                &Ok(Outcome::Continue(Reply::Unchanged("/a unchanged".into()))),
            )
            .unwrap();
        assert!(bus.snapshot().is_empty());

        telemetry
            .record_command(1, &session, Some(&edit), &Ok(Outcome::empty()))
            .unwrap();
        let mutations = bus.events_of_type(MUTATION_EVENT);
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0].payload["keyword"], "edit");
    }

    #[test]
    fn write_mode_changes_are_published() {
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = ShellTelemetry::builder("shell")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let session = Session::new(false);
        telemetry
            .record_command(
                0,
                &session,
                Some(&command(Keyword::ToggleWrite, &[])),
                &Ok(Outcome::text("Switched to read-write mode")),
            )
            .unwrap();
        let events = bus.events_of_type(WRITE_MODE_EVENT);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["read_only"], false);
    }

    #[test]
    fn log_level_filters_successes() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("shell.log");
        let telemetry = ShellTelemetry::builder("shell")
            .log_path(&log_path)
            .log_level(LogLevel::Warn)
            .build()
            .unwrap();
        let session = Session::default();
        telemetry
            .record_command(0, &session, Some(&command(Keyword::Ls, &["/"])), &Ok(Outcome::empty()))
            .unwrap();
        telemetry
            .record_command(
                1,
                &session,
                None,
                &Err(ShellError::UnknownCommand {
                    input: "lsx /".into(),
                }),
            )
            .unwrap();
        let content = std::fs::read_to_string(log_path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["metadata"]["error"], "unknown_command");
        assert_eq!(lines[0]["level"], "WARN");
    }
}
