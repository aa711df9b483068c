//! Line dispatcher: validation, write gate, confirmation, then the command handler.

use crate::{
    client::TreeClient,
    confirm::{AssumeDefault, Confirm},
    editor::{ExternalEditor, NodeEditor},
    error::ShellError,
    grammar::{CommandValidator, ParsedCommand},
    handlers::Context,
    registry::registry,
    session::Session,
    telemetry::ShellTelemetry,
    tokenizer,
};

/// What a successful command has to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to print.
    Empty,
    /// Text printed as is.
    Text(String),
    /// Node payload; front-ends may pretty-print it.
    Payload(String),
    /// Text printed as is; the command left the tree untouched.
    Unchanged(String),
}

/// How the loop should proceed after a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Show the reply and read the next line.
    Continue(Reply),
    /// The user declined a confirmation; nothing was changed.
    Declined,
    /// The user asked to leave the shell.
    Terminate,
}

impl Outcome {
    /// Success with nothing to print.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Continue(Reply::Empty)
    }

    /// Success with a text reply.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Continue(Reply::Text(text.into()))
    }

    /// Short stable name used in logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Continue(_) => "continue",
            Self::Declined => "declined",
            Self::Terminate => "terminate",
        }
    }
}

/// Runs shell lines against a tree client.
pub struct CommandRunner<C> {
    client: C,
    session: Session,
    confirmer: Box<dyn Confirm>,
    editor: Box<dyn NodeEditor>,
    telemetry: Option<ShellTelemetry>,
}

impl<C: TreeClient> CommandRunner<C> {
    /// Creates a runner. Until a confirmer is set, every confirmation gets its default answer.
    pub fn new(client: C, session: Session) -> Self {
        Self {
            client,
            session,
            confirmer: Box::new(AssumeDefault),
            editor: Box::new(ExternalEditor::from_env()),
            telemetry: None,
        }
    }

    /// Sets the source of yes/no answers.
    #[must_use]
    pub fn with_confirmer(mut self, confirmer: impl Confirm + 'static) -> Self {
        self.confirmer = Box::new(confirmer);
        self
    }

    /// Sets the editor used by `edit`.
    #[must_use]
    pub fn with_editor(mut self, editor: impl NodeEditor + 'static) -> Self {
        self.editor = Box::new(editor);
        self
    }

    /// Records every command through `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: ShellTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Shell state.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable shell state, e.g. to report a new terminal width.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The tree backend.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Runs one line and moves the session to the next command index.
    ///
    /// Blank lines are a no-op. Declined confirmations are `Ok(Outcome::Declined)`.
    pub fn run(&mut self, line: &str) -> Result<Outcome, ShellError> {
        let index = self.session.command_index();
        let (command, result) = if line.trim().is_empty() {
            (None, Ok(Outcome::empty()))
        } else {
            match self.parse(line) {
                Ok(command) => {
                    let result = self.dispatch(&command);
                    (Some(command), result)
                }
                Err(err) => (None, Err(err)),
            }
        };
        if let Some(telemetry) = &self.telemetry {
            if let Err(err) = telemetry.record_command(index, &self.session, command.as_ref(), &result) {
                eprintln!("telemetry failure: {err:?}");
            }
        }
        self.session.advance();
        result
    }

    fn parse(&self, line: &str) -> Result<ParsedCommand, ShellError> {
        let keyword = CommandValidator::new(line)?.check()?;
        ParsedCommand::from_tokens(tokenizer::tokenize(line))
            .filter(|command| command.keyword == keyword)
            .ok_or_else(|| ShellError::UnknownCommand {
                input: line.to_owned(),
            })
    }

    fn dispatch(&mut self, command: &ParsedCommand) -> Result<Outcome, ShellError> {
        let spec = registry()
            .get(command.keyword)
            .ok_or_else(|| ShellError::UnknownCommand {
                input: command.keyword.to_string(),
            })?;
        if spec.mutating && self.session.read_only() {
            return Err(ShellError::UnauthorizedWrite {
                keyword: command.keyword,
            });
        }
        if let Some(build_prompt) = spec.confirmation {
            if !self.confirmer.confirm(&build_prompt(command)) {
                return Ok(Outcome::Declined);
            }
        }
        let mut ctx = Context {
            client: &mut self.client,
            session: &mut self.session,
            editor: self.editor.as_mut(),
        };
        (spec.handler)(&mut ctx, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::{ClientError, NodeStat},
        confirm::ConfirmationPrompt,
        lexicon::Keyword,
        memory::MemoryTree,
    };
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    type Calls = Rc<RefCell<HashMap<&'static str, Vec<String>>>>;

    /// Wraps a memory tree and records every backend call.
    struct RecordingClient {
        tree: MemoryTree,
        calls: Calls,
    }

    impl RecordingClient {
        fn record(&self, name: &'static str, detail: String) {
            self.calls.borrow_mut().entry(name).or_default().push(detail);
        }
    }

    impl TreeClient for RecordingClient {
        fn list_children(&self, path: &str) -> Result<Vec<String>, ClientError> {
            self.record("list_children", path.to_owned());
            self.tree.list_children(path)
        }

        fn read_payload(&self, path: &str) -> Result<Option<Vec<u8>>, ClientError> {
            self.record("read_payload", path.to_owned());
            self.tree.read_payload(path)
        }

        fn path_exists(&self, path: &str) -> Result<bool, ClientError> {
            self.record("path_exists", path.to_owned());
            self.tree.path_exists(path)
        }

        fn ensure_path(&mut self, path: &str) -> Result<(), ClientError> {
            self.record("ensure_path", path.to_owned());
            self.tree.ensure_path(path)
        }

        fn create_node(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError> {
            self.record("create_node", path.to_owned());
            self.tree.create_node(path, data)
        }

        fn set_payload(&mut self, path: &str, data: &[u8]) -> Result<(), ClientError> {
            self.record("set_payload", path.to_owned());
            self.tree.set_payload(path, data)
        }

        fn delete_node(&mut self, path: &str, recursive: bool) -> Result<(), ClientError> {
            self.record("delete_node", format!("{path} recursive={recursive}"));
            self.tree.delete_node(path, recursive)
        }

        fn describe(&self, path: &str) -> Result<NodeStat, ClientError> {
            self.record("describe", path.to_owned());
            self.tree.describe(path)
        }

        fn send_admin(&self, word: &str) -> Result<String, ClientError> {
            self.record("send_admin", word.to_owned());
            self.tree.send_admin(word)
        }
    }

    struct Scripted {
        answer: bool,
        asked: Rc<RefCell<Vec<String>>>,
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool {
            self.asked.borrow_mut().push(prompt.message.clone());
            self.answer
        }
    }

    struct Rewrite(&'static [u8]);

    impl NodeEditor for Rewrite {
        fn edit(&mut self, _path: &str, _current: &[u8]) -> Result<Vec<u8>, ShellError> {
            Ok(self.0.to_vec())
        }
    }

    struct Harness {
        runner: CommandRunner<RecordingClient>,
        tree: MemoryTree,
        calls: Calls,
        asked: Rc<RefCell<Vec<String>>>,
    }

    impl Harness {
        fn new(read_only: bool, answer: bool) -> Self {
            let mut tree = MemoryTree::new();
            tree.ensure_path("/test/child").unwrap();
            tree.write_payload("/test", b"hello").unwrap();
            let calls = Calls::default();
            let asked = Rc::new(RefCell::new(Vec::new()));
            let client = RecordingClient {
                tree: tree.clone(),
                calls: Rc::clone(&calls),
            };
            let runner = CommandRunner::new(client, Session::new(read_only))
                .with_confirmer(Scripted {
                    answer,
                    asked: Rc::clone(&asked),
                })
                .with_editor(Rewrite(b"edited"));
            Self {
                runner,
                tree,
                calls,
                asked,
            }
        }

        fn calls_to(&self, name: &str) -> Vec<String> {
            self.calls.borrow().get(name).cloned().unwrap_or_default()
        }

        fn total_calls(&self) -> usize {
            self.calls.borrow().values().map(Vec::len).sum()
        }

        fn text(&mut self, line: &str) -> String {
            match self.runner.run(line).unwrap() {
                Outcome::Continue(
                    Reply::Text(text) | Reply::Payload(text) | Reply::Unchanged(text),
                ) => text,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[test]
    fn read_only_session_refuses_writes_without_touching_the_backend() {
        let mut harness = Harness::new(true, true);
        for line in ["create /x", "set /x 'v'", "delete /test/child", "rmr /test", "edit /test"] {
            let err = harness.runner.run(line).unwrap_err();
            assert!(matches!(err, ShellError::UnauthorizedWrite { .. }), "{line}");
        }
        assert_eq!(harness.total_calls(), 0);
        assert!(harness.asked.borrow().is_empty());
    }

    #[test]
    fn declined_deletions_make_no_calls() {
        let mut harness = Harness::new(false, false);
        assert_eq!(harness.runner.run("delete /test/child").unwrap(), Outcome::Declined);
        assert_eq!(harness.runner.run("rmr /test").unwrap(), Outcome::Declined);
        assert!(harness.calls_to("delete_node").is_empty());
        assert_eq!(harness.asked.borrow().len(), 2);
        assert!(harness.tree.path_exists("/test/child").unwrap());
    }

    #[test]
    fn confirmed_deletions_call_the_backend_once() {
        let mut harness = Harness::new(false, true);
        assert_eq!(harness.runner.run("delete /test/child").unwrap(), Outcome::empty());
        assert_eq!(harness.calls_to("delete_node"), vec!["/test/child recursive=false"]);

        harness.tree.ensure_path("/test/again").unwrap();
        harness.runner.run("rmr /test").unwrap();
        assert_eq!(
            harness.calls_to("delete_node"),
            vec!["/test/child recursive=false", "/test recursive=true"]
        );
        assert!(!harness.tree.path_exists("/test").unwrap());
    }

    #[test]
    fn delete_errors_name_the_path() {
        let mut harness = Harness::new(false, true);
        let err = harness.runner.run("delete /test").unwrap_err();
        assert_eq!(
            err.to_string(),
            "/test is not empty. Use `rmr` to delete it along with its children."
        );
        let err = harness.runner.run("delete /nope").unwrap_err();
        assert_eq!(err.to_string(), "/nope does not exist");
    }

    #[test]
    fn set_strips_quotes_and_creates_missing_nodes() {
        let mut harness = Harness::new(false, true);
        harness.runner.run("set /test 'plop'").unwrap();
        assert_eq!(harness.tree.read_payload("/test").unwrap(), Some(b"plop".to_vec()));
        harness.runner.run(r#"set /fresh '{"key": "value"}'"#).unwrap();
        assert_eq!(
            harness.tree.read_payload("/fresh").unwrap(),
            Some(br#"{"key": "value"}"#.to_vec())
        );
        harness.runner.run("set /test").unwrap();
        assert_eq!(harness.tree.read_payload("/test").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn unquoted_set_value_is_rejected_before_dispatch() {
        let mut harness = Harness::new(false, true);
        let err = harness.runner.run("set /test plop").unwrap_err();
        assert!(matches!(
            err,
            ShellError::CommandValidation {
                keyword: Keyword::Set,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Command 'set /test plop' is invalid");
        assert_eq!(harness.total_calls(), 0);
    }

    #[test]
    fn unknown_commands_keep_the_input() {
        let mut harness = Harness::new(false, true);
        let err = harness.runner.run("lsx /test").unwrap_err();
        assert_eq!(err.to_string(), "Command 'lsx /test' not found");
    }

    #[test]
    fn reads_report_missing_paths() {
        let mut harness = Harness::new(true, true);
        for line in ["get /missing", "stat /missing", "ls /missing"] {
            let err = harness.runner.run(line).unwrap_err();
            assert_eq!(err.to_string(), "/missing does not exist", "{line}");
        }
    }

    #[test]
    fn ls_marks_parents_and_sorts() {
        let mut harness = Harness::new(true, true);
        harness.tree.ensure_path("/test/a").unwrap();
        harness.tree.ensure_path("/test/b/c").unwrap();
        assert_eq!(harness.text("ls /test"), "a      b/     child");
        assert_eq!(harness.text("ls /"), "test/");
    }

    #[test]
    fn get_returns_the_payload() {
        let mut harness = Harness::new(true, true);
        assert_eq!(
            harness.runner.run("get /test").unwrap(),
            Outcome::Continue(Reply::Payload("hello".into()))
        );
        assert!(harness.text("stat /test").contains("dataLength = 5"));
    }

    #[test]
    fn toggle_write_flips_once_per_call() {
        let mut harness = Harness::new(true, true);
        assert_eq!(harness.text("toggle_write"), "Switched to read-write mode");
        assert!(!harness.runner.session().read_only());
        harness.runner.run("create /made/here").unwrap();
        assert!(harness.tree.path_exists("/made/here").unwrap());
        harness.runner.run("toggle_write").unwrap();
        assert!(harness.runner.session().read_only());
    }

    #[test]
    fn raw_and_help_answer_in_read_only_mode() {
        let mut harness = Harness::new(true, true);
        assert_eq!(harness.text("raw ruok"), "imok");
        assert!(harness.text("raw srvr").starts_with("Zookeeper version:"));
        assert!(harness.text("help").starts_with("Commands:\n- close: Close the shell"));
        assert!(harness.text("help ls").contains("Usage: ls <path>"));
    }

    #[test]
    fn quit_aliases_terminate() {
        let mut harness = Harness::new(true, true);
        for line in ["quit", "exit", "  close  "] {
            assert_eq!(harness.runner.run(line).unwrap(), Outcome::Terminate);
        }
    }

    #[test]
    fn edit_writes_only_changed_payloads() {
        let mut harness = Harness::new(false, true);
        harness.runner.run("edit /test").unwrap();
        assert_eq!(harness.tree.read_payload("/test").unwrap(), Some(b"edited".to_vec()));
        assert_eq!(harness.calls_to("set_payload").len(), 1);

        assert_eq!(
            harness.runner.run("edit /test").unwrap(),
            Outcome::Continue(Reply::Unchanged("/test unchanged".into()))
        );
        assert_eq!(harness.calls_to("set_payload").len(), 1);
    }

    #[test]
    fn every_line_advances_the_command_index() {
        let mut harness = Harness::new(true, true);
        harness.runner.run("").unwrap();
        harness.runner.run("ls /").unwrap();
        let _ = harness.runner.run("bogus");
        assert_eq!(harness.runner.session().command_index(), 3);
        assert_eq!(harness.runner.session().prompt(), "(RO 3) > ");
    }
}
