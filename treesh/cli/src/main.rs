mod config;
mod input;
mod shell;

use std::{
    fs,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use shared_event_bus::FileEventPublisher;
use treesh_core::{CommandRunner, MemoryTree, Session, ShellTelemetry, TerminalConfirm};

use crate::{
    config::{Overrides, ShellConfig},
    input::TerminalInput,
    shell::Shell,
};

#[derive(Parser, Debug)]
#[command(
    name = "treesh",
    version,
    about = "Interactive shell for hierarchical key-value trees"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Start with writes enabled.
    #[arg(long)]
    write: bool,
    /// JSON document mapping node paths to payloads, loaded before the first command.
    #[arg(long)]
    seed: Option<PathBuf>,
    /// JSON-lines session log.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Minimum logged level (debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
    /// Audit log receiving one event per change.
    #[arg(long)]
    event_log: Option<PathBuf>,
    /// Runs this command instead of prompting; repeat to run several in order.
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,
    /// Keeps running `-c` commands after a failure.
    #[arg(long)]
    continue_on_error: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            write: self.write,
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
            event_log: self.event_log.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    }
    .with_overrides(cli.overrides());

    let tree = match &cli.seed {
        Some(path) => load_seed(path)?,
        None => MemoryTree::new(),
    };
    let input = TerminalInput::spawn()?;
    let runner = CommandRunner::new(tree, Session::new(config.shell.read_only))
        .with_confirmer(TerminalConfirm::new(input.clone(), io::stdout()))
        .with_telemetry(build_telemetry(&config)?);
    let mut shell = Shell::new(
        runner,
        input,
        io::stdout(),
        config.shell.confirm_quit_default,
    );

    if !cli.commands.is_empty() {
        return shell.run_script(&cli.commands, cli.continue_on_error);
    }
    if config.shell.print_banner {
        shell.print_banner()?;
    }
    shell.interact()
}

fn build_telemetry(config: &ShellConfig) -> Result<ShellTelemetry> {
    let mut builder = ShellTelemetry::builder("treesh").log_level(config.log_level()?);
    if let Some(path) = &config.logging.path {
        builder = builder.log_path(path);
    }
    if let Some(path) = &config.events.path {
        builder = builder.event_publisher(Arc::new(FileEventPublisher::new(path)?));
    }
    builder.build().context("initialising telemetry")
}

fn load_seed(path: &Path) -> Result<MemoryTree> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading seed document {}", path.display()))?;
    let entries: Map<String, Value> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing seed document {}", path.display()))?;
    MemoryTree::from_seed(&entries).with_context(|| format!("seeding from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;
    use treesh_core::TreeClient;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_commands_keep_their_order() {
        let cli = Cli::parse_from(["treesh", "--write", "-c", "create /a", "--command", "ls /"]);
        assert!(cli.write);
        assert_eq!(cli.commands, vec!["create /a", "ls /"]);
        assert!(cli.overrides().log_file.is_none());
    }

    #[test]
    fn seed_documents_populate_the_tree() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seed.json");
        fs::write(&path, r#"{"/app/name": "demo", "/app/limits": {"max": 3}}"#).unwrap();
        let tree = load_seed(&path).unwrap();
        assert_eq!(tree.read_payload("/app/name").unwrap(), Some(b"demo".to_vec()));
        assert_eq!(
            tree.read_payload("/app/limits").unwrap(),
            Some(br#"{"max":3}"#.to_vec())
        );
    }

    #[test]
    fn malformed_seed_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seed.json");
        fs::write(&path, "[1, 2]").unwrap();
        let err = load_seed(&path).unwrap_err();
        assert!(err.to_string().starts_with("parsing seed document"));
    }

    #[test]
    fn telemetry_writes_where_configured() {
        let dir = tempdir().unwrap();
        let config = ShellConfig::default().with_overrides(Overrides {
            log_file: Some(dir.path().join("shell.log")),
            event_log: Some(dir.path().join("events.log")),
            ..Overrides::default()
        });
        let telemetry = build_telemetry(&config).unwrap();
        let mut runner = CommandRunner::new(MemoryTree::new(), Session::new(false))
            .with_telemetry(telemetry);
        runner.run("create /a").unwrap();
        let log = fs::read_to_string(dir.path().join("shell.log")).unwrap();
        assert!(log.contains("\"keyword\":\"create\""));
        let events = fs::read_to_string(dir.path().join("events.log")).unwrap();
        assert!(events.contains("tree.mutation"));
    }
}
