use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use shared_logging::LogLevel;

/// Settings read from the TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Interactive behaviour.
    pub shell: ShellSettings,
    /// JSON-lines session log.
    pub logging: LoggingSettings,
    /// Audit event log.
    pub events: EventSettings,
}

/// `[shell]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSettings {
    /// Start with writes disabled.
    pub read_only: bool,
    /// Answer assumed when the "Quit?" prompt is interrupted.
    pub confirm_quit_default: bool,
    /// Print the server summary before the first prompt.
    pub print_banner: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            read_only: true,
            confirm_quit_default: true,
            print_banner: true,
        }
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Log file; logging is off when unset.
    pub path: Option<PathBuf>,
    /// Minimum level, `info` when unset.
    pub level: Option<String>,
}

/// `[events]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventSettings {
    /// Audit file; events are off when unset.
    pub path: Option<PathBuf>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--write`.
    pub write: bool,
    /// `--log-file`.
    pub log_file: Option<PathBuf>,
    /// `--log-level`.
    pub log_level: Option<String>,
    /// `--event-log`.
    pub event_log: Option<PathBuf>,
}

impl ShellConfig {
    /// Loads configuration from a TOML file. Relative paths are resolved against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading shell config {}", path.display()))?;
        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&raw, &source_dir).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses a TOML document whose relative paths are relative to `source_dir`.
    pub fn parse(raw: &str, source_dir: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.log_level()?;
        for path in [&mut config.logging.path, &mut config.events.path]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = source_dir.join(&*path);
            }
        }
        Ok(config)
    }

    /// Applies command-line values on top of the file.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if overrides.write {
            self.shell.read_only = false;
        }
        if overrides.log_file.is_some() {
            self.logging.path = overrides.log_file;
        }
        if overrides.log_level.is_some() {
            self.logging.level = overrides.log_level;
        }
        if overrides.event_log.is_some() {
            self.events.path = overrides.event_log;
        }
        self
    }

    /// Minimum log level.
    pub fn log_level(&self) -> Result<LogLevel> {
        self.logging
            .level
            .as_deref()
            .map_or(Ok(LogLevel::Info), str::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ShellConfig::parse("", Path::new(".")).unwrap();
        assert_eq!(config, ShellConfig::default());
        assert!(config.shell.read_only);
        assert!(config.shell.confirm_quit_default);
        assert_eq!(config.log_level().unwrap(), LogLevel::Info);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("treesh.toml");
        fs::write(
            &path,
            r#"
[shell]
read_only = false
print_banner = false

[logging]
path = "logs/shell.log"
level = "warn"

[events]
path = "/var/log/treesh/events.log"
"#,
        )
        .unwrap();
        let config = ShellConfig::load(&path).unwrap();
        assert!(!config.shell.read_only);
        assert!(!config.shell.print_banner);
        assert!(config.shell.confirm_quit_default);
        assert_eq!(config.logging.path, Some(dir.path().join("logs/shell.log")));
        assert_eq!(config.log_level().unwrap(), LogLevel::Warn);
        assert_eq!(
            config.events.path,
            Some(PathBuf::from("/var/log/treesh/events.log"))
        );
    }

    #[test]
    fn rejects_unknown_levels_and_keys() {
        let err = ShellConfig::parse("[logging]\nlevel = \"loud\"", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("loud"));
        assert!(ShellConfig::parse("[shell]\nreadonly = true", Path::new(".")).is_err());
    }

    #[test]
    fn command_line_wins() {
        let config = ShellConfig::parse("[logging]\nlevel = \"error\"", Path::new("."))
            .unwrap()
            .with_overrides(Overrides {
                write: true,
                log_level: Some("debug".into()),
                ..Overrides::default()
            });
        assert!(!config.shell.read_only);
        assert_eq!(config.log_level().unwrap(), LogLevel::Debug);
        assert_eq!(config.logging.path, None);
    }
}
