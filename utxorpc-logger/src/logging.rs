//! Process-wide tracing setup shared by the binaries in this workspace.

use anyhow::Result;
use serde::Deserialize;
use std::{fs::File, str::FromStr, sync::Arc};
use tracing::Level;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{self, writer::BoxMakeWriter},
    prelude::*,
    Layer, Registry,
};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
    /// One line per event, suited to streaming command output.
    Compact,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
        }
    }
}

impl LogConfig {
    /// The configured level; unknown names fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_level(Level::from_str(&self.level).unwrap_or(Level::INFO))
    }

    /// The configured level as the default directive, refined by `RUST_LOG` when set.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level_filter().into())
            .from_env_lossy()
    }

    fn make_writer(&self) -> Result<BoxMakeWriter> {
        Ok(match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => {
                let file_path = self.file_path.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("Log output is 'file' but 'file-path' is not specified")
                })?;
                BoxMakeWriter::new(Arc::new(File::create(file_path)?))
            }
        })
    }
}

/// Installs the global subscriber described by `config`.
///
/// Fails if the log file cannot be created or a global subscriber is already set.
pub fn init(config: &LogConfig) -> Result<()> {
    let writer = config.make_writer()?;
    let layer = fmt::layer().with_writer(writer);
    let layer = match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Plain => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().with_target(false).boxed(),
    };

    Registry::default()
        .with(layer)
        .with(config.env_filter())
        .try_init()?;
    Ok(())
}
