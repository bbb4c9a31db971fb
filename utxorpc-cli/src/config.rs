use anyhow::{Context, Result};
use serde::Deserialize;
use utxorpc_logger::LogConfig;
use utxorpc_sdk::ClientOptions;

/// Node used when neither the file, the environment nor the flags name one.
pub const DEFAULT_NODE_URI: &str = "http://localhost:50051";

/// Prefix of the environment variables read on top of the file, e.g. `U5C__NODE__URI`.
pub const ENV_PREFIX: &str = "U5C";

/// The top-level configuration for the `u5c` command line client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliConfig {
    pub node: ClientOptions,
    #[serde(default)]
    pub log: LogConfig,
}

impl CliConfig {
    /// Applies `--uri` and `--header` flags, which win over every other source.
    pub fn apply_overrides(&mut self, uri: Option<&str>, headers: &[(String, String)]) {
        if let Some(uri) = uri {
            self.node.uri = uri.to_string();
        }
        for (key, value) in headers {
            self.node.headers.insert(key.clone(), value.clone());
        }
    }
}

/// Loads the configuration from an optional TOML file layered under `U5C__*` variables.
///
/// Command output is logged, so the defaults favour one compact line per event.
pub fn load_config(path: Option<&str>) -> Result<CliConfig> {
    let mut builder = config::Config::builder()
        .set_default("node.uri", DEFAULT_NODE_URI)?
        .set_default("log.format", "compact")?;
    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path));
    }
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

    let settings: CliConfig = builder
        .build()
        .context(format!(
            "Failed to build configuration from '{}'",
            path.unwrap_or("<defaults>")
        ))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}
