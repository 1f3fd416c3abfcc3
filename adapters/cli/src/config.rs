use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings read from the optional TOML configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Email of the local player.
    pub(crate) email: Option<String>,
    /// Tracing filter directives, in `RUST_LOG` syntax.
    pub(crate) log_filter: Option<String>,
}

impl CliConfig {
    /// Reads the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml contents")
    }

    /// Replaces file values with the ones given on the command line.
    #[must_use]
    pub(crate) fn overridden_by(self, email: Option<String>, log_filter: Option<String>) -> Self {
        Self {
            email: email.or(self.email),
            log_filter: log_filter.or(self.log_filter),
        }
    }
}
