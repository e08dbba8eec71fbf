use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Platform, PolicyConfiguration, PolicyOverrides};
use crate::error::GateError;

/// Project configuration file, looked up in the current directory.
pub const PROJECT_CONFIG_FILE: &str = ".command-gate.toml";

pub const ENV_ALLOWED_COMMANDS: &str = "COMMAND_GATE_ALLOWED_COMMANDS";
pub const ENV_RESTRICTED_COMMANDS: &str = "COMMAND_GATE_RESTRICTED_COMMANDS";
pub const ENV_RESTRICTED_DIRECTORIES: &str = "COMMAND_GATE_RESTRICTED_DIRECTORIES";

/// Project-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Platform whose defaults apply (defaults to the host platform)
    #[serde(default)]
    pub platform: Option<Platform>,

    /// Policy overrides
    #[serde(default)]
    pub policy: PolicyOverrides,
}

impl ProjectConfig {
    /// Load configuration with precedence: env > project file > global file > defaults.
    pub fn load() -> Result<Self> {
        Self::load_layers(
            global_config_path().as_deref(),
            Path::new(PROJECT_CONFIG_FILE),
            |key| std::env::var(key).ok(),
        )
    }

    /// Load a single TOML file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Stack the global file, the project file and the environment. Missing
    /// files are skipped; unreadable or malformed ones are errors.
    pub fn load_layers(
        global: Option<&Path>,
        project: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = ProjectConfig::default();

        for path in global.into_iter().chain(std::iter::once(project)) {
            if path.exists() {
                debug!(path = %path.display(), "loading config layer");
                config.merge(Self::load_file(path)?);
            }
        }

        config.policy.merge(env_overrides(env));
        Ok(config)
    }

    /// Overlay `higher` on top of `self`.
    pub fn merge(&mut self, higher: ProjectConfig) {
        if higher.platform.is_some() {
            self.platform = higher.platform;
        }
        self.policy.merge(higher.policy);
    }

    /// Build the policy this configuration describes.
    pub fn policy_configuration(&self) -> Result<PolicyConfiguration, GateError> {
        let platform = self.platform.unwrap_or_else(Platform::current);
        PolicyConfiguration::from_overrides(&self.policy, platform)
    }
}

/// `$HOME/.command-gate/config.toml`, if `HOME` is set.
pub fn global_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".command-gate").join("config.toml"))
}

/// Read the policy overrides carried by environment variables. A variable
/// that is set but holds no entries counts as unset.
pub fn env_overrides(env: impl Fn(&str) -> Option<String>) -> PolicyOverrides {
    let list = |key: &str| env(key).and_then(|v| non_empty_list(&v));
    PolicyOverrides {
        allowed_commands: list(ENV_ALLOWED_COMMANDS),
        restricted_commands: list(ENV_RESTRICTED_COMMANDS),
        restricted_directories: list(ENV_RESTRICTED_DIRECTORIES),
    }
}

/// [`split_list`], or `None` when nothing is left after dropping blanks.
pub fn non_empty_list(value: &str) -> Option<Vec<String>> {
    Some(split_list(value)).filter(|list| !list.is_empty())
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
