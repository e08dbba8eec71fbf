use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GateError, PolicyViolation};
use crate::policy::{
    self, CommandSet, RestrictedRoot, default_restricted_commands, default_restricted_roots,
};

/// Host flavour used to pick the built-in deny set and restricted roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Unix => write!(f, "unix"),
        }
    }
}

impl FromStr for Platform {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "unix" | "linux" | "macos" => Ok(Platform::Unix),
            other => Err(GateError::Config(format!("unknown platform: {}", other))),
        }
    }
}

/// Deployment-supplied policy overrides
///
/// Every field is optional so that configuration layers can be stacked: a
/// field set in a higher layer replaces the same field from a lower one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    /// Commands that are always permitted, even if the deny-list names them
    #[serde(default)]
    pub allowed_commands: Option<Vec<String>>,

    /// Replacement for the built-in deny-list
    #[serde(default)]
    pub restricted_commands: Option<Vec<String>>,

    /// Roots added to the built-in restricted directories
    #[serde(default)]
    pub restricted_directories: Option<Vec<String>>,
}

impl PolicyOverrides {
    /// Overlay `higher` on top of `self`.
    pub fn merge(&mut self, higher: PolicyOverrides) {
        if higher.allowed_commands.is_some() {
            self.allowed_commands = higher.allowed_commands;
        }
        if higher.restricted_commands.is_some() {
            self.restricted_commands = higher.restricted_commands;
        }
        if higher.restricted_directories.is_some() {
            self.restricted_directories = higher.restricted_directories;
        }
    }
}

/// The active policy, built once at startup and read-only afterwards.
///
/// Holds the allow-list override, the effective deny-list and the ordered
/// restricted roots. Share it behind an `Arc` to evaluate from many threads.
#[derive(Debug, Clone)]
pub struct PolicyConfiguration {
    platform: Platform,
    allowed_commands: CommandSet,
    restricted_commands: CommandSet,
    custom_deny_list: bool,
    restricted_roots: Vec<RestrictedRoot>,
}

impl PolicyConfiguration {
    pub fn builder() -> PolicyConfigurationBuilder {
        PolicyConfigurationBuilder::new()
    }

    /// Built-in defaults for `platform` with no overrides.
    pub fn defaults(platform: Platform) -> Self {
        let roots = default_restricted_roots(platform)
            .into_iter()
            .filter_map(RestrictedRoot::parse)
            .collect();

        Self {
            platform,
            allowed_commands: CommandSet::new(),
            restricted_commands: default_restricted_commands(platform).into_iter().collect(),
            custom_deny_list: false,
            restricted_roots: roots,
        }
    }

    /// Merge `overrides` into the defaults for `platform`.
    ///
    /// A supplied deny-list replaces the default one, the allow-list is
    /// layered on top, and extra directories are added to the built-in roots.
    pub fn from_overrides(
        overrides: &PolicyOverrides,
        platform: Platform,
    ) -> Result<Self, GateError> {
        let mut builder = Self::builder().platform(platform);

        if let Some(allowed) = &overrides.allowed_commands {
            builder = builder.allowed_commands(allowed);
        }
        if let Some(restricted) = &overrides.restricted_commands {
            builder = builder.restricted_commands(restricted);
        }
        if let Some(directories) = &overrides.restricted_directories {
            builder = builder.add_restricted_roots(directories);
        }

        builder.build()
    }

    /// Check a command name against the allow-list and the deny-list.
    pub fn validate_command(&self, name: &str) -> Result<(), PolicyViolation> {
        policy::validate_command(name, &self.allowed_commands, &self.restricted_commands)
    }

    /// Whether `path` falls under a restricted root. Relative paths are
    /// reported as not restricted.
    pub fn is_restricted_path(&self, path: impl AsRef<Path>, working_directory: &Path) -> bool {
        policy::is_restricted_path(path, working_directory, &self.restricted_roots)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn allowed_commands(&self) -> &CommandSet {
        &self.allowed_commands
    }

    /// The deny-list in effect (built-in or replacement).
    pub fn restricted_commands(&self) -> &CommandSet {
        &self.restricted_commands
    }

    /// True when a deployment-supplied deny-list replaced the built-in one.
    pub fn has_custom_deny_list(&self) -> bool {
        self.custom_deny_list
    }

    pub fn restricted_roots(&self) -> &[RestrictedRoot] {
        &self.restricted_roots
    }
}

impl Default for PolicyConfiguration {
    fn default() -> Self {
        Self::defaults(Platform::current())
    }
}

/// Builder for [`PolicyConfiguration`].
///
/// # Example
///
/// ```
/// # use std::path::Path;
/// # use command_gate::PolicyConfiguration;
/// let policy = PolicyConfiguration::builder()
///     .restricted_roots([r"C:\Restricted", r"C:\Windows"])
///     .build()
///     .unwrap();
///
/// assert!(policy.is_restricted_path(r"C:\Restricted\secret.txt", Path::new(".")));
/// assert!(policy.validate_command("Stop-Service").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PolicyConfigurationBuilder {
    platform: Platform,
    allowed_commands: Vec<String>,
    restricted_commands: Option<Vec<String>>,
    replace_default_roots: bool,
    roots: Vec<String>,
}

impl PolicyConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
            allowed_commands: Vec::new(),
            restricted_commands: None,
            replace_default_roots: false,
            roots: Vec::new(),
        }
    }

    /// Select the platform whose defaults are used.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Commands that bypass the deny-list.
    pub fn allowed_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_commands = commands.into_iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Replace the built-in deny-list.
    pub fn restricted_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.restricted_commands =
            Some(commands.into_iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    /// Use exactly `roots`, dropping the built-in ones.
    pub fn restricted_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.replace_default_roots = true;
        self.roots = roots.into_iter().map(|r| r.as_ref().to_string()).collect();
        self
    }

    /// Add roots on top of whatever is already configured.
    pub fn add_restricted_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.roots
            .extend(roots.into_iter().map(|r| r.as_ref().to_string()));
        self
    }

    /// Build the configuration.
    ///
    /// Fails if a supplied root is neither an absolute path nor a drive
    /// prefix such as `Env:`.
    pub fn build(self) -> Result<PolicyConfiguration, GateError> {
        let mut roots: Vec<RestrictedRoot> = Vec::new();

        if !self.replace_default_roots {
            roots.extend(
                default_restricted_roots(self.platform)
                    .into_iter()
                    .filter_map(RestrictedRoot::parse),
            );
        }

        for raw in &self.roots {
            let root = RestrictedRoot::parse(raw).ok_or_else(|| {
                GateError::Config(format!(
                    "invalid restricted root '{}': expected an absolute path or a drive prefix such as Env:",
                    raw
                ))
            })?;
            if !roots.iter().any(|r| r.same_location(&root)) {
                roots.push(root);
            }
        }

        let custom_deny_list = self.restricted_commands.is_some();
        let restricted_commands: CommandSet = match self.restricted_commands {
            Some(commands) => commands.iter().collect(),
            None => default_restricted_commands(self.platform).into_iter().collect(),
        };
        let allowed_commands: CommandSet = self.allowed_commands.iter().collect();

        debug!(
            platform = %self.platform,
            allowed = allowed_commands.len(),
            restricted = restricted_commands.len(),
            custom_deny_list,
            roots = roots.len(),
            "built policy configuration"
        );

        Ok(PolicyConfiguration {
            platform: self.platform,
            allowed_commands,
            restricted_commands,
            custom_deny_list,
            restricted_roots: roots,
        })
    }
}

impl Default for PolicyConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
