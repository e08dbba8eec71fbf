use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PolicyConfiguration;
use crate::error::PolicyViolation;

/// A command token plus the path tokens extracted from its arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub command: String,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            paths: Vec::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a gate check, in a form suitable for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl GateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            kind: None,
            reason: None,
            command: None,
            path: None,
        }
    }

    pub fn deny(violation: &PolicyViolation) -> Self {
        let (command, path) = match violation {
            PolicyViolation::CommandRestricted { command } => (Some(command.clone()), None),
            PolicyViolation::PathRestricted { path } => (None, Some(path.clone())),
        };
        Self {
            allowed: false,
            kind: Some(violation.kind().to_string()),
            reason: Some(violation.to_string()),
            command,
            path,
        }
    }
}

impl From<&Result<(), PolicyViolation>> for GateDecision {
    fn from(result: &Result<(), PolicyViolation>) -> Self {
        match result {
            Ok(()) => GateDecision::allow(),
            Err(violation) => GateDecision::deny(violation),
        }
    }
}

/// Runs the command check, then every path check, stopping at the first
/// rejection.
#[derive(Debug, Clone)]
pub struct CommandGate {
    policy: Arc<PolicyConfiguration>,
    working_directory: PathBuf,
}

impl CommandGate {
    pub fn new(policy: impl Into<Arc<PolicyConfiguration>>) -> Self {
        Self {
            policy: policy.into(),
            working_directory: PathBuf::from("."),
        }
    }

    /// Working directory reported alongside path checks. Relative tokens are
    /// not resolved against it and are never restricted.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    pub fn policy(&self) -> &PolicyConfiguration {
        &self.policy
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn validate_command(&self, name: &str) -> Result<(), PolicyViolation> {
        self.policy.validate_command(name)
    }

    pub fn is_restricted_path(&self, path: impl AsRef<Path>) -> bool {
        self.policy.is_restricted_path(path, &self.working_directory)
    }

    /// Check a whole request.
    pub fn check(&self, request: &ExecutionRequest) -> Result<(), PolicyViolation> {
        if let Err(violation) = self.validate_command(&request.command) {
            warn!(command = %request.command, "command rejected by policy");
            return Err(violation);
        }

        for path in &request.paths {
            if self.is_restricted_path(path) {
                warn!(command = %request.command, path = %path, "path rejected by policy");
                return Err(PolicyViolation::PathRestricted { path: path.clone() });
            }
        }

        debug!(
            command = %request.command,
            paths = request.paths.len(),
            "request allowed"
        );
        Ok(())
    }

    /// Like [`check`](Self::check) but returns a serializable decision.
    pub fn decide(&self, request: &ExecutionRequest) -> GateDecision {
        GateDecision::from(&self.check(request))
    }
}
