/// A request rejected by the gate.
///
/// Rejections are ordinary classification outcomes. The caller decides how to
/// surface them to the requesting agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("command '{command}' is restricted by policy")]
    CommandRestricted { command: String },

    #[error("access to path '{path}' is restricted by policy")]
    PathRestricted { path: String },
}

impl PolicyViolation {
    /// Short machine-readable name of the violation kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyViolation::CommandRestricted { .. } => "command_restricted",
            PolicyViolation::PathRestricted { .. } => "path_restricted",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_violation_names_the_command() {
        let v = PolicyViolation::CommandRestricted {
            command: "Stop-Service".to_string(),
        };
        assert_eq!(v.to_string(), "command 'Stop-Service' is restricted by policy");
        assert_eq!(v.kind(), "command_restricted");
    }

    #[test]
    fn path_violation_names_the_path() {
        let v = PolicyViolation::PathRestricted {
            path: r"C:\Windows".to_string(),
        };
        assert_eq!(v.to_string(), r"access to path 'C:\Windows' is restricted by policy");
        assert_eq!(v.kind(), "path_restricted");
    }

    #[test]
    fn config_error_carries_message() {
        let err = GateError::Config("invalid restricted root 'x'".to_string());
        assert_eq!(err.to_string(), "configuration error: invalid restricted root 'x'");
    }
}
