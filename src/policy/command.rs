use std::collections::HashSet;

use tracing::debug;

use crate::error::PolicyViolation;

/// Canonical form of a command name: trimmed and lowercased.
pub fn normalize_command(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A flat, case-insensitive set of command names. Aliases are separate
/// entries; nothing is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    names: HashSet<String>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str) -> bool {
        let normalized = normalize_command(name);
        if normalized.is_empty() {
            return false;
        }
        self.names.insert(normalized)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_command(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries in sorted order.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: AsRef<str>> FromIterator<S> for CommandSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = CommandSet::new();
        for name in iter {
            set.insert(name.as_ref());
        }
        set
    }
}

/// Classify `name`.
///
/// An entry in `allowed` always wins. Names outside `allowed` are still
/// checked against `restricted`, so a non-empty allow-list never turns the
/// gate into allow-only mode.
pub fn validate_command(
    name: &str,
    allowed: &CommandSet,
    restricted: &CommandSet,
) -> Result<(), PolicyViolation> {
    if allowed.contains(name) {
        debug!(command = name, "command explicitly allowed");
        return Ok(());
    }

    if restricted.contains(name) {
        return Err(PolicyViolation::CommandRestricted {
            command: name.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> CommandSet {
        names.iter().collect()
    }

    #[test]
    fn normalization_folds_case_and_trims() {
        assert_eq!(normalize_command("  Stop-Service "), "stop-service");
        assert_eq!(normalize_command("REG.EXE"), "reg.exe");
    }

    #[test]
    fn set_membership_is_case_insensitive() {
        let s = set(&["Stop-Service", "spsv"]);
        assert!(s.contains("stop-service"));
        assert!(s.contains("STOP-SERVICE"));
        assert!(s.contains("SpSv"));
        assert!(!s.contains("Stop-Servic"));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn set_ignores_blank_entries_and_duplicates() {
        let s = set(&["", "  ", "Start-Job", "start-job"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.sorted(), vec!["start-job"]);
    }

    #[test]
    fn denied_command_reports_original_spelling() {
        let err = validate_command("STOP-SERVICE", &CommandSet::new(), &set(&["Stop-Service"]))
            .unwrap_err();
        assert_eq!(
            err,
            PolicyViolation::CommandRestricted {
                command: "STOP-SERVICE".to_string()
            }
        );
    }

    #[test]
    fn unlisted_command_passes() {
        assert!(validate_command("Get-ChildItem", &CommandSet::new(), &set(&["Stop-Service"])).is_ok());
    }

    #[test]
    fn allow_list_overrides_deny_list() {
        let allowed = set(&["Stop-Service"]);
        let restricted = set(&["Stop-Service", "Start-Service"]);
        assert!(validate_command("stop-service", &allowed, &restricted).is_ok());
        assert!(validate_command("Start-Service", &allowed, &restricted).is_err());
    }

    #[test]
    fn allow_list_does_not_deny_unlisted_commands() {
        let allowed = set(&["Set-Content"]);
        let restricted = set(&["Stop-Service"]);
        assert!(validate_command("Get-Content", &allowed, &restricted).is_ok());
    }

    #[test]
    fn empty_deny_set_allows_everything() {
        assert!(validate_command("Stop-Service", &CommandSet::new(), &CommandSet::new()).is_ok());
    }
}
