mod command;
mod defaults;
mod path;

pub use command::{CommandSet, normalize_command, validate_command};
pub use defaults::{default_restricted_commands, default_restricted_roots};
pub use path::{RestrictedRoot, is_restricted_path};
