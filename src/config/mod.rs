mod policy;
mod project;

pub use policy::{Platform, PolicyConfiguration, PolicyConfigurationBuilder, PolicyOverrides};
pub use project::{
    ENV_ALLOWED_COMMANDS, ENV_RESTRICTED_COMMANDS, ENV_RESTRICTED_DIRECTORIES,
    PROJECT_CONFIG_FILE, ProjectConfig, env_overrides, global_config_path, non_empty_list,
    split_list,
};
