pub mod config;
pub mod error;
pub mod gate;
pub mod policy;

pub use config::{
    Platform, PolicyConfiguration, PolicyConfigurationBuilder, PolicyOverrides, ProjectConfig,
};
pub use error::{GateError, PolicyViolation};
pub use gate::{CommandGate, ExecutionRequest, GateDecision};
pub use policy::{CommandSet, RestrictedRoot};
