pub mod config;
pub mod domain;
pub mod gate;
pub mod mutator;
pub mod rules;

pub use config::{ConfigError, ConfigResolver, ConfigSource, EnvSource, GateOptions, MemorySource};
pub use domain::{Flag, FlagKind, FlagValue, Seed};
pub use gate::{FuzzGate, GateError};
pub use mutator::{MutationEngine, MutationError, RadamsaMutator};
pub use rules::{DecisionEngine, FlagRegistry, RegistryError};
