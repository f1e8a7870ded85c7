pub mod engine;
pub mod registry;

pub use engine::DecisionEngine;
pub use registry::{FlagRegistry, RegistryError};
