pub mod flag;
pub mod seed;

pub use flag::{Flag, FlagKind, FlagRule, FlagValue, UnknownKindError, ValueKind};
pub use seed::Seed;
