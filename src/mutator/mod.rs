pub mod radamsa;

pub use radamsa::RadamsaMutator;

use std::io;
use thiserror::Error;

use crate::domain::Seed;

/// Errors from the mutation boundary.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("mutation engine IO error: {0}")]
    Io(#[from] io::Error),

    #[error("mutation engine exited with {status}")]
    Failed { status: std::process::ExitStatus },
}

/// External mutation engine: a seedable, synchronous transform.
///
/// The gate treats the transform as opaque. Implementations own their seed
/// semantics and may reject seeds they cannot use.
pub trait MutationEngine {
    /// Set the seed used for subsequent mutations.
    fn set_seed(&mut self, seed: Seed) -> Result<(), MutationError>;

    /// Transform a payload.
    fn mutate(&mut self, data: &[u8]) -> Result<Vec<u8>, MutationError>;
}
