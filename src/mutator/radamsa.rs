use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{MutationEngine, MutationError};
use crate::domain::Seed;

/// Mutation engine backed by the external `radamsa` fuzzer.
///
/// Payloads are piped through the subprocess. The seed, when set, is
/// forwarded as `--seed <n>`; radamsa seeds are numeric, so literal seeds
/// are validated when set and generator seeds when resolved at mutation
/// time.
#[derive(Debug)]
pub struct RadamsaMutator {
    program: PathBuf,
    seed: Option<Seed>,
}

impl RadamsaMutator {
    /// Use the `radamsa` binary from PATH.
    pub fn new() -> Self {
        RadamsaMutator {
            program: PathBuf::from("radamsa"),
            seed: None,
        }
    }

    /// Use a specific binary instead of the one on PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        RadamsaMutator {
            program: program.into(),
            seed: None,
        }
    }

    pub fn seed(&self) -> Option<&Seed> {
        self.seed.as_ref()
    }

    fn numeric_seed(value: &str) -> Result<u64, MutationError> {
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| MutationError::InvalidSeed(value.to_string()))
    }
}

impl Default for RadamsaMutator {
    fn default() -> Self {
        RadamsaMutator::new()
    }
}

impl MutationEngine for RadamsaMutator {
    fn set_seed(&mut self, seed: Seed) -> Result<(), MutationError> {
        // A literal can be checked now; generator output is only known per
        // mutation.
        if let Seed::Literal(value) = &seed {
            Self::numeric_seed(value)?;
        }
        self.seed = Some(seed);
        Ok(())
    }

    fn mutate(&mut self, data: &[u8]) -> Result<Vec<u8>, MutationError> {
        let mut command = Command::new(&self.program);
        if let Some(seed) = &self.seed {
            let value = seed.resolve();
            command
                .arg("--seed")
                .arg(Self::numeric_seed(&value)?.to_string());
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(MutationError::Failed {
                status: output.status,
            });
        }

        debug!(
            input_len = data.len(),
            output_len = output.stdout.len(),
            "mutation complete"
        );
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_seed_must_be_numeric() {
        let mut mutator = RadamsaMutator::new();
        assert!(mutator.set_seed(Seed::literal("42")).is_ok());
        assert!(mutator.seed().is_some());

        let err = mutator.set_seed(Seed::literal("pi")).unwrap_err();
        assert!(matches!(err, MutationError::InvalidSeed(value) if value == "pi"));
    }

    #[test]
    fn test_generator_seed_validated_at_mutation_time() {
        let mut mutator = RadamsaMutator::new();
        mutator
            .set_seed(Seed::generator(|| "not-a-number".to_string()))
            .unwrap();

        // Seed resolution fails before any subprocess is spawned.
        let err = mutator.mutate(b"payload").unwrap_err();
        assert!(matches!(err, MutationError::InvalidSeed(_)));
    }

    #[test]
    fn test_missing_binary_is_an_io_error() {
        let mut mutator = RadamsaMutator::with_program("/nonexistent/radamsa");
        let err = mutator.mutate(b"payload").unwrap_err();
        assert!(matches!(err, MutationError::Io(_)));
    }

    #[test]
    fn test_pipes_payload_through_subprocess() {
        // `cat` stands in for radamsa: same pipe contract, identity output.
        let mut mutator = RadamsaMutator::with_program("cat");
        let output = mutator.mutate(b"hello").unwrap();
        assert_eq!(output, b"hello");
    }
}
