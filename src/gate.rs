use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{ConfigError, ConfigSource, EnvSource, GateOptions};
use crate::domain::{FlagKind, FlagValue, Seed};
use crate::mutator::{MutationEngine, MutationError, RadamsaMutator};
use crate::rules::{DecisionEngine, RegistryError};

/// Configuration name controlling the diagnostic echo.
const SHOW_IO_FLAG: &str = "SHOW_IO";

/// Configuration name redirecting the echo to the error level.
const SHOW_IO_STDERR_FLAG: &str = "SHOW_IO_STDERR";

/// Errors that can surface from an `evaluate` call.
#[derive(Error, Debug)]
pub enum GateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

/// The public entry point: maybe-fuzz a payload.
///
/// Each gate owns its own decision engine and mutation engine, so several
/// independently configured gates can run in one process (scope them apart
/// with [`set_config_prefix`](FuzzGate::set_config_prefix)).
#[derive(Debug)]
pub struct FuzzGate<S, M> {
    engine: DecisionEngine<S>,
    mutator: M,
}

impl FuzzGate<EnvSource, RadamsaMutator> {
    /// Gate over the process environment and the radamsa binary from PATH.
    pub fn from_env() -> Self {
        FuzzGate::new(
            GateOptions::default(),
            EnvSource::new(),
            RadamsaMutator::new(),
        )
    }
}

impl<S: ConfigSource, M: MutationEngine> FuzzGate<S, M> {
    pub fn new(options: GateOptions, source: S, mutator: M) -> Self {
        FuzzGate {
            engine: DecisionEngine::new(options, source),
            mutator,
        }
    }

    /// Replace the configuration namespace prefix for all subsequent
    /// lookups, the global switch included.
    pub fn set_config_prefix(&mut self, prefix: &str) {
        self.engine.resolver_mut().set_prefix(prefix);
    }

    /// Register a flag scoping the fuzzing decision for a data key.
    pub fn register_flag(
        &mut self,
        data_key: &str,
        kind: FlagKind,
        default: impl Into<FlagValue>,
    ) -> Result<(), RegistryError> {
        self.engine
            .registry_mut()
            .register(data_key, kind, default.into())
            .map(|_| ())
    }

    /// Set the seed of the mutation engine.
    pub fn set_seed(&mut self, seed: Seed) -> Result<(), MutationError> {
        self.mutator.set_seed(seed)
    }

    pub fn engine(&self) -> &DecisionEngine<S> {
        &self.engine
    }

    pub fn mutator(&self) -> &M {
        &self.mutator
    }

    /// Maybe fuzz a payload.
    ///
    /// When the policy decides against fuzzing, the input is returned
    /// byte-for-byte.
    pub fn evaluate(&mut self, data: &[u8], data_key: Option<&str>) -> Result<Vec<u8>, GateError> {
        self.echo_bytes("in", data)?;
        let output = if self.engine.decide(data_key, data)? {
            self.mutator.mutate(data)?
        } else {
            data.to_vec()
        };
        self.echo_bytes("out", &output)?;
        Ok(output)
    }

    /// Maybe fuzz a text payload.
    ///
    /// The pass-through path returns the input characters unchanged. A
    /// mutated payload is re-interpreted lossily, since the mutation engine
    /// is free to emit bytes that are not valid UTF-8.
    pub fn evaluate_str(&mut self, data: &str, data_key: Option<&str>) -> Result<String, GateError> {
        self.echo_text("in", data)?;
        let output = if self.engine.decide(data_key, data.as_bytes())? {
            let mutated = self.mutator.mutate(data.as_bytes())?;
            String::from_utf8_lossy(&mutated).into_owned()
        } else {
            data.to_string()
        };
        self.echo_text("out", &output)?;
        Ok(output)
    }

    /// Whether the echo is on, and if so whether it goes to the error level.
    ///
    /// A malformed echo switch is a configuration bug and propagates; the
    /// emission itself is an event and cannot fail the evaluation.
    fn echo_target(&self) -> Result<Option<bool>, ConfigError> {
        let resolver = self.engine.resolver();
        let show = resolver
            .boolean(SHOW_IO_FLAG)?
            .unwrap_or(self.engine.options().show_io_by_default);
        if !show {
            return Ok(None);
        }
        let to_stderr = resolver.boolean(SHOW_IO_STDERR_FLAG)?.unwrap_or(false);
        Ok(Some(to_stderr))
    }

    fn echo_bytes(&self, stage: &str, data: &[u8]) -> Result<(), ConfigError> {
        let Some(to_stderr) = self.echo_target()? else {
            return Ok(());
        };
        match std::str::from_utf8(data) {
            Ok(text) => emit(to_stderr, stage, text, false),
            Err(_) => emit(to_stderr, stage, &BASE64.encode(data), true),
        }
        Ok(())
    }

    fn echo_text(&self, stage: &str, data: &str) -> Result<(), ConfigError> {
        let Some(to_stderr) = self.echo_target()? else {
            return Ok(());
        };
        emit(to_stderr, stage, data, false);
        Ok(())
    }
}

fn emit(to_stderr: bool, stage: &str, payload: &str, encoded: bool) {
    if to_stderr {
        error!(stage, encoded, "{}", payload);
    } else {
        info!(stage, encoded, "{}", payload);
    }
}
