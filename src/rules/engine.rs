use tracing::{debug, trace};

use crate::config::{ConfigError, ConfigResolver, ConfigSource, GateOptions};
use crate::domain::FlagRule;
use crate::rules::registry::FlagRegistry;

/// Byte-wise substring search, so binary payloads behave like text.
///
/// An empty needle matches everything, the same as a zero-offset index hit.
fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Evaluates the layered fuzzing policy for one payload.
///
/// Owns the flag registry and the configuration resolver; the facade holds
/// one engine per gate, so independently configured gates can coexist in a
/// process.
#[derive(Debug)]
pub struct DecisionEngine<S> {
    resolver: ConfigResolver<S>,
    registry: FlagRegistry,
    options: GateOptions,
}

impl<S: ConfigSource> DecisionEngine<S> {
    pub fn new(options: GateOptions, source: S) -> Self {
        let resolver = ConfigResolver::new(source, &options.config_prefix);
        DecisionEngine {
            resolver,
            registry: FlagRegistry::new(),
            options,
        }
    }

    pub fn resolver(&self) -> &ConfigResolver<S> {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut ConfigResolver<S> {
        &mut self.resolver
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FlagRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Decide whether a payload scoped by `data_key` should be fuzzed.
    ///
    /// The global enable switch is consulted first; when it resolves (or
    /// defaults) to false, no flag is evaluated and no counter advances.
    /// Otherwise every flag registered for the key is applied in
    /// registration order. The verdict only ever moves from true to false;
    /// a later flag cannot clear an earlier veto. Skip-first counters
    /// advance on every evaluation of their flag regardless of the running
    /// verdict, so the skip window is consumed exactly once per decision.
    pub fn decide(&self, data_key: Option<&str>, payload: &[u8]) -> Result<bool, ConfigError> {
        let enabled = self
            .resolver
            .boolean(&self.options.enable_flag)?
            .unwrap_or(self.options.enable_by_default);
        if !enabled {
            trace!("gate disabled, skipping flag evaluation");
            return Ok(false);
        }

        // Unscoped data is governed by the global switch alone.
        let Some(raw_key) = data_key else {
            return Ok(true);
        };
        let key = FlagRegistry::normalize_key(raw_key);

        let mut verdict = true;
        for flag in self.registry.flags_for(&key) {
            let vetoed = match &flag.rule {
                FlagRule::Boolean { default } => {
                    let value = self
                        .resolver
                        .boolean(&flag.source_name)?
                        .unwrap_or(*default);
                    !value
                }
                FlagRule::SkipSubstring { default } => {
                    let needle = self
                        .resolver
                        .string(&flag.source_name)
                        .unwrap_or_else(|| default.clone());
                    contains_subslice(payload, needle.as_bytes())
                }
                FlagRule::SkipFirstN { default, seen } => {
                    let threshold = self
                        .resolver
                        .integer(&flag.source_name)?
                        .unwrap_or(*default);
                    let mut count = seen.lock();
                    let within_window = *count < threshold;
                    *count += 1;
                    within_window
                }
            };

            if vetoed {
                debug!(
                    data_key = %key,
                    source = %flag.source_name,
                    kind = %flag.kind(),
                    "flag vetoed fuzzing"
                );
                verdict = false;
            }
        }

        Ok(verdict)
    }
}
