use ahash::AHashMap;
use parking_lot::Mutex;
use thiserror::Error;

use crate::domain::{Flag, FlagKind, FlagRule, FlagValue, UnknownKindError, ValueKind};

/// Errors that can occur during flag registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("flag data key is required")]
    MissingDataKey,

    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),

    #[error("flag {data_key} ({kind}) already registered")]
    Duplicate { data_key: String, kind: FlagKind },

    #[error("default for a {kind} flag must be a {expected} (got {actual})")]
    DefaultMismatch {
        kind: FlagKind,
        expected: ValueKind,
        actual: ValueKind,
    },
}

/// Registered flags, keyed by (data key, kind).
///
/// Registration order is preserved; evaluation iterates flags in the order
/// they were registered. All checks run before any state is touched, so a
/// failed registration leaves the registry exactly as it was.
#[derive(Debug, Default)]
pub struct FlagRegistry {
    flags: Vec<Flag>,
    index: AHashMap<(String, FlagKind), usize>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        FlagRegistry::default()
    }

    /// Canonical form of a data key, shared by registration and evaluation.
    pub(crate) fn normalize_key(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    /// Register a flag for a data key.
    ///
    /// The default value must match the type the kind decodes to. For
    /// [`FlagKind::SkipFirstN`] the evaluation counter starts at zero.
    pub fn register(
        &mut self,
        data_key: &str,
        kind: FlagKind,
        default: FlagValue,
    ) -> Result<&Flag, RegistryError> {
        let data_key = Self::normalize_key(data_key);
        if data_key.is_empty() {
            return Err(RegistryError::MissingDataKey);
        }

        let slot = (data_key.clone(), kind);
        if self.index.contains_key(&slot) {
            return Err(RegistryError::Duplicate { data_key, kind });
        }

        let rule = match (kind, default) {
            (FlagKind::Boolean, FlagValue::Bool(default)) => FlagRule::Boolean { default },
            (FlagKind::SkipSubstring, FlagValue::Text(default)) => {
                FlagRule::SkipSubstring { default }
            }
            (FlagKind::SkipFirstN, FlagValue::Count(default)) => FlagRule::SkipFirstN {
                default,
                seen: Mutex::new(0),
            },
            (kind, value) => {
                return Err(RegistryError::DefaultMismatch {
                    kind,
                    expected: kind.value_kind(),
                    actual: value.value_kind(),
                })
            }
        };

        // Boolean flags read the bare data key; the other kinds append their
        // kind name so several kinds can coexist on one key without
        // colliding in the configuration namespace.
        let source_name = match kind {
            FlagKind::Boolean => data_key.clone(),
            _ => format!("{}_{}", data_key, kind.as_str()),
        };

        let idx = self.flags.len();
        self.flags.push(Flag {
            data_key,
            source_name,
            rule,
        });
        self.index.insert(slot, idx);
        Ok(&self.flags[idx])
    }

    /// Register a flag with the kind given by its canonical name.
    pub fn register_named(
        &mut self,
        data_key: &str,
        kind: &str,
        default: FlagValue,
    ) -> Result<&Flag, RegistryError> {
        let kind: FlagKind = kind.parse()?;
        self.register(data_key, kind, default)
    }

    /// Flags registered for a data key, in registration order.
    pub fn flags_for<'a>(&'a self, data_key: &str) -> impl Iterator<Item = &'a Flag> {
        let key = Self::normalize_key(data_key);
        self.flags.iter().filter(move |flag| flag.data_key == key)
    }

    /// Look up one flag by data key and kind.
    pub fn get(&self, data_key: &str, kind: FlagKind) -> Option<&Flag> {
        let slot = (Self::normalize_key(data_key), kind);
        self.index.get(&slot).map(|&idx| &self.flags[idx])
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
