use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error for a flag kind string that names no known kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown flag kind: {0}")]
pub struct UnknownKindError(pub String);

/// Kind of a registered flag.
///
/// The kind fully determines the type a configuration source must decode to
/// for that flag (see [`ValueKind`]). The set is closed: evaluation matches
/// exhaustively over it, so a new kind cannot be added without the compiler
/// pointing at every dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    /// On/off veto: a false value suppresses fuzzing for the data key
    Boolean,
    /// Suppresses fuzzing when the payload contains a configured substring
    SkipSubstring,
    /// Suppresses fuzzing for the first N evaluations of the data key
    SkipFirstN,
}

impl FlagKind {
    /// The decode type a configuration source must produce for this kind.
    #[inline]
    pub fn value_kind(&self) -> ValueKind {
        match self {
            FlagKind::Boolean => ValueKind::Boolean,
            FlagKind::SkipSubstring => ValueKind::String,
            FlagKind::SkipFirstN => ValueKind::Integer,
        }
    }

    /// Canonical name, as used in configuration source names.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::Boolean => "BOOLEAN",
            FlagKind::SkipSubstring => "SKIP_SUBSTRING",
            FlagKind::SkipFirstN => "SKIP_FIRST_N",
        }
    }
}

impl std::str::FromStr for FlagKind {
    type Err = UnknownKindError;

    /// Parse from the canonical name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BOOLEAN" => Ok(FlagKind::Boolean),
            "SKIP_SUBSTRING" => Ok(FlagKind::SkipSubstring),
            "SKIP_FIRST_N" => Ok(FlagKind::SkipFirstN),
            other => Err(UnknownKindError(other.to_string())),
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode type expected from a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    String,
    Integer,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed default value supplied at flag registration.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
    Count(i64),
}

impl FlagValue {
    /// The decode type this value corresponds to.
    #[inline]
    pub fn value_kind(&self) -> ValueKind {
        match self {
            FlagValue::Bool(_) => ValueKind::Boolean,
            FlagValue::Text(_) => ValueKind::String,
            FlagValue::Count(_) => ValueKind::Integer,
        }
    }
}

impl From<bool> for FlagValue {
    fn from(v: bool) -> Self {
        FlagValue::Bool(v)
    }
}

impl From<&str> for FlagValue {
    fn from(v: &str) -> Self {
        FlagValue::Text(v.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(v: String) -> Self {
        FlagValue::Text(v)
    }
}

impl From<i64> for FlagValue {
    fn from(v: i64) -> Self {
        FlagValue::Count(v)
    }
}

/// Kind-specific state of a flag.
///
/// Kind and default are fused in one sum type so a registered flag cannot
/// carry a default of the wrong type. Only `SkipFirstN` carries mutable
/// state: the number of evaluations seen so far, advanced by exactly one on
/// every evaluation of the flag for its data key.
#[derive(Debug)]
pub enum FlagRule {
    Boolean { default: bool },
    SkipSubstring { default: String },
    SkipFirstN { default: i64, seen: Mutex<i64> },
}

impl FlagRule {
    #[inline]
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagRule::Boolean { .. } => FlagKind::Boolean,
            FlagRule::SkipSubstring { .. } => FlagKind::SkipSubstring,
            FlagRule::SkipFirstN { .. } => FlagKind::SkipFirstN,
        }
    }
}

/// A registered flag: a conditional policy scoped to one data key.
///
/// Immutable after registration, except for the evaluation counter inside
/// [`FlagRule::SkipFirstN`].
#[derive(Debug)]
pub struct Flag {
    /// Normalized (uppercase) data key this flag is scoped to
    pub data_key: String,

    /// Configuration source name consulted for the flag's current value
    pub source_name: String,

    pub(crate) rule: FlagRule,
}

impl Flag {
    #[inline]
    pub fn kind(&self) -> FlagKind {
        self.rule.kind()
    }

    /// How many times a skip-first flag has been evaluated. `None` for the
    /// other kinds, which keep no state.
    pub fn times_evaluated(&self) -> Option<i64> {
        match &self.rule {
            FlagRule::SkipFirstN { seen, .. } => Some(*seen.lock()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_value_kinds() {
        assert_eq!(FlagKind::Boolean.value_kind(), ValueKind::Boolean);
        assert_eq!(FlagKind::SkipSubstring.value_kind(), ValueKind::String);
        assert_eq!(FlagKind::SkipFirstN.value_kind(), ValueKind::Integer);
    }

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!("boolean".parse::<FlagKind>().unwrap(), FlagKind::Boolean);
        assert_eq!(
            " skip_substring ".parse::<FlagKind>().unwrap(),
            FlagKind::SkipSubstring
        );
        assert_eq!(
            "SKIP_FIRST_N".parse::<FlagKind>().unwrap(),
            FlagKind::SkipFirstN
        );
    }

    #[test]
    fn test_kind_parse_unknown() {
        let err = "skip_sometimes".parse::<FlagKind>().unwrap_err();
        assert_eq!(err, UnknownKindError("SKIP_SOMETIMES".to_string()));
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&FlagKind::SkipFirstN).unwrap();
        assert_eq!(json, "\"SKIP_FIRST_N\"");

        let parsed: FlagKind = serde_json::from_str("\"SKIP_SUBSTRING\"").unwrap();
        assert_eq!(parsed, FlagKind::SkipSubstring);
    }

    #[test]
    fn test_flag_value_conversions() {
        assert_eq!(FlagValue::from(true), FlagValue::Bool(true));
        assert_eq!(FlagValue::from("DOG"), FlagValue::Text("DOG".to_string()));
        assert_eq!(FlagValue::from(5i64), FlagValue::Count(5));
        assert_eq!(FlagValue::from(5i64).value_kind(), ValueKind::Integer);
    }

    #[test]
    fn test_times_evaluated_only_for_skip_first() {
        let boolean = Flag {
            data_key: "ANIMAL".to_string(),
            source_name: "ANIMAL".to_string(),
            rule: FlagRule::Boolean { default: false },
        };
        assert_eq!(boolean.times_evaluated(), None);

        let skip_first = Flag {
            data_key: "ANIMAL".to_string(),
            source_name: "ANIMAL_SKIP_FIRST_N".to_string(),
            rule: FlagRule::SkipFirstN {
                default: 5,
                seen: Mutex::new(0),
            },
        };
        assert_eq!(skip_first.times_evaluated(), Some(0));
    }
}
