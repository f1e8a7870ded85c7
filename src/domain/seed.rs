use std::fmt;

/// Seed handed to the external mutation engine.
///
/// Either a fixed literal or a generator invoked once per mutation, so a
/// caller can vary the seed across calls while keeping each individual
/// mutation reproducible.
pub enum Seed {
    /// Fixed seed value
    Literal(String),
    /// Deterministic generator resolved at mutation time
    Generator(Box<dyn Fn() -> String + Send + Sync>),
}

impl Seed {
    /// Create a literal seed.
    pub fn literal(value: impl Into<String>) -> Self {
        Seed::Literal(value.into())
    }

    /// Create a generator seed.
    pub fn generator<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Seed::Generator(Box::new(f))
    }

    /// Resolve the seed to a concrete value.
    pub fn resolve(&self) -> String {
        match self {
            Seed::Literal(value) => value.clone(),
            Seed::Generator(f) => f(),
        }
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Seed::Literal(_))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Seed::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Literal(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed::Literal(value)
    }
}
