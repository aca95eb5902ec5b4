//! Key predicates for narrowing which keys a hook sees.
//!
//! Each constructor does its preparation once (a regex is compiled when
//! the filter is built, a key set is hashed once), so matching during
//! dispatch is a pure function of the key.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use kvhub_core::result::AppResult;

/// A predicate over key strings.
#[derive(Clone)]
pub enum KeyFilter {
    /// Keys starting with the given prefix.
    Prefix(String),
    /// Keys ending with the given suffix.
    Suffix(String),
    /// Keys that are members of the given set.
    OneOf(Arc<HashSet<String>>),
    /// Keys matched by a compiled regular expression.
    Regex(Regex),
    /// Keys accepted by an arbitrary predicate.
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl KeyFilter {
    /// Matches keys starting with `prefix` (e.g. `"user:"`).
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Matches keys ending with `suffix`.
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::Suffix(suffix.into())
    }

    /// Matches exactly the given keys.
    pub fn one_of<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(Arc::new(keys.into_iter().map(Into::into).collect()))
    }

    /// Matches keys against a regular expression, compiled here.
    ///
    /// Fails with a validation error if `pattern` does not compile.
    pub fn regex(pattern: &str) -> AppResult<Self> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    /// Matches keys accepted by `predicate`.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Returns whether `key` is accepted.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => key.ends_with(suffix.as_str()),
            Self::OneOf(keys) => keys.contains(key),
            Self::Regex(re) => re.is_match(key),
            Self::Custom(predicate) => predicate(key),
        }
    }
}

impl fmt::Debug for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Suffix(suffix) => f.debug_tuple("Suffix").field(suffix).finish(),
            Self::OneOf(keys) => f.debug_tuple("OneOf").field(&keys.len()).finish(),
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
