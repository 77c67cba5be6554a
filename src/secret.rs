//! A newtype for wifi passwords that never shows up in logs.
//!
//! Formatting a [`Secret`] with `Debug` or `Display` always prints `***`.
//! The only way to reach the inner value is [`Secret::expose`], which is
//! reserved for building the command line actually handed to the executor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder printed instead of a secret value.
pub const REDACTED: &str = "***";

/// A wrapper around `String` whose value is redacted in `Debug` and `Display`.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new `Secret` from a `String`.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the inner value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Return `true` if the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({REDACTED})")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl FromStr for Secret {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}
