//! Free-text justification attached to cancellations and deletions.

use super::ValidationFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trimmed reason text that met a minimum length when it was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reason(String);

impl Reason {
    /// Validates a reason against a minimum character count.
    ///
    /// Characters are counted after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationFailure::ReasonTooShort`] when the trimmed text has
    /// fewer than `min_chars` characters.
    pub fn parse(
        value: impl AsRef<str>,
        field: &'static str,
        min_chars: usize,
    ) -> Result<Self, ValidationFailure> {
        let trimmed = value.as_ref().trim();
        let actual = trimmed.chars().count();
        if actual < min_chars {
            return Err(ValidationFailure::ReasonTooShort {
                field,
                min: min_chars,
                actual,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Wraps a previously accepted reason loaded from storage.
    #[must_use]
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the reason text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Reason {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
