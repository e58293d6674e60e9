//! Customer name value object.
//!
//! Compared by value; a `CustomerName` that exists is always well-formed.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const MAX_LEN: usize = 128;

/// Validated customer name.
///
/// Rules: 1–128 characters of letters, digits, `_`, `+` or single spaces;
/// no leading/trailing whitespace and no run of two spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerName(String);

impl CustomerName {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();

        if raw.is_empty() || raw.chars().count() > MAX_LEN {
            return Err(DomainError::validation(
                "customer name must be 1-128 characters",
            ));
        }
        if raw.starts_with(' ') || raw.ends_with(' ') {
            return Err(DomainError::validation(
                "customer name must not start or end with whitespace",
            ));
        }
        if raw.contains("  ") {
            return Err(DomainError::validation(
                "customer name must not contain consecutive spaces",
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '+' || c == ' ')
        {
            return Err(DomainError::validation(
                "customer name contains unsupported characters",
            ));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CustomerName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CustomerName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CustomerName> for String {
    fn from(value: CustomerName) -> Self {
        value.0
    }
}
