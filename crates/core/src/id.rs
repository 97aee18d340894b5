//! Resident identifiers and their storage keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::{scalar_text, truthy_text};

/// Prefix shared by every resident hash key.
pub const KEY_PREFIX: &str = "resident:";

/// Glob pattern matching every resident key.
pub const KEY_PATTERN: &str = "resident:*";

/// Id given to bulk records that carry none, so they stay reachable at
/// `/residents/undefined`.
pub const MISSING_ID: &str = "undefined";

/// Caller-supplied resident identifier, used verbatim in the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResidentId(String);

impl ResidentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier from a JSON body value; `None` unless the value is truthy.
    pub fn from_json(value: &Value) -> Option<Self> {
        truthy_text(value).map(Self)
    }

    /// Identifier from a bulk record; never rejected.
    ///
    /// Scalars render as text (`0` → `"0"`), an absent id becomes
    /// [`MISSING_ID`], and `null` or non-scalars use their JSON text.
    pub fn from_json_lenient(value: Option<&Value>) -> Self {
        match value {
            None => Self(MISSING_ID.to_string()),
            Some(v) => Self(scalar_text(v).unwrap_or_else(|| v.to_string())),
        }
    }

    /// Recover the identifier from a storage key (`resident:<id>`).
    ///
    /// Everything after the prefix is the id, including further `:` characters.
    pub fn from_key(key: &str) -> Option<Self> {
        key.strip_prefix(KEY_PREFIX).map(|id| Self(id.to_string()))
    }

    /// Storage key of this resident's hash.
    pub fn key(&self) -> String {
        format!("{KEY_PREFIX}{}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ResidentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResidentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ResidentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
