//! Redacting wrapper for credentials.
//!
//! [`SecretString`] holds verify tokens, bot tokens, and API keys and
//! keeps them out of logs, `Debug` output, and serialized JSON.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A string value that must not leak through logs or serialization.
///
/// - `Debug` and `Display` print `[REDACTED]` (empty when the value is empty)
/// - `Serialize` emits an empty string, never the wrapped value
/// - `Deserialize` accepts a plain string
/// - [`expose()`](SecretString::expose) returns the inner value where it is
///   genuinely needed (Authorization headers, token comparison)
#[derive(Clone, Default)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the wrapped value. Use only at the point of consumption.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no value is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "\"\"")
        } else {
            write!(f, "\"[REDACTED]\"")
        }
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, "[REDACTED]")
        }
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(SecretString(String::deserialize(deserializer)?))
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        SecretString(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        SecretString(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts() {
        let s = SecretString::new("hub-verify-token");
        assert_eq!(format!("{s:?}"), "\"[REDACTED]\"");
        assert!(!format!("{s:?}").contains("hub-verify-token"));
    }

    #[test]
    fn debug_empty_shows_empty() {
        let s = SecretString::default();
        assert_eq!(format!("{s:?}"), "\"\"");
    }

    #[test]
    fn serialize_never_leaks() {
        let s = SecretString::new("sk-abc123");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"\"");
    }

    #[test]
    fn deserialize_plain_string() {
        let s: SecretString = serde_json::from_str("\"tok\"").unwrap();
        assert_eq!(s.expose(), "tok");
        assert!(!s.is_empty());
    }

    #[test]
    fn expose_returns_value() {
        let s = SecretString::from("value");
        assert_eq!(s.expose(), "value");
    }
}
