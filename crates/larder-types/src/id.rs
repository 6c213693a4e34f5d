//! Identifier types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of the user owning a session.
///
/// Callers hand these over as either numbers or strings; both forms
/// normalize to the same textual id, so `7` and `"7"` name the same user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Signed(i64),
            Unsigned(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Signed(n) => Self::from(n),
            Raw::Unsigned(n) => Self::from(n),
            Raw::Text(s) => Self(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_and_string_are_equal() {
        let from_num: UserId = serde_json::from_value(serde_json::json!(7)).unwrap();
        let from_str: UserId = serde_json::from_value(serde_json::json!("7")).unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(from_num, UserId::from(7));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = UserId::new("alice");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("alice"));
        assert_eq!(id.to_string(), "alice");
    }

    #[test]
    fn test_rejects_non_scalar() {
        let result: Result<UserId, _> = serde_json::from_value(serde_json::json!({"id": 1}));
        assert!(result.is_err());
    }
}
