// Validation errors and failure messages

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised when a validator is called or configured with the wrong shape.
///
/// These never describe a failed validation; a value that simply does not
/// pass comes back as `Ok(false)` with [`Messages`] populated.
#[derive(Error, Debug)]
pub enum ValidatorError {
    /// The context is not a mapping or an indexable list
    #[error("Invalid context: {0}")]
    InvalidContext(String),

    /// An argument does not have the documented shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No message template exists for this key
    #[error("No message template exists for key '{0}'")]
    UnknownMessageKey(String),

    /// Options could not be deserialized
    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Rendered failure messages from the most recent validation, keyed by error code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    messages: HashMap<String, String>,
}

impl Messages {
    /// Create an empty message set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get the number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Get the message recorded for an error code
    pub fn get(&self, code: &str) -> Option<&str> {
        self.messages.get(code).map(String::as_str)
    }

    /// Check if a message was recorded for an error code
    pub fn contains_key(&self, code: &str) -> bool {
        self.messages.contains_key(code)
    }

    /// Iterate over `(code, message)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages
            .iter()
            .map(|(code, message)| (code.as_str(), message.as_str()))
    }

    /// Error codes with a recorded message
    pub fn codes(&self) -> Vec<&str> {
        self.messages.keys().map(String::as_str).collect()
    }

    pub(crate) fn insert(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(code.into(), message.into());
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "errors": self.messages.iter().map(|(code, message)| {
                serde_json::json!({
                    "code": code,
                    "message": message,
                })
            }).collect::<Vec<_>>()
        })
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> HashMap<String, String> {
        self.messages
    }
}

impl fmt::Display for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.messages.keys().collect();
        codes.sort();
        for code in codes {
            writeln!(f, "{}: {}", code, self.messages[code])?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for Messages
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            messages: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
