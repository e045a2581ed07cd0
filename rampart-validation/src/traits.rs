// Validation traits

use crate::{ErrorCode, MessageStore, Messages, Result, Translator, ValidatorError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trait for validators
///
/// A call resets the messages of the previous call before evaluating.
/// `Ok(false)` means the value failed and [`Validator::messages`] says why;
/// `Err` means the arguments themselves had the wrong shape.
pub trait Validator {
    /// Type of the value being validated
    type Value: ?Sized;

    /// Validate a value, optionally against sibling field data
    fn validate(&mut self, value: &Self::Value, context: Option<&Value>) -> Result<bool>;

    /// Messages from the most recent call
    fn messages(&self) -> &Messages;

    /// Get validator name
    fn name(&self) -> &'static str;
}

/// Message configuration shared by every validator
///
/// Implementors only expose their [`MessageStore`]; the setters come for free.
pub trait HasMessages {
    /// Error codes this validator reports
    type Code: ErrorCode;

    fn message_store(&self) -> &MessageStore<Self::Code>;

    fn message_store_mut(&mut self) -> &mut MessageStore<Self::Code>;

    /// Placeholder names usable in templates besides `%value%`
    fn message_variables(&self) -> &'static [&'static str];

    /// Replace the template for an error code
    fn set_message(&mut self, code: Self::Code, template: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.message_store_mut().set_message(code, template);
        self
    }

    /// Replace the template registered under a string key
    fn set_message_for_key(&mut self, key: &str, template: impl Into<String>) -> Result<&mut Self>
    where
        Self: Sized,
    {
        self.message_store_mut().set_message_for_key(key, template)?;
        Ok(self)
    }

    /// Key to effective template
    fn message_templates(&self) -> BTreeMap<&'static str, String> {
        self.message_store().templates()
    }

    fn value_obscured(&self) -> bool {
        self.message_store().value_obscured()
    }

    fn set_value_obscured(&mut self, obscured: bool) {
        self.message_store_mut().set_value_obscured(obscured);
    }

    fn message_length(&self) -> Option<usize> {
        self.message_store().message_length()
    }

    fn set_message_length(&mut self, length: Option<usize>) {
        self.message_store_mut().set_message_length(length);
    }

    fn set_translator(&mut self, translator: Option<Arc<dyn Translator>>) {
        self.message_store_mut().set_translator(translator);
    }
}

/// Sibling field data supplied alongside the validated value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationContext {
    data: Map<String, Value>,
}

impl ValidationContext {
    /// Create a new validation context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add context data
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Get context data
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Walk a key path through nested data
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let start = self.data.get(first.as_ref())?;
        lookup_path(start, rest)
    }

    /// View as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

impl From<ValidationContext> for Value {
    fn from(context: ValidationContext) -> Self {
        Value::Object(context.data)
    }
}

impl TryFrom<Value> for ValidationContext {
    type Error = ValidatorError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Ok(Self { data }),
            other => Err(ValidatorError::InvalidContext(format!(
                "expected an object, got {}",
                json_type(&other)
            ))),
        }
    }
}

/// Index into an object by key or into an array by position.
///
/// `None` for missing entries and for scalar containers.
pub fn index<'a>(container: &'a Value, key: &str) -> Option<&'a Value> {
    match container {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Walk `path` from `start`. Entries holding JSON null count as missing.
pub fn lookup_path<'a, S: AsRef<str>>(start: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut current = start;
    for key in path {
        current = index(current, key.as_ref())?;
    }
    (!current.is_null()).then_some(current)
}

/// Name of a JSON value's type, for error messages
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build an options struct from key/value pairs.
///
/// Pairs go through the same deserializer as a JSON options object, so
/// every construction form lands on identical state.
pub fn options_from_pairs<T, K, V, I>(pairs: I) -> Result<T>
where
    T: DeserializeOwned,
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    let map: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    options_from_value(Value::Object(map))
}

/// Build an options struct from a JSON options object. `null` yields defaults.
pub fn options_from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    let value = match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_builder() {
        let context = ValidationContext::new()
            .with_data("email", "john@doe.com")
            .with_data("user", json!({ "name": "john" }));

        assert_eq!(context.get("email"), Some(&json!("john@doe.com")));
        assert_eq!(context.get_path(&["user", "name"]), Some(&json!("john")));
        assert_eq!(context.get_path(&["user", "age"]), None);
        assert_eq!(context.get_path::<&str>(&[]), None);
    }

    #[test]
    fn test_context_try_from_rejects_scalars() {
        assert!(ValidationContext::try_from(json!({ "a": 1 })).is_ok());
        assert!(matches!(
            ValidationContext::try_from(json!("dummy")),
            Err(ValidatorError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_lookup_path_objects_and_arrays() {
        let data = json!({ "rows": [{ "id": 7 }, { "id": null }] });
        assert_eq!(lookup_path(&data, &["rows", "0", "id"]), Some(&json!(7)));
        assert_eq!(lookup_path(&data, &["rows", "1", "id"]), None);
        assert_eq!(lookup_path(&data, &["rows", "x"]), None);
        assert_eq!(lookup_path(&data, &["rows", "0", "id", "deeper"]), None);
    }

    #[test]
    fn test_index_borrows_from_container() {
        let data = json!({ "tags": ["a", "b"], "n": 1 });
        let found = {
            let key = String::from("tags");
            index(&data, &key)
        };
        assert_eq!(found, Some(&json!(["a", "b"])));
        assert_eq!(index(&data["tags"], "1"), Some(&json!("b")));
        assert_eq!(index(&data["n"], "0"), None);
    }

    #[test]
    fn test_options_from_value_null_is_default() {
        let map: std::collections::HashMap<String, i64> = options_from_value(Value::Null).unwrap();
        assert!(map.is_empty());
    }
}
