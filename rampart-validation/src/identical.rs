//! Cross-field comparison against a token.
//!
//! The token is either a literal value or a key path into the sibling
//! field data passed as context. Typical use is a "confirm password"
//! field:
//!
//! ```
//! use rampart_validation::Identical;
//! use serde_json::json;
//!
//! let mut confirm = Identical::new(json!("password"));
//! let form = json!({ "password": "hunter2" });
//! assert!(confirm.is_valid(&json!("hunter2"), Some(&form)).unwrap());
//! assert!(!confirm.is_valid(&json!("hunter3"), Some(&form)).unwrap());
//! ```

use crate::{
    ErrorCode, HasMessages, MessageOptions, MessageStore, Messages, Result, Validator,
    ValidatorError, json_type, lookup_path, options_from_pairs, options_from_value,
};
use serde::Deserialize;
use serde_json::Value;

/// Failure reasons of [`Identical`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdenticalCode {
    NotSame,
    MissingToken,
}

impl ErrorCode for IdenticalCode {
    const ALL: &'static [Self] = &[IdenticalCode::NotSame, IdenticalCode::MissingToken];

    fn key(self) -> &'static str {
        match self {
            IdenticalCode::NotSame => Identical::NOT_SAME,
            IdenticalCode::MissingToken => Identical::MISSING_TOKEN,
        }
    }

    fn default_template(self) -> &'static str {
        match self {
            IdenticalCode::NotSame => "The two given tokens do not match",
            IdenticalCode::MissingToken => "No token was provided to match against",
        }
    }
}

/// Named options for [`Identical`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdenticalOptions {
    pub token: Option<Value>,
    pub strict: bool,
    pub literal: bool,
    #[serde(flatten)]
    pub message: MessageOptions,
}

impl Default for IdenticalOptions {
    fn default() -> Self {
        Self {
            token: None,
            strict: true,
            literal: false,
            message: MessageOptions::default(),
        }
    }
}

/// Compares a value with a token, resolved through the context unless literal.
#[derive(Debug, Clone)]
pub struct Identical {
    token: Option<Value>,
    strict: bool,
    literal: bool,
    store: MessageStore<IdenticalCode>,
}

impl Default for Identical {
    fn default() -> Self {
        Self {
            token: None,
            strict: true,
            literal: false,
            store: MessageStore::new(),
        }
    }
}

impl Identical {
    pub const NOT_SAME: &'static str = "notSame";
    pub const MISSING_TOKEN: &'static str = "missingToken";

    /// Create with a token and default strictness
    pub fn new(token: impl Into<Value>) -> Self {
        let mut validator = Self::default();
        validator.set_token(token);
        validator
    }

    /// Create from named options
    pub fn with_options(options: IdenticalOptions) -> Result<Self> {
        let mut store = MessageStore::new();
        store.configure(&options.message)?;
        Ok(Self {
            token: options.token.filter(|t| !t.is_null()),
            strict: options.strict,
            literal: options.literal,
            store,
        })
    }

    /// Create from key/value pairs such as `("token", json!("email"))`
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::with_options(options_from_pairs(pairs)?)
    }

    /// Create from a JSON options object
    pub fn from_value(options: Value) -> Result<Self> {
        Self::with_options(options_from_value(options)?)
    }

    pub fn token(&self) -> Option<&Value> {
        self.token.as_ref()
    }

    /// Set the token; JSON null unsets it
    pub fn set_token(&mut self, token: impl Into<Value>) -> &mut Self {
        let token = token.into();
        self.token = (!token.is_null()).then_some(token);
        self
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn literal(&self) -> bool {
        self.literal
    }

    pub fn set_literal(&mut self, literal: bool) -> &mut Self {
        self.literal = literal;
        self
    }

    /// Compare `value` with the token.
    ///
    /// Fails with [`ValidatorError::InvalidContext`] when a context is given,
    /// literal mode is off, and the context is neither an object nor an array.
    pub fn is_valid(&mut self, value: &Value, context: Option<&Value>) -> Result<bool> {
        self.store.reset();

        let expected = match self.resolve_token(context)? {
            Some(token) => token.clone(),
            None => {
                self.store
                    .record(IdenticalCode::MissingToken, &display(value), &[]);
                return Ok(false);
            }
        };

        let same = if self.strict {
            *value == expected
        } else {
            loose_eq(value, &expected)
        };

        if !same {
            self.store.record(
                IdenticalCode::NotSame,
                &display(value),
                &[("token", display(&expected))],
            );
        }
        Ok(same)
    }

    fn resolve_token<'a>(&'a self, context: Option<&'a Value>) -> Result<Option<&'a Value>> {
        let context = match context {
            _ if self.literal => None,
            None | Some(Value::Null) => None,
            Some(ctx @ (Value::Object(_) | Value::Array(_))) => Some(ctx),
            Some(other) => {
                return Err(ValidatorError::InvalidContext(format!(
                    "context must be an object or an array, got {}",
                    json_type(other)
                )));
            }
        };

        let Some(token) = self.token.as_ref() else {
            return Ok(None);
        };

        let resolved = context
            .zip(token_path(token))
            .and_then(|(ctx, path)| lookup_path(ctx, path.as_slice()));

        if resolved.is_some() {
            tracing::trace!(token = %token, "token resolved through context");
        }
        Ok(Some(resolved.unwrap_or(token)))
    }

    pub fn messages(&self) -> &Messages {
        self.store.messages()
    }
}

impl HasMessages for Identical {
    type Code = IdenticalCode;

    fn message_store(&self) -> &MessageStore<IdenticalCode> {
        &self.store
    }

    fn message_store_mut(&mut self) -> &mut MessageStore<IdenticalCode> {
        &mut self.store
    }

    fn message_variables(&self) -> &'static [&'static str] {
        &["token"]
    }
}

impl Validator for Identical {
    type Value = Value;

    fn validate(&mut self, value: &Value, context: Option<&Value>) -> Result<bool> {
        self.is_valid(value, context)
    }

    fn messages(&self) -> &Messages {
        self.store.messages()
    }

    fn name(&self) -> &'static str {
        "identical"
    }
}

/// Key path described by a token, if it describes one.
///
/// `"email"` is `[email]`, `{"user": "email"}` and `["user", "email"]`
/// are both `[user, email]`. In an object with several keys the first one
/// inserted is followed.
fn token_path(token: &Value) -> Option<Vec<String>> {
    match token {
        Value::String(_) | Value::Number(_) => key_segment(token).map(|k| vec![k]),
        Value::Array(items) if !items.is_empty() => items.iter().map(key_segment).collect(),
        Value::Object(_) => {
            let mut path = Vec::new();
            let mut current = token;
            while let Value::Object(map) = current {
                let (key, next) = map.iter().next()?;
                path.push(key.clone());
                current = next;
            }
            path.push(key_segment(current)?);
            Some(path)
        }
        _ => None,
    }
}

fn key_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Type-coercing equality.
///
/// Numbers and numeric strings compare by value, booleans and null compare
/// by truthiness, containers compare element by element.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), other) | (other, Value::Bool(x)) => *x == truthy(other),
        (Value::Null, other) | (other, Value::Null) => !truthy(other),
        (Value::Number(_), Value::Number(_)) => numbers_eq(a, b),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            numeric(s).is_some_and(|f| n.as_f64() == Some(f))
        }
        (Value::String(x), Value::String(y)) => {
            x == y || matches!((numeric(x), numeric(y)), (Some(l), Some(r)) if l == r)
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| loose_eq(l, r)))
        }
        _ => false,
    }
}

fn numbers_eq(a: &Value, b: &Value) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

fn numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationContext;
    use serde_json::json;

    #[test]
    fn test_token_initially_unset() {
        let validator = Identical::default();
        assert!(validator.token().is_none());
        assert!(validator.strict());
        assert!(!validator.literal());
    }

    #[test]
    fn test_set_token() {
        let mut validator = Identical::default();
        validator.set_token("foo");
        assert_eq!(validator.token(), Some(&json!("foo")));

        validator.set_token(Value::Null);
        assert!(validator.token().is_none());
    }

    #[test]
    fn test_missing_token() {
        let mut validator = Identical::default();
        assert!(!validator.is_valid(&json!("foo"), None).unwrap());
        assert_eq!(
            validator.messages().get(Identical::MISSING_TOKEN),
            Some("No token was provided to match against")
        );
        assert!(!validator.messages().contains_key(Identical::NOT_SAME));
    }

    #[test]
    fn test_matching_and_non_matching_literal() {
        let mut validator = Identical::new("foo");
        assert!(!validator.is_valid(&json!("bar"), None).unwrap());
        assert_eq!(
            validator.messages().get(Identical::NOT_SAME),
            Some("The two given tokens do not match")
        );

        assert!(validator.is_valid(&json!("foo"), None).unwrap());
        assert!(validator.messages().is_empty());
    }

    #[test]
    fn test_empty_token() {
        let mut validator = Identical::new("");
        assert!(validator.is_valid(&json!(""), None).unwrap());
    }

    #[test]
    fn test_non_string_tokens() {
        let mut validator = Identical::new(true);
        assert!(validator.is_valid(&json!(true), None).unwrap());
        assert!(!validator.is_valid(&json!(1), None).unwrap());

        validator.set_token(json!({ "one": "two", "0": "three" }));
        assert!(validator
            .is_valid(&json!({ "one": "two", "0": "three" }), None)
            .unwrap());
        assert!(!validator.is_valid(&json!([]), None).unwrap());
    }

    #[test]
    fn test_token_from_options() {
        let mut validator = Identical::from_value(json!({ "token": 123 })).unwrap();
        assert!(validator.is_valid(&json!(123), None).unwrap());
        assert!(!validator.is_valid(&json!({ "token": 123 }), None).unwrap());
    }

    #[test]
    fn test_non_strict() {
        let mut validator = Identical::from_value(json!({ "token": 123, "strict": false })).unwrap();
        assert!(validator.is_valid(&json!("123"), None).unwrap());

        validator.set_strict(true);
        assert!(!validator.is_valid(&json!("123"), None).unwrap());
        assert!(!validator.is_valid(&json!({ "token": "123" }), None).unwrap());
    }

    #[test]
    fn test_string_token_in_context() {
        let mut validator = Identical::new("email");

        let same = json!({ "email": "john@doe.com" });
        let other = json!({ "email": "harry@hoe.com" });
        assert!(validator.is_valid(&json!("john@doe.com"), Some(&same)).unwrap());
        assert!(!validator.is_valid(&json!("john@doe.com"), Some(&other)).unwrap());
        assert!(!validator.is_valid(&json!("harry@hoe.com"), Some(&same)).unwrap());

        let params: Value = ValidationContext::new()
            .with_data("email", "john@doe.com")
            .into();
        assert!(validator.is_valid(&json!("john@doe.com"), Some(&params)).unwrap());
        assert!(!validator.is_valid(&json!("harry@hoe.com"), Some(&params)).unwrap());
    }

    #[test]
    fn test_nested_token_in_context() {
        let same = json!({ "user": { "email": "john@doe.com" } });
        let other = json!({ "user": { "email": "harry@hoe.com" } });

        for token in [json!({ "user": "email" }), json!(["user", "email"])] {
            let mut validator = Identical::new(token);
            assert!(validator.is_valid(&json!("john@doe.com"), Some(&same)).unwrap());
            assert!(!validator.is_valid(&json!("john@doe.com"), Some(&other)).unwrap());
            assert!(!validator.is_valid(&json!("harry@hoe.com"), Some(&same)).unwrap());
            assert!(validator.messages().contains_key(Identical::NOT_SAME));
        }
    }

    #[test]
    fn test_unresolvable_path_falls_back_to_literal() {
        let mut validator = Identical::new("email");
        let context = json!({ "name": "john" });
        assert!(validator.is_valid(&json!("email"), Some(&context)).unwrap());

        let null_entry = json!({ "email": null });
        assert!(validator.is_valid(&json!("email"), Some(&null_entry)).unwrap());
    }

    #[test]
    fn test_index_into_array_context() {
        let mut validator = Identical::new(json!(["rows", 1]));
        let context = json!({ "rows": ["a", "b"] });
        assert!(validator.is_valid(&json!("b"), Some(&context)).unwrap());
    }

    #[test]
    fn test_literal_ignores_context() {
        let mut validator = Identical::from_value(json!({ "token": "foo", "literal": true })).unwrap();
        assert!(validator.literal());

        validator.set_token(json!({ "foo": "bar" }));
        assert!(validator
            .is_valid(&json!({ "foo": "bar" }), Some(&json!({ "foo": "baz" })))
            .unwrap());
        assert!(validator
            .is_valid(&json!({ "foo": "bar" }), Some(&json!("not a mapping")))
            .unwrap());
    }

    #[test]
    fn test_literal_flag_without_context() {
        let mut validator = Identical::new(json!({ "foo": "bar" }));

        validator.set_literal(false);
        assert!(validator.is_valid(&json!({ "foo": "bar" }), None).unwrap());

        validator.set_literal(true);
        assert!(validator.is_valid(&json!({ "foo": "bar" }), None).unwrap());
    }

    #[test]
    fn test_invalid_context_is_an_error() {
        let mut validator = Identical::default();
        for context in [json!(false), json!(1), json!("dummy")] {
            let err = validator
                .is_valid(&json!("john@doe.com"), Some(&context))
                .unwrap_err();
            assert!(matches!(err, ValidatorError::InvalidContext(_)));
        }
    }

    #[test]
    fn test_null_context_counts_as_absent() {
        let mut validator = Identical::new("foo");
        assert!(validator.is_valid(&json!("foo"), Some(&Value::Null)).unwrap());
    }

    #[test]
    fn test_message_templates_and_variables() {
        let mut validator = Identical::new("a");
        assert_eq!(validator.message_variables(), &["token"]);
        assert_eq!(validator.message_templates().len(), 2);

        validator
            .set_message_for_key(Identical::NOT_SAME, "'%value%' is not '%token%'")
            .unwrap();
        assert!(!validator.is_valid(&json!("b"), None).unwrap());
        assert_eq!(
            validator.messages().get(Identical::NOT_SAME),
            Some("'b' is not 'a'")
        );
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(loose_eq(&json!("1e3"), &json!("1000")));
        assert!(loose_eq(&json!(" 12"), &json!(12)));
        assert!(loose_eq(&json!(true), &json!("yes")));
        assert!(loose_eq(&json!(false), &json!("0")));
        assert!(loose_eq(&json!(null), &json!(0)));
        assert!(loose_eq(&json!(null), &json!([])));
        assert!(loose_eq(&json!([1, "2"]), &json!(["1", 2])));
        assert!(loose_eq(&json!({ "a": 1 }), &json!({ "a": "1" })));

        assert!(!loose_eq(&json!("abc"), &json!(0)));
        assert!(!loose_eq(&json!("a"), &json!("b")));
        assert!(!loose_eq(&json!([1]), &json!([1, 2])));
        assert!(!loose_eq(&json!({ "a": 1 }), &json!({ "b": 1 })));
    }

    #[test]
    fn test_token_path() {
        assert_eq!(token_path(&json!("a")), Some(vec!["a".to_string()]));
        assert_eq!(
            token_path(&json!({ "a": { "b": "c" } })),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(token_path(&json!([])), None);
        assert_eq!(token_path(&json!(["a", true])), None);
        assert_eq!(token_path(&json!(true)), None);
    }

    #[test]
    fn test_token_path_follows_first_inserted_key() {
        let token = json!({ "user": "email", "admin": "name" });
        assert_eq!(
            token_path(&token),
            Some(vec!["user".to_string(), "email".to_string()])
        );

        let mut validator = Identical::new(token);
        let context = json!({ "user": { "email": "a" }, "admin": { "name": "b" } });
        assert!(validator.is_valid(&json!("a"), Some(&context)).unwrap());
        assert!(!validator.is_valid(&json!("b"), Some(&context)).unwrap());
    }
}
