//! Bit flag validation against a control mask.
//!
//! ```
//! use rampart_validation::{Bitwise, Operator};
//!
//! let mut flags = Bitwise::new(0x7, Operator::And, false);
//! assert!(flags.is_valid(0x1 | 0x2));
//! assert!(!flags.is_valid(0x8));
//! assert!(flags.messages().get(Bitwise::NOT_AND).unwrap().contains('7'));
//! ```

use crate::{
    ErrorCode, HasMessages, MessageOptions, MessageStore, Messages, Result, Validator,
    options_from_pairs, options_from_value,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How the input is compared with the control mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Input must share bits with the control
    And,
    /// Input must share no bits with the control
    Xor,
    /// Anything else; never validates
    #[serde(other)]
    Unsupported,
}

impl Operator {
    /// Parse an operator name, case-insensitively
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "and" => Operator::And,
            "xor" => Operator::Xor,
            _ => Operator::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Xor => "xor",
            Operator::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reasons of [`Bitwise`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitwiseCode {
    NotAnd,
    NotAndStrict,
    NotXor,
}

impl ErrorCode for BitwiseCode {
    const ALL: &'static [Self] = &[
        BitwiseCode::NotAnd,
        BitwiseCode::NotAndStrict,
        BitwiseCode::NotXor,
    ];

    fn key(self) -> &'static str {
        match self {
            BitwiseCode::NotAnd => Bitwise::NOT_AND,
            BitwiseCode::NotAndStrict => Bitwise::NOT_AND_STRICT,
            BitwiseCode::NotXor => Bitwise::NOT_XOR,
        }
    }

    fn default_template(self) -> &'static str {
        match self {
            BitwiseCode::NotAnd => "The input has no common bit set with '%control%'",
            BitwiseCode::NotAndStrict => "The input doesn't have the same bits set as '%control%'",
            BitwiseCode::NotXor => "The input has common bit set with '%control%'",
        }
    }
}

/// Named options for [`Bitwise`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BitwiseOptions {
    pub control: Option<i64>,
    pub operator: Option<Operator>,
    pub strict: bool,
    #[serde(flatten)]
    pub message: MessageOptions,
}

/// Validates an integer's bits against a control mask.
///
/// * `And`, non-strict: at least one bit in common with the control.
/// * `And`, strict: at least one bit in common, and no bit outside the control.
/// * `Xor`: no bit in common with the control.
///
/// An unset control counts as zero, so `And` never passes and `Xor` always
/// does. An unset or unsupported operator never passes and records nothing.
#[derive(Debug, Clone, Default)]
pub struct Bitwise {
    control: Option<i64>,
    operator: Option<Operator>,
    strict: bool,
    store: MessageStore<BitwiseCode>,
}

impl Bitwise {
    pub const NOT_AND: &'static str = "notAnd";
    pub const NOT_AND_STRICT: &'static str = "notAndStrict";
    pub const NOT_XOR: &'static str = "notXor";

    /// Create from positional arguments
    pub fn new(control: i64, operator: Operator, strict: bool) -> Self {
        Self {
            control: Some(control),
            operator: Some(operator),
            strict,
            store: MessageStore::new(),
        }
    }

    /// Create from named options
    pub fn with_options(options: BitwiseOptions) -> Result<Self> {
        let mut store = MessageStore::new();
        store.configure(&options.message)?;
        Ok(Self {
            control: options.control,
            operator: options.operator,
            strict: options.strict,
            store,
        })
    }

    /// Create from key/value pairs such as `("control", json!(1))`
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

    pub fn control(&self) -> Option<i64> {
        self.control
    }

    pub fn set_control(&mut self, control: i64) -> &mut Self {
        self.control = Some(control);
        self
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator
    }

    pub fn set_operator(&mut self, operator: Operator) -> &mut Self {
        self.operator = Some(operator);
        self
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Check `value` against the control mask
    pub fn is_valid(&mut self, value: i64) -> bool {
        self.store.reset();

        let control = self.control.unwrap_or(0);
        let shared = control & value;

        let failure = match self.operator {
            Some(Operator::And) if self.strict => {
                (shared == 0 || shared != value).then_some(BitwiseCode::NotAndStrict)
            }
            Some(Operator::And) => (shared == 0).then_some(BitwiseCode::NotAnd),
            Some(Operator::Xor) => (shared != 0).then_some(BitwiseCode::NotXor),
            Some(Operator::Unsupported) | None => {
                tracing::debug!(operator = ?self.operator, "bitwise operator not supported");
                return false;
            }
        };

        match failure {
            Some(code) => {
                let control = self.control.map(|c| c.to_string()).unwrap_or_default();
                self.store
                    .record(code, &value.to_string(), &[("control", control)]);
                false
            }
            None => true,
        }
    }

    pub fn messages(&self) -> &Messages {
        self.store.messages()
    }
}

impl HasMessages for Bitwise {
    type Code = BitwiseCode;

    fn message_store(&self) -> &MessageStore<BitwiseCode> {
        &self.store
    }

    fn message_store_mut(&mut self) -> &mut MessageStore<BitwiseCode> {
        &mut self.store
    }

    fn message_variables(&self) -> &'static [&'static str] {
        &["control"]
    }
}

impl Validator for Bitwise {
    type Value = i64;

    fn validate(&mut self, value: &i64, _context: Option<&Value>) -> Result<bool> {
        Ok(self.is_valid(*value))
    }

    fn messages(&self) -> &Messages {
        self.store.messages()
    }

    fn name(&self) -> &'static str {
        "bitwise"
    }
}
