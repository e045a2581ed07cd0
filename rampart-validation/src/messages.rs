//! Message templates and per-validator message state.
//!
//! Every validator owns a [`MessageStore`] typed by its own [`ErrorCode`]
//! enum. Templates carry `%name%` placeholders which are filled from the
//! variables a validator hands over at the moment a failure is recorded,
//! so nothing about the validator's state is read back later.

use crate::errors::{Messages, Result, ValidatorError};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").expect("placeholder pattern is valid"));

const ELLIPSIS: &str = "...";

/// A failure reason a validator can report.
pub trait ErrorCode: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every code the validator can emit.
    const ALL: &'static [Self];

    /// Stable string key used in [`Messages`].
    fn key(self) -> &'static str;

    /// Built-in English template.
    fn default_template(self) -> &'static str;

    /// Look a code up by its key.
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.key() == key)
    }
}

/// Localizes message templates.
///
/// Returning `None` keeps the untranslated template.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, template: &str) -> Option<String>;
}

/// Fill `%name%` placeholders from `variables`.
///
/// Unknown placeholders are left in place.
pub fn render(template: &str, variables: &[(&str, String)]) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            variables
                .iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Cut `message` to at most `limit` characters, marking the cut with `...`.
pub fn truncate(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = message.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Templates, overrides and the messages of the latest validation.
pub struct MessageStore<C: ErrorCode> {
    overrides: HashMap<C, String>,
    messages: Messages,
    value_obscured: bool,
    message_length: Option<usize>,
    translator: Option<Arc<dyn Translator>>,
}

impl<C: ErrorCode> MessageStore<C> {
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            messages: Messages::new(),
            value_obscured: false,
            message_length: None,
            translator: None,
        }
    }

    /// Apply the message options shared by all validators.
    pub fn configure(&mut self, options: &MessageOptions) -> Result<()> {
        for (key, template) in &options.messages {
            self.set_message_for_key(key, template.clone())?;
        }
        self.value_obscured = options.value_obscured;
        self.message_length = options.message_length;
        Ok(())
    }

    /// Forget the messages of the previous validation.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Render and store the message for `code`.
    pub fn record(&mut self, code: C, value: &str, variables: &[(&str, String)]) {
        let value = if self.value_obscured {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };

        let mut all = Vec::with_capacity(variables.len() + 1);
        all.push(("value", value));
        all.extend(variables.iter().map(|(name, v)| (*name, v.clone())));

        let mut message = render(&self.template(code), &all);
        if let Some(limit) = self.message_length {
            message = truncate(&message, limit);
        }

        tracing::debug!(code = code.key(), message = %message, "validation failed");
        self.messages.insert(code.key(), message);
    }

    /// Effective template for `code`: override, then translation, then default.
    pub fn template(&self, code: C) -> String {
        let template = self
            .overrides
            .get(&code)
            .cloned()
            .unwrap_or_else(|| code.default_template().to_string());

        match &self.translator {
            Some(translator) => translator
                .translate(code.key(), &template)
                .unwrap_or(template),
            None => template,
        }
    }

    /// Replace the template for `code`.
    pub fn set_message(&mut self, code: C, template: impl Into<String>) {
        self.overrides.insert(code, template.into());
    }

    /// Replace the template registered under a string key.
    pub fn set_message_for_key(&mut self, key: &str, template: impl Into<String>) -> Result<()> {
        let code = C::from_key(key).ok_or_else(|| ValidatorError::UnknownMessageKey(key.to_string()))?;
        self.set_message(code, template);
        Ok(())
    }

    /// Key to effective template, for every code.
    pub fn templates(&self) -> BTreeMap<&'static str, String> {
        C::ALL
            .iter()
            .map(|code| (code.key(), self.template(*code)))
            .collect()
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn value_obscured(&self) -> bool {
        self.value_obscured
    }

    pub fn set_value_obscured(&mut self, obscured: bool) {
        self.value_obscured = obscured;
    }

    pub fn message_length(&self) -> Option<usize> {
        self.message_length
    }

    pub fn set_message_length(&mut self, length: Option<usize>) {
        self.message_length = length;
    }

    pub fn set_translator(&mut self, translator: Option<Arc<dyn Translator>>) {
        self.translator = translator;
    }
}

impl<C: ErrorCode> Default for MessageStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ErrorCode> Clone for MessageStore<C> {
    fn clone(&self) -> Self {
        Self {
            overrides: self.overrides.clone(),
            messages: self.messages.clone(),
            value_obscured: self.value_obscured,
            message_length: self.message_length,
            translator: self.translator.clone(),
        }
    }
}

impl<C: ErrorCode> fmt::Debug for MessageStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStore")
            .field("overrides", &self.overrides)
            .field("messages", &self.messages)
            .field("value_obscured", &self.value_obscured)
            .field("message_length", &self.message_length)
            .field("translator", &self.translator.is_some())
            .finish()
    }
}

/// Message options accepted by every validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageOptions {
    /// Template overrides keyed by error code
    pub messages: HashMap<String, String>,
    /// Render `%value%` as asterisks
    pub value_obscured: bool,
    /// Maximum message length in characters
    pub message_length: Option<usize>,
}
