//! Rejects uploads whose MIME type is on an exclusion list.

use crate::{
    FileDescriptor, FileInput, FileResult, MimeDetector, SignatureDetector, file_information,
};
use rampart_validation::{
    ErrorCode, HasMessages, MessageOptions, MessageStore, Messages, Validator,
    options_from_pairs, options_from_value,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Failure reasons of [`ExcludeMimeType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExcludeMimeTypeCode {
    FalseType,
    NotDetected,
    NotReadable,
}

impl ErrorCode for ExcludeMimeTypeCode {
    const ALL: &'static [Self] = &[
        ExcludeMimeTypeCode::FalseType,
        ExcludeMimeTypeCode::NotDetected,
        ExcludeMimeTypeCode::NotReadable,
    ];

    fn key(self) -> &'static str {
        match self {
            ExcludeMimeTypeCode::FalseType => ExcludeMimeType::FALSE_TYPE,
            ExcludeMimeTypeCode::NotDetected => ExcludeMimeType::NOT_DETECTED,
            ExcludeMimeTypeCode::NotReadable => ExcludeMimeType::NOT_READABLE,
        }
    }

    fn default_template(self) -> &'static str {
        match self {
            ExcludeMimeTypeCode::FalseType => "File has an incorrect mimetype of '%type%'",
            ExcludeMimeTypeCode::NotDetected => "The mimetype could not be detected from the file",
            ExcludeMimeTypeCode::NotReadable => "File is not readable or does not exist",
        }
    }
}

/// Ordered, duplicate-free list of MIME types or type fragments.
///
/// Strings are split on commas; entries are trimmed and empty ones dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "MimeTypeList")]
pub struct MimeTypes(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum MimeTypeList {
    One(String),
    Many(Vec<String>),
}

impl From<MimeTypeList> for MimeTypes {
    fn from(list: MimeTypeList) -> Self {
        match list {
            MimeTypeList::One(types) => MimeTypes::from(types.as_str()),
            MimeTypeList::Many(types) => MimeTypes::from(types),
        }
    }
}

impl MimeTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries, skipping blanks and ones already present
    pub fn extend<S: AsRef<str>>(&mut self, entries: impl IntoIterator<Item = S>) {
        for entry in entries {
            for token in entry.as_ref().split(',') {
                let token = token.trim();
                if !token.is_empty() && !self.0.iter().any(|t| t == token) {
                    self.0.push(token.to_string());
                }
            }
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether `mime` is excluded, either outright or through a piece of
    /// it split on `/`, on `-` or on `;` (each separator on its own)
    pub fn matches(&self, mime: &str) -> bool {
        let candidates = std::iter::once(mime)
            .chain(mime.split('/'))
            .chain(mime.split('-'))
            .chain(mime.split(';'))
            .map(str::trim);
        self.0
            .iter()
            .any(|entry| candidates.clone().any(|candidate| candidate == entry))
    }
}

impl From<&str> for MimeTypes {
    fn from(types: &str) -> Self {
        let mut list = MimeTypes::new();
        list.extend([types]);
        list
    }
}

impl From<String> for MimeTypes {
    fn from(types: String) -> Self {
        MimeTypes::from(types.as_str())
    }
}

impl From<Vec<String>> for MimeTypes {
    fn from(types: Vec<String>) -> Self {
        let mut list = MimeTypes::new();
        list.extend(types);
        list
    }
}

impl From<Vec<&str>> for MimeTypes {
    fn from(types: Vec<&str>) -> Self {
        let mut list = MimeTypes::new();
        list.extend(types);
        list
    }
}

impl From<&[&str]> for MimeTypes {
    fn from(types: &[&str]) -> Self {
        let mut list = MimeTypes::new();
        list.extend(types);
        list
    }
}

impl<const N: usize> From<[&str; N]> for MimeTypes {
    fn from(types: [&str; N]) -> Self {
        let mut list = MimeTypes::new();
        list.extend(types);
        list
    }
}

impl From<&MimeTypes> for MimeTypes {
    fn from(types: &MimeTypes) -> Self {
        types.clone()
    }
}

/// Named options for [`ExcludeMimeType`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExcludeMimeTypeOptions {
    pub mime_type: MimeTypes,
    pub enable_header_check: bool,
    #[serde(flatten)]
    pub message: MessageOptions,
}

/// Fails when the detected MIME type of a file is on the exclusion list.
///
/// The type comes from the [`MimeDetector`] (file signature, then file name).
/// With the header check enabled, the type declared by the client is used
/// when detection finds nothing.
#[derive(Debug, Clone)]
pub struct ExcludeMimeType {
    mime_types: MimeTypes,
    header_check: bool,
    detector: Arc<dyn MimeDetector>,
    store: MessageStore<ExcludeMimeTypeCode>,
}

impl Default for ExcludeMimeType {
    fn default() -> Self {
        Self {
            mime_types: MimeTypes::default(),
            header_check: false,
            detector: Arc::new(SignatureDetector),
            store: MessageStore::new(),
        }
    }
}

impl ExcludeMimeType {
    pub const FALSE_TYPE: &'static str = "fileExcludeMimeTypeFalse";
    pub const NOT_DETECTED: &'static str = "fileExcludeMimeTypeNotDetected";
    pub const NOT_READABLE: &'static str = "fileExcludeMimeTypeNotReadable";

    /// Create from a type list: `"image/gif, jpeg"` or `["image/gif", "jpeg"]`
    pub fn new(mime_types: impl Into<MimeTypes>) -> Self {
        Self {
            mime_types: mime_types.into(),
            ..Default::default()
        }
    }

    /// Create from named options
    pub fn with_options(options: ExcludeMimeTypeOptions) -> FileResult<Self> {
        let mut store = MessageStore::new();
        store.configure(&options.message)?;
        Ok(Self {
            mime_types: options.mime_type,
            header_check: options.enable_header_check,
            store,
            ..Default::default()
        })
    }

    /// Create from key/value pairs such as `("mimeType", json!("image"))`
    pub fn from_pairs<K, V, I>(pairs: I) -> FileResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::with_options(options_from_pairs(pairs)?)
    }

    /// Create from a JSON options object
    pub fn from_value(options: Value) -> FileResult<Self> {
        Self::with_options(options_from_value(options)?)
    }

    /// Excluded types, comma-joined
    pub fn mime_type(&self) -> String {
        self.mime_types.as_slice().join(",")
    }

    /// Excluded types as a list
    pub fn mime_types(&self) -> &[String] {
        self.mime_types.as_slice()
    }

    /// Replace the exclusion list
    pub fn set_mime_type(&mut self, mime_types: impl Into<MimeTypes>) -> &mut Self {
        self.mime_types = mime_types.into();
        self
    }

    /// Add to the exclusion list
    pub fn add_mime_type(&mut self, mime_types: impl Into<MimeTypes>) -> &mut Self {
        let added = mime_types.into();
        self.mime_types.extend(added.as_slice());
        self
    }

    pub fn header_check(&self) -> bool {
        self.header_check
    }

    /// Fall back to the client-declared type when detection finds nothing
    pub fn enable_header_check(&mut self, enabled: bool) -> &mut Self {
        self.header_check = enabled;
        self
    }

    pub fn with_detector(mut self, detector: impl MimeDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn set_detector(&mut self, detector: Arc<dyn MimeDetector>) -> &mut Self {
        self.detector = detector;
        self
    }

    /// Check a file in any supported upload shape.
    ///
    /// `Err` only when the input cannot be normalized; an unreadable file is
    /// an ordinary failure with [`ExcludeMimeType::NOT_READABLE`]. Only
    /// regular files are inspected, so a directory is reported as
    /// not readable as well.
    pub fn is_valid(&mut self, input: impl Into<FileInput>) -> FileResult<bool> {
        self.check(&input.into())
    }

    fn check(&mut self, input: &FileInput) -> FileResult<bool> {
        self.store.reset();

        let info = file_information(input, true, false)?;
        if !is_regular_file(&info) {
            tracing::debug!(file = %info.file.display(), "file not readable");
            self.fail(ExcludeMimeTypeCode::NotReadable, &info, Vec::new());
            return Ok(false);
        }

        let detected = match self.detector.detect(&info) {
            Ok(detected) => detected,
            Err(err) => {
                tracing::debug!(file = %info.file.display(), error = %err, "mime detection failed");
                self.fail(ExcludeMimeTypeCode::NotReadable, &info, Vec::new());
                return Ok(false);
            }
        };

        let declared = self.header_check.then(|| info.filetype.clone()).flatten();
        let mime = match detected.or(declared).filter(|m| !m.is_empty()) {
            Some(mime) => mime,
            None => {
                self.fail(ExcludeMimeTypeCode::NotDetected, &info, Vec::new());
                return Ok(false);
            }
        };

        if self.mime_types.matches(&mime) {
            self.fail(ExcludeMimeTypeCode::FalseType, &info, vec![("type", mime)]);
            return Ok(false);
        }
        Ok(true)
    }

    fn fail(
        &mut self,
        code: ExcludeMimeTypeCode,
        info: &FileDescriptor,
        variables: Vec<(&str, String)>,
    ) {
        self.store.record(code, &info.filename, &variables);
    }

    pub fn messages(&self) -> &Messages {
        self.store.messages()
    }
}

/// Whether the descriptor points at an existing regular file
fn is_regular_file(info: &FileDescriptor) -> bool {
    !info.file.as_os_str().is_empty()
        && std::fs::metadata(&info.file).is_ok_and(|meta| meta.is_file())
}

impl HasMessages for ExcludeMimeType {
    type Code = ExcludeMimeTypeCode;

    fn message_store(&self) -> &MessageStore<ExcludeMimeTypeCode> {
        &self.store
    }

    fn message_store_mut(&mut self) -> &mut MessageStore<ExcludeMimeTypeCode> {
        &mut self.store
    }

    fn message_variables(&self) -> &'static [&'static str] {
        &["type"]
    }
}

impl Validator for ExcludeMimeType {
    type Value = Value;

    /// `value` is a path or an upload array; with a path, `context` may
    /// carry the upload array of the legacy form.
    fn validate(&mut self, value: &Value, context: Option<&Value>) -> rampart_validation::Result<bool> {
        let input = FileInput::from_value(value, context)?;
        Ok(self.check(&input)?)
    }

    fn messages(&self) -> &Messages {
        self.store.messages()
    }

    fn name(&self) -> &'static str {
        "excludeMimeType"
    }
}
