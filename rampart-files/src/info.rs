//! Normalization of uploaded file information.
//!
//! Uploads reach validators in four shapes: a legacy `(name, array)` pair,
//! a single upload array, an [`UploadedFile`] object, or a plain path.
//! [`file_information`] turns any of them into one [`FileDescriptor`].

use crate::{FileError, FileResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upload array as produced by a form-data parser
/// (`{name, tmp_name, size, error, type}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadArray {
    /// Client-side file name
    pub name: String,
    /// Where the upload was stored on disk
    pub tmp_name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub error: Option<i64>,
    /// Declared media type
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub media_type: Option<String>,
}

/// Optional field that falls back to `None` when its value has another type.
/// Numeric strings are parsed.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + FromStr,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().ok(),
        other => T::deserialize(other).ok(),
    })
}

impl UploadArray {
    pub fn new(name: impl Into<String>, tmp_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tmp_name: tmp_name.into(),
            ..Default::default()
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_error(mut self, error: i64) -> Self {
        self.error = Some(error);
        self
    }

    /// Parse from JSON; fails unless both `name` and `tmp_name` are strings.
    /// Other fields of an unexpected type are dropped.
    pub fn from_value(value: &Value) -> FileResult<Self> {
        Self::deserialize(value).map_err(|_| FileError::files_format())
    }
}

/// Readable stream behind an uploaded file
pub trait UploadStream: Send + Sync {
    /// Stream metadata by key; `uri` is the backing file path
    fn metadata(&self, key: &str) -> Option<String>;
}

/// Uploaded file handed over by the HTTP layer
pub trait UploadedFile: fmt::Debug + Send + Sync {
    fn client_filename(&self) -> Option<String>;

    fn client_media_type(&self) -> Option<String>;

    fn stream(&self) -> &dyn UploadStream;
}

/// Stream over a file already on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStream {
    path: PathBuf,
}

impl FileStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UploadStream for FileStream {
    fn metadata(&self, key: &str) -> Option<String> {
        (key == "uri").then(|| self.path.to_string_lossy().into_owned())
    }
}

/// Upload that was spooled to a local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    client_filename: Option<String>,
    client_media_type: Option<String>,
    stream: FileStream,
}

impl StoredUpload {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            client_filename: None,
            client_media_type: None,
            stream: FileStream::new(path),
        }
    }

    pub fn with_client_filename(mut self, name: impl Into<String>) -> Self {
        self.client_filename = Some(name.into());
        self
    }

    pub fn with_client_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.client_media_type = Some(media_type.into());
        self
    }
}

impl UploadedFile for StoredUpload {
    fn client_filename(&self) -> Option<String> {
        self.client_filename.clone()
    }

    fn client_media_type(&self) -> Option<String> {
        self.client_media_type.clone()
    }

    fn stream(&self) -> &dyn UploadStream {
        &self.stream
    }
}

/// Any supported upload shape
#[derive(Debug, Clone)]
pub enum FileInput {
    /// Name plus upload array, passed separately
    Legacy { name: String, upload: UploadArray },
    /// Upload array on its own
    Sapi(UploadArray),
    /// Upload object with a stream
    Upload(Arc<dyn UploadedFile>),
    /// Plain filesystem path
    Path(PathBuf),
}

impl FileInput {
    pub fn legacy(name: impl Into<String>, upload: UploadArray) -> Self {
        FileInput::Legacy {
            name: name.into(),
            upload,
        }
    }

    pub fn upload(upload: impl UploadedFile + 'static) -> Self {
        FileInput::Upload(Arc::new(upload))
    }

    /// Classify untyped input.
    ///
    /// A string with an upload array alongside is the legacy form, an
    /// object is an upload array, a string alone is a path.
    pub fn from_value(value: &Value, file: Option<&Value>) -> FileResult<Self> {
        match (value, file) {
            (Value::String(name), Some(file @ Value::Object(_))) => {
                Ok(FileInput::legacy(name.clone(), UploadArray::from_value(file)?))
            }
            (Value::Object(_), _) => Ok(FileInput::Sapi(UploadArray::from_value(value)?)),
            (Value::String(path), _) => Ok(FileInput::Path(PathBuf::from(path))),
            _ => Err(FileError::InvalidShape(
                "Value must be a file path, an upload array or an uploaded file".to_string(),
            )),
        }
    }
}

impl From<&str> for FileInput {
    fn from(path: &str) -> Self {
        FileInput::Path(PathBuf::from(path))
    }
}

impl From<String> for FileInput {
    fn from(path: String) -> Self {
        FileInput::Path(PathBuf::from(path))
    }
}

impl From<&Path> for FileInput {
    fn from(path: &Path) -> Self {
        FileInput::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        FileInput::Path(path)
    }
}

impl From<UploadArray> for FileInput {
    fn from(upload: UploadArray) -> Self {
        FileInput::Sapi(upload)
    }
}

impl From<StoredUpload> for FileInput {
    fn from(upload: StoredUpload) -> Self {
        FileInput::upload(upload)
    }
}

impl From<&FileInput> for FileInput {
    fn from(input: &FileInput) -> Self {
        input.clone()
    }
}

/// Canonical description of a file to validate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// Client-side name
    pub filename: String,
    /// Location on disk
    pub file: PathBuf,
    /// Declared media type; only filled when requested and known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    /// Last path segment of `file`; only filled when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
}

/// Normalize `input` into a [`FileDescriptor`].
pub fn file_information(
    input: &FileInput,
    include_type: bool,
    include_basename: bool,
) -> FileResult<FileDescriptor> {
    let (mut descriptor, declared) = match input {
        FileInput::Legacy { upload, .. } | FileInput::Sapi(upload) => array_info(upload),
        FileInput::Upload(upload) => upload_info(upload.as_ref())?,
        FileInput::Path(path) => path_info(path),
    };

    if include_type {
        descriptor.filetype = declared;
    }
    if include_basename {
        descriptor.basename = Some(basename(&descriptor.file));
    }

    tracing::trace!(
        filename = %descriptor.filename,
        file = %descriptor.file.display(),
        "normalized file information"
    );
    Ok(descriptor)
}

fn array_info(upload: &UploadArray) -> (FileDescriptor, Option<String>) {
    let descriptor = FileDescriptor {
        filename: upload.name.clone(),
        file: PathBuf::from(&upload.tmp_name),
        ..Default::default()
    };
    (descriptor, upload.media_type.clone())
}

fn upload_info(upload: &dyn UploadedFile) -> FileResult<(FileDescriptor, Option<String>)> {
    let uri = upload
        .stream()
        .metadata("uri")
        .ok_or(FileError::MissingUri)?;
    let file = PathBuf::from(uri);
    let filename = upload
        .client_filename()
        .unwrap_or_else(|| basename(&file));

    let descriptor = FileDescriptor {
        filename,
        file,
        ..Default::default()
    };
    Ok((descriptor, upload.client_media_type()))
}

fn path_info(path: &Path) -> (FileDescriptor, Option<String>) {
    let descriptor = FileDescriptor {
        filename: basename(path),
        file: path.to_path_buf(),
        ..Default::default()
    };
    (descriptor, None)
}

/// Final path segment, or an empty string when there is none.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
