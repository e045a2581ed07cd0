//! Upload handling and file validators for Rampart
//!
//! Provides:
//! - Normalization of uploads into one [`FileDescriptor`]
//! - MIME type detection from file signatures
//! - The [`ExcludeMimeType`] validator
//!
//! ## Quick Start
//!
//! ```rust
//! use rampart_files::{ExcludeMimeType, UploadArray};
//! use std::io::Write;
//!
//! let mut tmp = tempfile::NamedTempFile::new().unwrap();
//! tmp.write_all(b"GIF89a\x01\x00\x01\x00").unwrap();
//!
//! let upload = UploadArray::new("cat.gif", tmp.path().to_string_lossy())
//!     .with_media_type("image/gif");
//!
//! let mut no_gifs = ExcludeMimeType::new("gif, video");
//! assert!(!no_gifs.is_valid(upload).unwrap());
//! assert_eq!(
//!     no_gifs.messages().get(ExcludeMimeType::FALSE_TYPE),
//!     Some("File has an incorrect mimetype of 'image/gif'")
//! );
//! ```
//!
//! ## Upload shapes
//!
//! ```text
//! (name, UploadArray) ──┐
//! UploadArray ──────────┤
//! UploadedFile ─────────┼──▶ file_information() ──▶ FileDescriptor
//! Path ─────────────────┘
//! ```

mod detect;
mod error;
mod exclude;
mod info;

pub use detect::*;
pub use error::*;
pub use exclude::*;
pub use info::*;
