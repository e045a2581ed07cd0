//! Integration tests for rampart-files

use rampart_files::*;
use rampart_validation::Validator;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn gif() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".gif").tempfile().unwrap();
    file.write_all(b"GIF89a\x01\x00\x01\x00\x00\x00").unwrap();
    file
}

#[test]
fn test_every_upload_shape_is_checked_the_same() {
    let file = gif();
    let path = file.path().to_string_lossy().into_owned();
    let array = UploadArray::new("anim.gif", path.clone()).with_media_type("image/gif");

    let inputs = vec![
        FileInput::legacy(path.clone(), array.clone()),
        FileInput::from(array),
        FileInput::from(StoredUpload::new(&path).with_client_filename("anim.gif")),
        FileInput::from(path.as_str()),
    ];

    let mut validator = ExcludeMimeType::new("gif");
    for input in &inputs {
        assert!(!validator.is_valid(input).unwrap(), "{input:?}");
        assert_eq!(
            validator.messages().get(ExcludeMimeType::FALSE_TYPE),
            Some("File has an incorrect mimetype of 'image/gif'")
        );
    }
}

#[test]
fn test_legacy_form_through_trait() {
    let file = gif();
    let path = file.path().to_string_lossy().into_owned();
    let array = json!({ "name": "anim.gif", "tmp_name": path, "type": "image/gif" });

    let mut validator = ExcludeMimeType::new("image/png");
    assert!(validator.validate(&json!(path), Some(&array)).unwrap());
    assert!(Validator::messages(&validator).is_empty());
}

#[test]
fn test_descriptor_for_stored_upload() {
    let file = gif();
    let upload = StoredUpload::new(file.path()).with_client_media_type("image/gif");

    let info = file_information(&FileInput::from(upload), true, true).unwrap();
    assert_eq!(info.file, file.path());
    assert_eq!(info.filetype.as_deref(), Some("image/gif"));
    assert_eq!(info.basename, Some(basename(file.path())));
    assert_eq!(info.filename, basename(file.path()));

    let detected = SignatureDetector.detect(&info).unwrap();
    assert_eq!(detected.as_deref(), Some("image/gif"));
}

#[test]
fn test_descriptor_serializes_without_unset_fields() {
    let input = FileInput::from("/var/tmp/report.pdf");
    let info = file_information(&input, false, false).unwrap();
    assert_eq!(
        serde_json::to_value(&info).unwrap(),
        json!({ "filename": "report.pdf", "file": "/var/tmp/report.pdf" })
    );
}

#[test]
fn test_shared_detector() {
    #[derive(Debug)]
    struct Everything;

    impl MimeDetector for Everything {
        fn detect(&self, _file: &FileDescriptor) -> std::io::Result<Option<String>> {
            Ok(Some("application/x-everything".to_string()))
        }
    }

    let file = gif();
    let detector: Arc<dyn MimeDetector> = Arc::new(Everything);

    let mut first = ExcludeMimeType::new("everything");
    first.set_detector(Arc::clone(&detector));
    let mut second = ExcludeMimeType::new("gif");
    second.set_detector(detector);

    assert!(!first.is_valid(file.path()).unwrap());
    assert!(second.is_valid(file.path()).unwrap());
}
