//! Local upload checks. They mirror the server's limits so an unsupported or
//! oversized file is rejected before any bytes leave the machine.

use crate::app_lib::{ApiError, AppError, FilePart};
use std::path::Path;

pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "audio/mpeg",
    "audio/wav",
];
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_DESCRIPTION_CHARS: usize = 255;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// File read from disk and ready to be attached to a multipart request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    part: FilePart,
}

impl UploadFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            part: FilePart {
                field: "file".to_string(),
                file_name: file_name.into(),
                content_type: content_type.into(),
                bytes,
            },
        }
    }

    /// Reads a file and infers its content type from the extension.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| AppError::Storage(format!("Failed to read {}: {err}", path.display())))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

        Ok(Self::new(file_name, content_type_for_path(path), bytes))
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.part.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.part.content_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.part.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.part.bytes.is_empty()
    }

    /// Multipart part under the given form field.
    #[must_use]
    pub fn into_part(self, field: &str) -> FilePart {
        FilePart {
            field: field.to_string(),
            ..self.part
        }
    }
}

/// Checks type, size and description length against the upload limits.
///
/// # Errors
/// Returns `AppError::Validation` keyed by `file` or `description`.
pub fn validate_upload(file: &UploadFile, description: Option<&str>) -> Result<(), AppError> {
    if !ALLOWED_CONTENT_TYPES.contains(&file.content_type()) {
        return Err(AppError::Validation(ApiError::field(
            "file",
            "Unsupported file type. Allowed: images (JPEG, PNG, GIF) and audio (MP3, WAV).",
        )));
    }
    if file.is_empty() {
        return Err(AppError::Validation(ApiError::field(
            "file",
            "The submitted file is empty.",
        )));
    }
    if file.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(ApiError::field(
            "file",
            "File is too large. Maximum size: 10MB.",
        )));
    }
    if description.is_some_and(|text| text.chars().count() > MAX_DESCRIPTION_CHARS) {
        return Err(AppError::Validation(ApiError::field(
            "description",
            format!("Ensure this field has no more than {MAX_DESCRIPTION_CHARS} characters."),
        )));
    }
    Ok(())
}

/// Content type inferred from a file extension.
#[must_use]
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => FALLBACK_CONTENT_TYPE,
    }
}
