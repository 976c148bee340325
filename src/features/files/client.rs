//! File endpoints: encrypted upload, listing and decrypted content.

use crate::app_lib::{ApiRequest, AppError, AuthGateway, MultipartBody};
use crate::features::files::{
    types::{FileContent, FileMetadata, UploadResponse},
    upload::{UploadFile, validate_upload},
};
use tracing::debug;

pub const UPLOAD_PATH: &str = "/upload/";
pub const FILES_PATH: &str = "/files/";

#[must_use]
pub fn content_path(id: i64) -> String {
    format!("/files/{id}/content/")
}

/// Uploads one file with an optional description.
///
/// # Errors
/// Returns `AppError::Validation` if the file fails the local checks or is
/// rejected by the server, plus any transport error.
pub async fn upload_file(
    gateway: &AuthGateway,
    file: UploadFile,
    description: Option<&str>,
) -> Result<UploadResponse, AppError> {
    let description = description.map(str::trim).filter(|text| !text.is_empty());
    validate_upload(&file, description)?;

    debug!(
        file_name = file.file_name(),
        content_type = file.content_type(),
        len = file.len(),
        "uploading file"
    );

    let mut body = MultipartBody::new().file(file.into_part("file"));
    if let Some(description) = description {
        body = body.text("description", description);
    }

    gateway
        .send_json(&ApiRequest::post_multipart(UPLOAD_PATH, body))
        .await
}

/// Lists the metadata of the user's files.
///
/// # Errors
/// Returns an `AppError` if the request fails.
pub async fn list_files(gateway: &AuthGateway) -> Result<Vec<FileMetadata>, AppError> {
    gateway.send_json(&ApiRequest::get(FILES_PATH)).await
}

/// Fetches the decrypted body of one file.
///
/// # Errors
/// Returns `AppError::NotFoundOrCorrupt` when the file is missing, cannot be
/// decrypted or comes back empty.
pub async fn fetch_content(gateway: &AuthGateway, id: i64) -> Result<FileContent, AppError> {
    let (bytes, content_type) = gateway
        .send_bytes(&ApiRequest::get(content_path(id)))
        .await
        .map_err(|err| match err {
            AppError::Http { status, error } if status == 404 || status >= 500 => {
                AppError::NotFoundOrCorrupt(error.message())
            }
            other => other,
        })?;

    if bytes.is_empty() {
        return Err(AppError::NotFoundOrCorrupt(format!(
            "File {id} returned no content."
        )));
    }

    Ok(FileContent {
        bytes,
        content_type,
    })
}
