//! Encrypted file storage: local upload checks, upload, listing and preview of
//! the decrypted content. Encryption happens on the server; the client only
//! moves opaque bytes.

pub mod client;
pub mod types;
pub mod upload;

pub use client::{fetch_content, list_files, upload_file};
pub use types::{FileContent, FileKind, FileMetadata, UploadResponse};
pub use upload::{UploadFile, validate_upload};
