use serde::{Deserialize, Serialize};

/// Metadata of one stored file, as listed by the API.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
}

impl FileMetadata {
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.content_type
            .as_deref()
            .map_or(FileKind::Other, FileKind::from_mime)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub file_info: FileMetadata,
}

/// Broad media family, used to pick how a preview is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Audio,
    Other,
}

impl FileKind {
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Other => "file",
        }
    }
}

/// Decrypted file body returned by the content endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileContent {
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.content_type
            .as_deref()
            .map_or(FileKind::Other, FileKind::from_mime)
    }
}

impl std::fmt::Debug for FileContent {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FileContent")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Renders a byte count the way file listings show it.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
