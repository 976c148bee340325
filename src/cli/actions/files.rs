use crate::cli::{
    actions::{enter, open_session, report},
    globals::GlobalArgs,
};
use crate::features::files::{
    UploadFile, fetch_content, list_files,
    types::{FileMetadata, format_size},
    upload_file,
};
use crate::routes::paths;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug)]
pub struct UploadArgs {
    pub file: PathBuf,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct PreviewArgs {
    pub id: i64,
    pub output: PathBuf,
}

/// Execute the upload action.
/// # Errors
/// Returns an error if the session is missing, the file is rejected or the upload fails.
pub async fn upload(args: UploadArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    enter(&session, paths::UPLOAD).await?;

    let file = UploadFile::from_path(&args.file).await.map_err(report)?;
    let response = upload_file(session.gateway(), file, args.description.as_deref())
        .await
        .map_err(report)?;

    println!(
        "{} (id {})",
        response
            .message
            .as_deref()
            .unwrap_or("File uploaded and encrypted"),
        response.file_info.id
    );
    Ok(())
}

/// Execute the files action.
/// # Errors
/// Returns an error if the session is missing or the listing fails.
pub async fn list(globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    enter(&session, paths::FILES).await?;

    let files = list_files(session.gateway()).await.map_err(report)?;
    if files.is_empty() {
        println!("No files uploaded yet.");
        return Ok(());
    }

    println!("{:>6}  {:<32}  {:<11}  {:>9}  UPLOADED", "ID", "NAME", "TYPE", "SIZE");
    for file in &files {
        println!("{}", listing_row(file));
    }
    Ok(())
}

fn listing_row(file: &FileMetadata) -> String {
    let mut row = format!(
        "{:>6}  {:<32}  {:<11}  {:>9}  {}",
        file.id,
        file.name,
        file.content_type.as_deref().unwrap_or("-"),
        file.size.map_or_else(|| "-".to_string(), format_size),
        file.uploaded_at.as_deref().unwrap_or("-"),
    );
    if let Some(description) = file.description.as_deref().filter(|d| !d.is_empty()) {
        row.push_str("\n        ");
        row.push_str(description);
    }
    row
}

/// Execute the preview action.
/// # Errors
/// Returns an error if the file is missing or corrupt, or the output cannot be written.
pub async fn preview(args: PreviewArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    enter(&session, paths::FILES).await?;

    let content = fetch_content(session.gateway(), args.id)
        .await
        .map_err(report)?;
    tokio::fs::write(&args.output, &content.bytes)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Saved {} ({}, {}) to {}",
        content.kind().as_str(),
        content.content_type.as_deref().unwrap_or("unknown type"),
        format_size(content.bytes.len() as u64),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::listing_row;
    use crate::features::files::FileMetadata;

    #[test]
    fn listing_row_shows_description_below() {
        let row = listing_row(&FileMetadata {
            id: 3,
            name: "cat.png".to_string(),
            size: Some(2048),
            content_type: Some("image/png".to_string()),
            description: Some("my cat".to_string()),
            uploaded_at: None,
        });
        assert!(row.contains("2.0 KB"));
        assert!(row.ends_with("\n        my cat"));
    }
}
