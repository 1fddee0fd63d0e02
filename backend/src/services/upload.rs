//! Media upload service

use shared::types::{MediaAsset, MediaType};

use crate::error::{AppError, AppResult};
use crate::external::{CloudinaryClient, UploadFile};

/// Folder used when the client names none
pub const DEFAULT_FOLDER: &str = "uploads";

/// Target folder for a single upload: client folders live under `car-rental/`
pub fn single_upload_folder(folder: Option<&str>) -> String {
    match folder.map(str::trim).filter(|f| !f.is_empty()) {
        Some(folder) => format!("car-rental/{}", folder),
        None => DEFAULT_FOLDER.to_string(),
    }
}

/// File name without its final extension
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

fn ensure_allowed(file: &UploadFile) -> AppResult<()> {
    if MediaType::from_mime(&file.content_type).is_none() {
        return Err(AppError::BadRequest(
            "Only image and PDF files are allowed!".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UploadService {
    media: CloudinaryClient,
}

impl UploadService {
    pub fn new(media: CloudinaryClient) -> Self {
        Self { media }
    }

    /// Upload one file, replacing `old_public_id` when given
    pub async fn upload_single(
        &self,
        file: Option<UploadFile>,
        folder: Option<&str>,
        old_public_id: Option<&str>,
    ) -> AppResult<MediaAsset> {
        let file = file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
        ensure_allowed(&file)?;

        if let Some(old) = old_public_id.filter(|id| !id.is_empty()) {
            if let Err(e) = self.media.destroy(old).await {
                tracing::warn!("Failed to delete previous asset {}: {}", old, e);
            }
        }

        let folder = single_upload_folder(folder);
        let asset = self.media.upload(file, &folder, None).await?;
        tracing::info!("Uploaded {} to {}", asset.public_id, folder);
        Ok(asset)
    }

    /// Upload several files, each under its own file stem
    pub async fn upload_many(
        &self,
        files: Vec<UploadFile>,
        folder: Option<&str>,
    ) -> AppResult<Vec<MediaAsset>> {
        if files.is_empty() {
            return Err(AppError::BadRequest("No files uploaded".to_string()));
        }
        for file in &files {
            ensure_allowed(file)?;
        }

        let folder = folder
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FOLDER)
            .to_string();

        let mut assets = Vec::with_capacity(files.len());
        for file in files {
            let stem = file_stem(&file.file_name).to_string();
            assets.push(self.media.upload(file, &folder, Some(&stem)).await?);
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_upload_folder() {
        assert_eq!(single_upload_folder(Some("cars")), "car-rental/cars");
        assert_eq!(single_upload_folder(Some("  ")), "uploads");
        assert_eq!(single_upload_folder(None), "uploads");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("front.jpg"), "front");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem(".env"), ".env");
    }

    #[test]
    fn test_rejects_unsupported_types() {
        let file = UploadFile {
            file_name: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(ensure_allowed(&file).is_err());
    }
}
