//! Cloudinary media storage client
//!
//! Uses signed uploads: the signature is the SHA-1 hex digest of the sorted
//! `key=value` parameters joined by `&`, followed by the API secret.

use reqwest::{multipart, Client};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use shared::types::MediaAsset;

use crate::config::CloudinaryConfig;
use crate::error::{AppError, AppResult};

/// Cloudinary API client
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    base_url: String,
}

/// A file received from a multipart upload
#[derive(Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Sign a parameter set
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a file into `folder`, optionally under a fixed public id
    pub async fn upload(
        &self,
        file: UploadFile,
        folder: &str,
        public_id: Option<&str>,
    ) -> AppResult<MediaAsset> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut params = vec![("folder", folder.to_string()), ("timestamp", timestamp.clone())];
        if let Some(id) = public_id {
            params.push(("public_id", id.to_string()));
        }
        let signature = sign_params(&params, &self.api_secret);

        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);
        if let Some(id) = public_id {
            form = form.text("public_id", id.to_string());
        }

        let url = format!("{}/{}/auto/upload", self.base_url, self.cloud_name);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!(
                "Upload rejected with status {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to parse upload response: {}", e)))?;

        Ok(MediaAsset {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    /// Delete a stored asset
    pub async fn destroy(&self, public_id: &str) -> AppResult<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = vec![("public_id", public_id.to_string()), ("timestamp", timestamp.clone())];
        let signature = sign_params(&params, &self.api_secret);

        let url = format!("{}/{}/image/destroy", self.base_url, self.cloud_name);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id.to_string()),
                ("timestamp", timestamp),
                ("api_key", self.api_key.clone()),
                ("signature", signature),
            ])
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Destroy request failed: {}", e)))?;

        let result: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to parse destroy response: {}", e)))?;

        if result.result != "ok" {
            return Err(AppError::StorageError(format!(
                "Asset {} not destroyed: {}",
                public_id, result.result
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params_and_skips_empty() {
        let a = sign_params(
            &[("timestamp", "1315060510".into()), ("public_id", "sample".into())],
            "abcd",
        );
        let b = sign_params(
            &[
                ("public_id", "sample".into()),
                ("folder", String::new()),
                ("timestamp", "1315060510".into()),
            ],
            "abcd",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_signature_known_value() {
        // sha1("public_id=sample&timestamp=1315060510abcd")
        let sig = sign_params(
            &[("public_id", "sample".into()), ("timestamp", "1315060510".into())],
            "abcd",
        );
        let mut hasher = Sha1::new();
        hasher.update(b"public_id=sample&timestamp=1315060510abcd");
        assert_eq!(sig, hex::encode(hasher.finalize()));
    }
}
