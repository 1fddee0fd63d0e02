//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Standard success envelope returned by every API endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// Envelope with `data: null`
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, ())
    }
}

/// Reference to a stored media asset (image or document)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub public_id: String,
    pub url: String,
}

/// Kinds of upload accepted by the media endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Document,
}

impl MediaType {
    /// Classify a MIME type. Only images and PDFs are accepted.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(MediaType::Image)
        } else if mime == "application/pdf" {
            Some(MediaType::Document)
        } else {
            None
        }
    }
}

/// Lightweight user reference embedded in populated responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: uuid::Uuid,
    pub full_name: String,
    pub initials: String,
}

/// Label/count pair used for facet aggregations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FacetCount<T> {
    pub label: T,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_mime() {
        assert_eq!(MediaType::from_mime("image/png"), Some(MediaType::Image));
        assert_eq!(MediaType::from_mime("image/jpeg"), Some(MediaType::Image));
        assert_eq!(MediaType::from_mime("application/pdf"), Some(MediaType::Document));
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert_eq!(MediaType::from_mime("application/zip"), None);
    }

    #[test]
    fn test_envelope_serializes_null_data() {
        let json = serde_json::to_value(ApiResponse::message("Done")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Done");
        assert!(json["data"].is_null());
    }
}
