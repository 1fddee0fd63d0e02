//! Media upload handlers

use axum::{
    extract::{multipart::Field, Multipart, State},
    response::IntoResponse,
    Json,
};
use shared::types::ApiResponse;

use crate::error::{AppError, AppResult};
use crate::external::UploadFile;
use crate::services::UploadService;
use crate::AppState;

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {}", e))
}

async fn read_file(field: Field<'_>) -> AppResult<UploadFile> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
    Ok(UploadFile {
        file_name,
        content_type,
        bytes,
    })
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(multipart_error)
}

/// Upload one `image`, optionally replacing `oldImagePublicId`
pub async fn upload_single(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file = None;
    let mut folder = None;
    let mut old_public_id = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => file = Some(read_file(field).await?),
            Some("folder") => folder = Some(read_text(field).await?),
            Some("oldImagePublicId") => old_public_id = Some(read_text(field).await?),
            _ => {}
        }
    }

    let asset = UploadService::new(state.media)
        .upload_single(file, folder.as_deref(), old_public_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::new("Image uploaded successfully", asset)))
}

/// Upload every `images[]` part into one folder
pub async fn upload_multiple(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut files = Vec::new();
    let mut folder = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("images") | Some("images[]") => files.push(read_file(field).await?),
            Some("folder") => folder = Some(read_text(field).await?),
            _ => {}
        }
    }

    let assets = UploadService::new(state.media)
        .upload_many(files, folder.as_deref())
        .await?;
    Ok(Json(ApiResponse::new("Images uploaded successfully", assets)))
}
