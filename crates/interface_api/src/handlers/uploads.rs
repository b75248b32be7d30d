//! File uploads (logos, receipts, attachments)

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::auth::Session;
use crate::dto::platform::UploadResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Stores the multipart field named `file` and returns its public URL
pub async fn upload_file(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error("Malformed upload", e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| read_error("Failed to read upload", e))?;

        let url = state.uploads.save(&content_type, &bytes).await?;
        info!(account_id = %session.account_id, role = session.role.as_str(), %url, "File uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                url,
                content_type,
                size: bytes.len(),
            }),
        ));
    }

    Err(ApiError::BadRequest(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// A body cut off by the request size limit is a 413, anything else a 400
fn read_error(context: &str, error: MultipartError) -> ApiError {
    let message = format!("{}: {}", context, error.body_text());
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}
