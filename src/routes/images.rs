use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::ApiUser;
use crate::error::{ApiError, AppError};
use crate::media;
use crate::models::Image;
use crate::AppState;

#[derive(Serialize)]
pub struct ImageJson {
    pub id: i64,
    pub title: String,
    pub file: String,
    pub url: String,
    pub created: DateTime<Utc>,
}

impl From<Image> for ImageJson {
    fn from(image: Image) -> Self {
        let url = image.url();
        Self {
            id: image.id,
            title: image.title,
            file: image.file,
            url,
            created: image.created_at,
        }
    }
}

/// Image routes; uploads may be up to `max_upload_bytes` long.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/images/", get(list_images).post(upload_image))
        .route("/api/images/{id}/", delete(delete_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

async fn list_images(
    State(state): State<AppState>,
    _user: ApiUser,
) -> Result<Json<Vec<ImageJson>>, ApiError> {
    let images: Vec<Image> = sqlx::query_as("SELECT * FROM images ORDER BY created_at DESC, id DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(images.into_iter().map(ImageJson::from).collect()))
}

async fn upload_image(
    State(state): State<AppState>,
    _user: ApiUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title = String::new();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                upload = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (filename, bytes) = upload.unwrap_or_default();
    let image = media::create_image(&state.db, state.media.as_ref(), &title, &filename, &bytes).await?;
    Ok((StatusCode::CREATED, Json(ImageJson::from(image))))
}

async fn delete_image(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    media::delete_image(&state.db, state.media.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
