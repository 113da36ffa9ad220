use crate::api::error::AppError;
use crate::models::{FileEntry, StoredObject};
use crate::services::drive_service::{ListQuery, SearchQuery};
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use serde::Deserialize;
use tokio_util::io::StreamReader;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateFolderRequest {
    #[validate(length(min = 1, max = 1024, message = "Folder name must be between 1 and 1024 characters"))]
    pub name: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadFileQuery {
    /// Full object key
    pub key: String,
}

pub async fn hello() -> &'static str {
    "Hello world"
}

#[utoipa::path(
    get,
    path = "/api/file",
    params(ListQuery),
    responses(
        (status = 200, description = "Direct children of the prefix, folders first", body = Vec<FileEntry>),
        (status = 500, description = "Object store failure")
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    let entries = state.drive.list(query).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/api/file/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Objects whose key contains the keyword", body = Vec<FileEntry>)
    ),
    tag = "files"
)]
pub async fn search_files(
    State(state): State<crate::AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<FileEntry>>, AppError> {
    let entries = state.drive.search(query).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/api/file/folder",
    request_body = CreateFolderRequest,
    responses(
        (status = 200, description = "Folder marker written"),
        (status = 409, description = "Folder already exists")
    ),
    tag = "files"
)]
pub async fn create_folder(
    State(state): State<crate::AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state.drive.create_folder(&req.name).await?;
    Ok(Json(serde_json::Value::Null))
}

#[utoipa::path(
    post,
    path = "/api/file/upload",
    request_body(content = Multipart, description = "Optional `path` field followed by the `file` part"),
    responses(
        (status = 200, description = "File stored"),
        (status = 400, description = "Missing file part"),
        (status = 415, description = "Content type not allowed")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<StatusCode, AppError> {
    let mut path = String::new();
    let mut stored: Option<StoredObject> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "path" {
            let late_path = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            match &stored {
                // the file part is streamed as it arrives, so its key is already fixed
                Some(object) => tracing::warn!(
                    "Ignoring `path` field {:?} sent after the file part, stored as {}",
                    late_path,
                    object.key
                ),
                None => path = late_path,
            }
        } else if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(|s| s.to_string());

            let body_with_io_error = field.map_err(std::io::Error::other);
            let reader = StreamReader::new(body_with_io_error);

            stored = Some(
                state
                    .drive
                    .upload(&path, &file_name, content_type.as_deref(), Box::new(reader))
                    .await?,
            );
        }
    }

    match stored {
        Some(object) => {
            tracing::info!("✅ Stored {} ({} bytes)", object.key, object.size);
            Ok(StatusCode::OK)
        }
        None => Err(AppError::BadRequest("Missing file part".to_string())),
    }
}

#[utoipa::path(
    get,
    path = "/api/file/content",
    params(ReadFileQuery),
    responses(
        (status = 200, description = "Raw object body"),
        (status = 404, description = "No object at this key")
    ),
    tag = "files"
)]
pub async fn read_file(
    State(state): State<crate::AppState>,
    Query(query): Query<ReadFileQuery>,
) -> Result<Response, AppError> {
    let data = state.drive.read_file(&query.key).await?;
    let content_type = data
        .content_type
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], data.bytes).into_response())
}
