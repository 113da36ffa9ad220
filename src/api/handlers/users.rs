use crate::api::error::AppError;
use crate::models::{NewProfile, Profile};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileResponse {
    pub ref_id: String,
}

#[utoipa::path(
    get,
    path = "/api/users/{identity}",
    params(
        ("identity" = String, Path, description = "External identity of the user")
    ),
    responses(
        (status = 200, description = "Stored profile", body = Profile),
        (status = 404, description = "No profile for this identity")
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    Path(identity): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let profile = state.profiles.find(&identity).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewProfile,
    responses(
        (status = 200, description = "Profile created", body = CreateProfileResponse)
    ),
    tag = "users"
)]
pub async fn create_profile(
    State(state): State<crate::AppState>,
    Json(req): Json<NewProfile>,
) -> Result<Json<CreateProfileResponse>, AppError> {
    if req.id.trim().is_empty() {
        return Err(AppError::BadRequest("Identity must not be empty".to_string()));
    }

    let ref_id = state.profiles.create(req).await?;
    Ok(Json(CreateProfileResponse { ref_id }))
}
