pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::drive_service::DriveService;
use crate::services::profile_service::ProfileStore;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::list_files,
        api::handlers::files::search_files,
        api::handlers::files::create_folder,
        api::handlers::files::upload_file,
        api::handlers::files::read_file,
        api::handlers::users::get_profile,
        api::handlers::users::create_profile,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::EntryKind,
            models::FileEntry,
            models::Profile,
            models::NewProfile,
            api::handlers::files::CreateFolderRequest,
            api::handlers::users::CreateProfileResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "Virtual file tree over the object store"),
        (name = "users", description = "User profile endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub drive: Arc<DriveService>,
    pub profiles: Arc<dyn ProfileStore>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api", get(api::handlers::files::hello))
        .route("/api/file", get(api::handlers::files::list_files))
        .route("/api/file/search", get(api::handlers::files::search_files))
        .route("/api/file/content", get(api::handlers::files::read_file))
        .route("/api/file/folder", post(api::handlers::files::create_folder))
        .route(
            "/api/file/upload",
            post(api::handlers::files::upload_file).layer(axum::extract::DefaultBodyLimit::max(
                state.config.max_upload_size,
            )),
        )
        .route("/api/users", post(api::handlers::users::create_profile))
        .route("/api/users/:identity", get(api::handlers::users::get_profile))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}
