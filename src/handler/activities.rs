use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{ApiResponse, CreateActivityDto},
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    AppState,
};

pub fn activities_handler() -> Router {
    Router::new()
        .route("/", get(get_activities).post(create_activity))
        .route_layer(middleware::from_fn(auth))
}

pub async fn get_activities(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let activities = app_state
        .db_client
        .get_activities(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(activities)))
}

pub async fn create_activity(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateActivityDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let activity = app_state
        .notification_service
        .log_activity(user.user.id, body.action.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(activity))))
}
