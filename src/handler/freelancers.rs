use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{ApiResponse, ExistsResponseDto, FreelancerInformationDto, FreelancerStatsDto, UpdateFreelancerDto},
    error::HttpError,
    handler::users::delete_account,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn freelancers_handler() -> Router {
    Router::new()
        .route(
            "/",
            post(create_information).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Freelancer])
            })),
        )
        .route(
            "/delete",
            delete(delete_account).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Freelancer])
            })),
        )
        .route("/:user_id", get(get_information).put(update_information))
        .route("/check/:user_id", get(check_information))
        .route("/stats/:user_id", get(get_stats))
        .route_layer(middleware::from_fn(auth))
}

pub async fn get_information(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let info = app_state
        .db_client
        .get_freelancer_information(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Freelancer information not found"))?;

    Ok(Json(ApiResponse::success(info)))
}

pub async fn check_information(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let info = app_state
        .db_client
        .get_freelancer_information(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ExistsResponseDto {
        status: "success".to_string(),
        exists: info.is_some(),
    }))
}

pub async fn create_information(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<FreelancerInformationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let info = app_state
        .db_client
        .create_freelancer_information(
            user.user.id,
            body.skills,
            body.portfolio.trim(),
            body.experience.trim(),
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::bad_request("Freelancer information already exists"))?;

    app_state
        .notification_service
        .log_activity(user.user.id, "Created freelancer profile")
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(info))))
}

pub async fn update_information(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateFreelancerDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if user.user.id != user_id {
        return Err(HttpError::forbidden("You can only update your own profile"));
    }

    let info = app_state
        .db_client
        .update_freelancer_information(user_id, body.skills, body.portfolio, body.experience)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Freelancer information not found"))?;

    app_state
        .notification_service
        .log_activity(user_id, "Updated freelancer profile")
        .await?;

    Ok(Json(ApiResponse::success(info)))
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let info = app_state
        .db_client
        .get_freelancer_information(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Freelancer information not found"))?;

    Ok(Json(ApiResponse::success(FreelancerStatsDto::from(&info))))
}
