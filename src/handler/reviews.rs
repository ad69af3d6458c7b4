use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{ApiResponse, AverageRatingDto, CreateReviewDto, ReviewCheckDto},
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    AppState,
};

pub fn reviews_handler() -> Router {
    Router::new()
        .route("/", post(create_review))
        .route("/received/:user_id", get(get_received_reviews))
        .route("/submitted/:user_id", get(get_submitted_reviews))
        .route("/project/:project_id", get(get_project_reviews))
        .route("/check/:project_id", get(check_review))
        .route("/average/:user_id", get(get_average_rating))
        .route_layer(middleware::from_fn(auth))
}

pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let review = app_state
        .review_service
        .create_review(
            &user.user,
            body.project_id,
            body.receiver_id,
            body.rating,
            &body.comment,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(review))))
}

pub async fn get_received_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .db_client
        .get_received_reviews(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(reviews)))
}

pub async fn get_submitted_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .db_client
        .get_submitted_reviews(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(reviews)))
}

pub async fn get_project_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .db_client
        .get_project_reviews(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(reviews)))
}

/// Whether the caller already reviewed the project.
pub async fn check_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state
        .db_client
        .get_review_by_reviewer(project_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(ReviewCheckDto {
        reviewed: review.is_some(),
        review,
    })))
}

pub async fn get_average_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let average_rating = app_state.review_service.average_rating(user_id).await?;

    Ok(Json(ApiResponse::success(AverageRatingDto { average_rating })))
}
