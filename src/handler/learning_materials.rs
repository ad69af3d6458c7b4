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
    dtos::{ApiResponse, CreateLearningMaterialDto, Response},
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn learning_materials_handler() -> Router {
    Router::new()
        .route("/", post(create_material))
        .route("/:id", delete(delete_material))
        .route_layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Admin])
        }))
        .route_layer(middleware::from_fn(auth))
        .merge(Router::new().route("/", get(get_materials)))
}

pub async fn get_materials(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let materials = app_state
        .db_client
        .get_learning_materials()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(materials)))
}

pub async fn create_material(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateLearningMaterialDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let material = app_state
        .db_client
        .create_learning_material(
            body.title.trim(),
            body.description.trim(),
            body.link.trim(),
            user.user.id,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(material))))
}

pub async fn delete_material(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(material_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_learning_material(material_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !deleted {
        return Err(HttpError::not_found("Learning material not found"));
    }

    Ok(Json(Response::success("Learning material deleted")))
}
