use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{ApiResponse, CreateDirectHireDto, DirectHireWithProjectDto, ProjectSummaryDto},
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::{bidmodel::DirectHire, usermodel::UserRole},
    AppState,
};

pub fn direct_hire_handler() -> Router {
    Router::new()
        .route(
            "/",
            post(create_direct_hire).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Client])
            })),
        )
        .route("/client", get(get_client_direct_hires))
        .route("/freelancer", get(get_freelancer_direct_hires))
        .route("/details/:project_id", get(get_project_direct_hires))
        .route("/accept/:id", put(accept_direct_hire))
        .route("/reject/:id", delete(reject_direct_hire))
        .route_layer(middleware::from_fn(auth))
}

async fn with_projects(
    app_state: &AppState,
    hires: Vec<DirectHire>,
) -> Result<Vec<DirectHireWithProjectDto>, HttpError> {
    let mut detailed = Vec::with_capacity(hires.len());
    for direct_hire in hires {
        let project = app_state
            .db_client
            .get_project(direct_hire.project_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        detailed.push(DirectHireWithProjectDto {
            project: project.as_ref().map(ProjectSummaryDto::from),
            direct_hire,
        });
    }
    Ok(detailed)
}

pub async fn create_direct_hire(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateDirectHireDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let hire = app_state
        .bid_service
        .create_direct_hire(&user.user, body.freelancer_id, body.project_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(hire))))
}

pub async fn get_client_direct_hires(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let hires = app_state
        .db_client
        .get_client_direct_hires(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(with_projects(&app_state, hires).await?)))
}

pub async fn get_freelancer_direct_hires(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let hires = app_state
        .db_client
        .get_freelancer_direct_hires(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(with_projects(&app_state, hires).await?)))
}

pub async fn get_project_direct_hires(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state.project_service.get_project(project_id).await?;
    let hires = app_state
        .db_client
        .get_project_direct_hires(project.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // a freelancer only sees their own offer
    let hires: Vec<DirectHire> = if project.is_client(user.user.id) || user.user.is_admin() {
        hires
    } else {
        hires
            .into_iter()
            .filter(|hire| hire.freelancer_id == user.user.id)
            .collect()
    };

    Ok(Json(ApiResponse::success(with_projects(&app_state, hires).await?)))
}

pub async fn accept_direct_hire(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(direct_hire_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .bid_service
        .accept_direct_hire(&user.user, direct_hire_id)
        .await?;

    Ok(Json(ApiResponse::with_message("Direct hire accepted", project)))
}

pub async fn reject_direct_hire(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(direct_hire_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let hire = app_state
        .bid_service
        .reject_direct_hire(&user.user, direct_hire_id)
        .await?;

    Ok(Json(ApiResponse::with_message("Direct hire rejected", hire)))
}
