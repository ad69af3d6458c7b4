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
    dtos::{
        ApiResponse, CompletionUpdateDto, CreateProjectDto, RejectCompletionDto, Response,
        SubmitCompletionDto, UpdateProjectDto,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::project_service::{NewProject, FEATURED_PROJECTS},
    AppState,
};

pub fn projects_handler() -> Router {
    Router::new()
        .route(
            "/create",
            post(create_project).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Client])
            })),
        )
        .route("/", get(get_projects))
        .route("/:id", get(get_project))
        .route("/client/projects", get(get_client_projects))
        .route("/client/update/:id", put(update_project))
        .route("/client/delete/:id", delete(delete_project))
        .route(
            "/admin/:id",
            delete(delete_project).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route("/update-completion/:id", put(update_completion))
        .route("/submit-completion/:id", put(submit_completion))
        .route("/approve-completion/:id", put(approve_completion))
        .route("/reject-approval/:id", put(reject_completion))
        .route_layer(middleware::from_fn(auth))
        .merge(Router::new().route("/featured", get(get_featured_projects)))
}

pub async fn create_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let project = app_state
        .project_service
        .create_project(
            &user.user,
            NewProject {
                title: body.title,
                description: body.description,
                budget: body.budget,
                deadline: body.deadline,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn get_projects(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let projects = app_state
        .db_client
        .get_projects()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(projects)))
}

pub async fn get_featured_projects(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let projects = app_state
        .db_client
        .get_latest_projects(FEATURED_PROJECTS)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state.project_service.get_project(project_id).await?;
    Ok(Json(ApiResponse::success(project)))
}

pub async fn get_client_projects(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let projects = app_state
        .db_client
        .get_client_projects(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(projects)))
}

pub async fn update_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<UpdateProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let project = app_state
        .project_service
        .update_project(&user.user, project_id, body.into())
        .await?;

    Ok(Json(ApiResponse::success(project)))
}

/// Shared by the client and admin routes; the service decides who may delete.
pub async fn delete_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .project_service
        .delete_project(&user.user, project_id)
        .await?;

    Ok(Json(Response::success("Project deleted")))
}

pub async fn update_completion(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CompletionUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let project = app_state
        .project_service
        .update_completion(&user.user, project_id, body.completed_percentage)
        .await?;

    Ok(Json(ApiResponse::success(project)))
}

pub async fn submit_completion(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<SubmitCompletionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let project = app_state
        .project_service
        .submit_completion(&user.user, project_id, &body.completion_url)
        .await?;

    Ok(Json(ApiResponse::success(project)))
}

pub async fn approve_completion(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .project_service
        .approve_completion(&user.user, project_id)
        .await?;

    Ok(Json(ApiResponse::success(project)))
}

pub async fn reject_completion(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<RejectCompletionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let project = app_state
        .project_service
        .reject_completion(
            &user.user,
            project_id,
            &body.rejection_comment,
            body.completed_percentage,
        )
        .await?;

    Ok(Json(ApiResponse::success(project)))
}
