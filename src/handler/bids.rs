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
    dtos::{ApiResponse, BidAmountDto, BidDecisionDto, BidWithBidderDto, ProjectSummaryDto, SelectedBidDto},
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::bid_service::BidRemovalKind,
    AppState,
};

pub fn bids_handler() -> Router {
    Router::new()
        .route("/selected", get(get_selected_bids))
        .route("/:id", get(get_project_bids).put(update_bid).delete(withdraw_bid))
        .route("/:id/my-bid", get(get_my_bid))
        .route(
            "/:id/bid",
            post(submit_bid).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Freelancer])
            })),
        )
        .route("/select/:id", put(select_bid))
        .route("/accept/:id", put(accept_bid))
        .route("/reject/:id", delete(reject_bid))
        .route_layer(middleware::from_fn(auth))
}

pub async fn get_selected_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state
        .db_client
        .get_selected_bids(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut selected = Vec::with_capacity(bids.len());
    for bid in bids {
        let project = app_state.project_service.get_project(bid.project_id).await?;
        selected.push(SelectedBidDto {
            project: ProjectSummaryDto::from(&project),
            bid,
        });
    }

    Ok(Json(ApiResponse::success(selected)))
}

/// Bids on a project, each with the bidder's contact, rating and profile.
pub async fn get_project_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state.project_service.get_project(project_id).await?;
    let bids = app_state
        .db_client
        .get_project_bids(project.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut detailed = Vec::with_capacity(bids.len());
    for bid in bids {
        let Some(bidder) = app_state
            .db_client
            .get_user(Some(bid.freelancer_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
        else {
            tracing::warn!("Bid {} references missing user {}", bid.id, bid.freelancer_id);
            continue;
        };
        let average_rating = app_state.review_service.average_rating(bidder.id).await?;
        let freelancer_information = app_state
            .db_client
            .get_freelancer_information(bidder.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        detailed.push(BidWithBidderDto {
            bid,
            freelancer_name: bidder.name,
            freelancer_email: bidder.email,
            average_rating,
            freelancer_information,
        });
    }

    Ok(Json(ApiResponse::success(detailed)))
}

pub async fn get_my_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state
        .db_client
        .get_freelancer_bid(project_id, user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(bid)))
}

pub async fn submit_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<BidAmountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bid = app_state
        .bid_service
        .submit_bid(&user.user, project_id, body.amount)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(bid))))
}

pub async fn update_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<Uuid>,
    Json(body): Json<BidAmountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bid = app_state
        .bid_service
        .update_bid(&user.user, bid_id, body.amount)
        .await?;

    Ok(Json(ApiResponse::success(bid)))
}

pub async fn select_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (project, bid) = app_state.bid_service.select_bid(&user.user, bid_id).await?;

    Ok(Json(ApiResponse::with_message(
        "Bid selected",
        BidDecisionDto { bid, project },
    )))
}

pub async fn accept_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (project, bid) = app_state.bid_service.accept_bid(&user.user, bid_id).await?;

    Ok(Json(ApiResponse::with_message(
        "Bid accepted",
        BidDecisionDto { bid, project },
    )))
}

pub async fn reject_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let removal = app_state
        .bid_service
        .remove_bid(&user.user, bid_id, BidRemovalKind::Rejected)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Bid rejected",
        removal.project,
    )))
}

pub async fn withdraw_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let removal = app_state
        .bid_service
        .remove_bid(&user.user, bid_id, BidRemovalKind::Withdrawn)
        .await?;

    Ok(Json(ApiResponse::with_message(
        "Bid deleted",
        removal.project,
    )))
}
