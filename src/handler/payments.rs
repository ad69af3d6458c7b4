use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{ApiResponse, CheckoutResponseDto, CreatePaymentIntentDto},
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    AppState,
};

const SIGNATURE_HEADER: &str = "Stripe-Signature";

pub fn payments_handler() -> Router {
    Router::new()
        .route("/", get(get_payments))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/claim-money/:project_id", post(claim_money))
        .route("/claim-remaining/:project_id", post(claim_remaining))
        .route("/refund-escrow/:project_id", post(refund_escrow))
        .route_layer(middleware::from_fn(auth))
        .merge(Router::new().route("/webhook", post(webhook)))
}

pub async fn create_payment_intent(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreatePaymentIntentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let session = app_state
        .payment_service
        .create_funding_checkout(&user.user, body.project_id, body.amount)
        .await?;

    Ok(Json(CheckoutResponseDto::from(session)))
}

pub async fn claim_money(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let session = app_state
        .payment_service
        .create_claim_money_checkout(&user.user, project_id)
        .await?;

    Ok(Json(CheckoutResponseDto::from(session)))
}

pub async fn claim_remaining(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let session = app_state
        .payment_service
        .create_claim_remaining_checkout(&user.user, project_id)
        .await?;

    Ok(Json(CheckoutResponseDto::from(session)))
}

pub async fn refund_escrow(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let session = app_state
        .payment_service
        .create_refund_checkout(&user.user, project_id)
        .await?;

    Ok(Json(CheckoutResponseDto::from(session)))
}

pub async fn get_payments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state
        .payment_service
        .get_client_payments(&user.user)
        .await?;

    Ok(Json(ApiResponse::success(payments)))
}

/// Gateway callback. Takes the raw body because the signature covers it
/// byte for byte.
pub async fn webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::bad_request("Missing webhook signature"))?;

    let outcome = app_state
        .payment_service
        .handle_webhook(&body, signature)
        .await?;

    tracing::info!("Webhook processed: {:?}", outcome);
    Ok(Json(ApiResponse::success(outcome)))
}
