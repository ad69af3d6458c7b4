use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::service::payment_provider::CheckoutSession;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentDto {
    #[serde(rename = "projectId")]
    pub project_id: Uuid,

    #[validate(range(min = 0.01, message = "Amount must be greater than zero"))]
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponseDto {
    pub status: &'static str,
    pub id: String,
    pub url: String,
}

impl From<CheckoutSession> for CheckoutResponseDto {
    fn from(session: CheckoutSession) -> Self {
        CheckoutResponseDto {
            status: "success",
            id: session.id,
            url: session.url,
        }
    }
}
