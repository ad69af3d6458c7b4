use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    #[sqlx(rename = "Freelancer Paid")]
    #[serde(rename = "Freelancer Paid")]
    FreelancerPaid,
    Failed,
}

/// Escrow ledger entry, one per project.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Payment {
    pub id: Uuid,

    #[serde(rename = "project")]
    pub project_id: Uuid,

    #[serde(rename = "client")]
    pub client_id: Uuid,

    #[serde(rename = "freelancer")]
    pub freelancer_id: Option<Uuid>,

    pub amount: f64,
    pub status: PaymentStatus,

    #[serde(rename = "paymentIntentId")]
    pub payment_intent_id: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// What a completed checkout session was opened for. Travels through the
/// gateway as session metadata and comes back with the webhook.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutAction {
    CreatePaymentIntent,
    ClaimMoney,
    ClaimRemaining,
    RefundEscrow,
}

impl CheckoutAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutAction::CreatePaymentIntent => "create-payment-intent",
            CheckoutAction::ClaimMoney => "claim-money",
            CheckoutAction::ClaimRemaining => "claim-remaining",
            CheckoutAction::RefundEscrow => "refund-escrow",
        }
    }
}

impl fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckoutAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create-payment-intent" => Ok(CheckoutAction::CreatePaymentIntent),
            "claim-money" => Ok(CheckoutAction::ClaimMoney),
            "claim-remaining" => Ok(CheckoutAction::ClaimRemaining),
            "refund-escrow" => Ok(CheckoutAction::RefundEscrow),
            other => Err(format!("Unknown checkout action: {}", other)),
        }
    }
}
