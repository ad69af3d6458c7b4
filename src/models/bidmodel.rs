use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::projectmodel::Project;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    Pending,
    Selected,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Bid {
    pub id: Uuid,

    #[serde(rename = "projectId")]
    pub project_id: Uuid,

    #[serde(rename = "freelancerId")]
    pub freelancer_id: Uuid,

    pub amount: f64,
    pub status: BidStatus,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct DirectHire {
    pub id: Uuid,

    #[serde(rename = "freelancerId")]
    pub freelancer_id: Uuid,

    #[serde(rename = "clientId")]
    pub client_id: Uuid,

    #[serde(rename = "projectId")]
    pub project_id: Uuid,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// The offer an engagement is made from. It must still be on the table when
/// the engagement is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementOffer {
    SelectedBid(Uuid),
    DirectHire(Uuid),
}

/// Outcome of removing a bid: the deleted bid and the project as it stands
/// afterwards (reverted to open when the last bid on a selected project left).
#[derive(Debug, Clone)]
pub struct BidRemoval {
    pub bid: Bid,
    pub project: Project,
    pub reverted: bool,
}
