use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::projectstate::{LifecycleError, ProjectState};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Pending,
    Selected,
    Accepted,
    Done,
}

impl ProjectStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Selected => "selected",
            ProjectStatus::Accepted => "accepted",
            ProjectStatus::Done => "done",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "escrow_status")]
pub enum EscrowStatus {
    #[sqlx(rename = "Not Funded")]
    #[serde(rename = "Not Funded")]
    NotFunded,
    Funded,
    Released,
    Refunded,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "approval_status")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "claim_status")]
pub enum ClaimStatus {
    Pending,
    Claimed,
}

/// Flat, persisted form of a project's lifecycle. Only ever produced from a
/// [`ProjectState`], so every stored combination is one the state machine can
/// reach.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ProjectLifecycle {
    pub status: ProjectStatus,

    #[serde(rename = "escrowStatus")]
    pub escrow_status: EscrowStatus,

    #[serde(rename = "approvalStatus")]
    pub approval_status: ApprovalStatus,

    #[serde(rename = "claimStatus")]
    pub claim_status: ClaimStatus,

    #[serde(rename = "acceptedFreelancer")]
    pub accepted_freelancer: Option<Uuid>,

    #[serde(rename = "acceptedmoney")]
    pub accepted_money: Option<f64>,

    #[serde(rename = "completedpercentage")]
    pub completed_percentage: i32,

    #[serde(rename = "completionUrl")]
    pub completion_url: Option<String>,

    #[serde(rename = "rejectionComment")]
    pub rejection_comment: Option<String>,

    #[serde(rename = "paymentIntentId")]
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,

    #[serde(rename = "client")]
    pub client_id: Uuid,

    pub title: String,
    pub description: String,
    pub budget: f64,
    pub deadline: DateTime<Utc>,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lifecycle: ProjectLifecycle,

    #[serde(skip_serializing)]
    pub version: i64,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn state(&self) -> Result<ProjectState, LifecycleError> {
        ProjectState::try_from(&self.lifecycle)
    }

    pub fn is_client(&self, user_id: Uuid) -> bool {
        self.client_id == user_id
    }
}

/// Editable fields of a project; the lifecycle is never touched by edits.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.budget.is_none()
            && self.deadline.is_none()
    }
}
