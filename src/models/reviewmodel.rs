use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "reviewer_type", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum ReviewerType {
    Client,
    Freelancer,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,

    #[serde(rename = "projectId")]
    pub project_id: Uuid,

    #[serde(rename = "reviewerId")]
    pub reviewer_id: Uuid,

    #[serde(rename = "receiverId")]
    pub receiver_id: Uuid,

    pub rating: i32,
    pub comment: String,

    #[serde(rename = "reviewerType")]
    pub reviewer_type: ReviewerType,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
