use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,

    #[serde(rename = "user")]
    pub user_id: Uuid,

    #[serde(rename = "project")]
    pub project_id: Option<Uuid>,

    pub message: String,
    pub read: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Activity {
    pub id: Uuid,

    #[serde(rename = "userId")]
    pub user_id: Uuid,

    pub action: String,

    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct LearningMaterial {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub link: String,

    #[serde(rename = "postedBy")]
    pub posted_by: Option<Uuid>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}
