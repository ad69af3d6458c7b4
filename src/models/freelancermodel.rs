use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-to-one profile of a freelancer user. `earnings`, `reviews` (average
/// client rating) and `projects_completed` are denormalized counters.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct FreelancerInformation {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub skills: Vec<String>,
    pub portfolio: String,
    pub experience: String,
    pub earnings: f64,
    pub reviews: f64,
    #[serde(rename = "projectsCompleted")]
    pub projects_completed: i32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct FreelancerDirectoryEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub portfolio: String,
    pub experience: String,
}
