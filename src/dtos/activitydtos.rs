use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityDto {
    #[validate(length(min = 1, max = 500, message = "Action is required"))]
    pub action: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateLearningMaterialDto {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(url(message = "Link is invalid"))]
    pub link: String,
}

#[derive(Debug, Serialize)]
pub struct MarkedReadDto {
    pub updated: u64,
}
