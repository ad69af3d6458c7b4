use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::reviewmodel::Review;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewDto {
    #[serde(rename = "projectId")]
    pub project_id: Uuid,

    #[serde(rename = "receiverId")]
    pub receiver_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Comment is too long"))]
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewCheckDto {
    pub reviewed: bool,
    pub review: Option<Review>,
}

#[derive(Debug, Serialize)]
pub struct AverageRatingDto {
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
}
