use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::freelancermodel::FreelancerInformation;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct FreelancerInformationDto {
    #[validate(length(min = 1, message = "At least one skill is required"))]
    pub skills: Vec<String>,
    #[serde(default)]
    pub portfolio: String,
    #[serde(default)]
    pub experience: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateFreelancerDto {
    #[validate(length(min = 1, message = "At least one skill is required"))]
    pub skills: Option<Vec<String>>,
    pub portfolio: Option<String>,
    pub experience: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FreelancerStatsDto {
    pub earnings: f64,
    #[serde(rename = "projectsCompleted")]
    pub projects_completed: i32,
    pub reviews: f64,
}

impl From<&FreelancerInformation> for FreelancerStatsDto {
    fn from(info: &FreelancerInformation) -> Self {
        FreelancerStatsDto {
            earnings: info.earnings,
            projects_completed: info.projects_completed,
            reviews: info.reviews,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResponseDto {
    pub status: String,
    pub exists: bool,
}
