use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::projectdtos::ProjectSummaryDto;
use crate::models::{
    bidmodel::{Bid, DirectHire},
    freelancermodel::FreelancerInformation,
    projectmodel::Project,
};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct BidAmountDto {
    #[validate(range(min = 0.01, message = "Bid amount must be greater than zero"))]
    pub amount: f64,
}

/// A bid as the client sees it when comparing bidders.
#[derive(Debug, Serialize)]
pub struct BidWithBidderDto {
    #[serde(flatten)]
    pub bid: Bid,
    #[serde(rename = "freelancerName")]
    pub freelancer_name: String,
    #[serde(rename = "freelancerEmail")]
    pub freelancer_email: String,
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
    #[serde(rename = "freelancerInformation")]
    pub freelancer_information: Option<FreelancerInformation>,
}

#[derive(Debug, Serialize)]
pub struct SelectedBidDto {
    #[serde(flatten)]
    pub bid: Bid,
    pub project: ProjectSummaryDto,
}

#[derive(Debug, Serialize)]
pub struct BidDecisionDto {
    pub bid: Bid,
    pub project: Project,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectHireDto {
    #[serde(rename = "freelancerId")]
    pub freelancer_id: Uuid,
    #[serde(rename = "projectId")]
    pub project_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DirectHireWithProjectDto {
    #[serde(flatten)]
    pub direct_hire: DirectHire,
    pub project: Option<ProjectSummaryDto>,
}
