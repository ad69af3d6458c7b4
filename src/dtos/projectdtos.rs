use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::projectmodel::{EscrowStatus, Project, ProjectChanges, ProjectStatus};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(range(min = 0.01, message = "Budget must be greater than zero"))]
    pub budget: f64,

    pub deadline: DateTime<Utc>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProjectDto {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    #[validate(range(min = 0.01, message = "Budget must be greater than zero"))]
    pub budget: Option<f64>,

    pub deadline: Option<DateTime<Utc>>,
}

impl From<UpdateProjectDto> for ProjectChanges {
    fn from(dto: UpdateProjectDto) -> Self {
        ProjectChanges {
            description: dto.description,
            budget: dto.budget,
            deadline: dto.deadline,
        }
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CompletionUpdateDto {
    #[validate(range(min = 0, max = 100, message = "Percentage must be between 0 and 100"))]
    #[serde(rename = "completedpercentage")]
    pub completed_percentage: i32,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCompletionDto {
    #[validate(url(message = "Completion URL is invalid"))]
    #[serde(rename = "completionUrl")]
    pub completion_url: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RejectCompletionDto {
    #[validate(length(min = 1, message = "A rejection comment is required"))]
    #[serde(rename = "rejectionComment")]
    pub rejection_comment: String,

    #[validate(range(min = 0, max = 100, message = "Percentage must be between 0 and 100"))]
    #[serde(rename = "completedpercentage")]
    pub completed_percentage: Option<i32>,
}

/// The parts of a project shown next to bids and direct hires.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub budget: f64,
    pub deadline: DateTime<Utc>,
    pub status: ProjectStatus,
    #[serde(rename = "escrowStatus")]
    pub escrow_status: EscrowStatus,
}

impl From<&Project> for ProjectSummaryDto {
    fn from(project: &Project) -> Self {
        ProjectSummaryDto {
            id: project.id,
            title: project.title.clone(),
            budget: project.budget,
            deadline: project.deadline,
            status: project.lifecycle.status,
            escrow_status: project.lifecycle.escrow_status,
        }
    }
}
