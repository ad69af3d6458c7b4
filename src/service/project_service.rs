use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        projectmodel::{Project, ProjectChanges},
        projectstate::ProjectState,
        usermodel::User,
    },
    service::{error::ServiceError, notification_service::NotificationService},
};

pub const FEATURED_PROJECTS: i64 = 6;

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

pub(crate) async fn load_project(
    db_client: &dyn MarketStore,
    project_id: Uuid,
) -> Result<Project, ServiceError> {
    db_client
        .get_project(project_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Project"))
}

/// Persists `next` if nobody else changed the project since it was read.
pub(crate) async fn save_state(
    db_client: &dyn MarketStore,
    project: &Project,
    next: &ProjectState,
) -> Result<Project, ServiceError> {
    let updated = db_client
        .update_project_lifecycle(project.id, project.version, &next.to_lifecycle())
        .await?
        .ok_or_else(ServiceError::concurrent_update)?;

    tracing::info!(
        "Project {} moved to {} (escrow {:?})",
        updated.id,
        updated.lifecycle.status.to_str(),
        updated.lifecycle.escrow_status
    );
    Ok(updated)
}

fn ensure_client(project: &Project, user: &User) -> Result<(), ServiceError> {
    if project.is_client(user.id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden(
            "Only the project's client can perform this action",
        ))
    }
}

fn ensure_freelancer(state: &ProjectState, user: &User) -> Result<(), ServiceError> {
    match state.engagement() {
        Some(e) if e.freelancer == user.id => Ok(()),
        _ => Err(ServiceError::forbidden(
            "Only the accepted freelancer can perform this action",
        )),
    }
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub deadline: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ProjectService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
}

impl ProjectService {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    pub async fn get_project(&self, project_id: Uuid) -> Result<Project, ServiceError> {
        load_project(self.db_client.as_ref(), project_id).await
    }

    pub async fn create_project(
        &self,
        client: &User,
        input: NewProject,
    ) -> Result<Project, ServiceError> {
        let title = input.title.trim();
        if title.is_empty() || input.description.trim().is_empty() {
            return Err(ServiceError::validation("Title and description are required"));
        }
        if input.budget.is_nan() || input.budget <= 0.0 {
            return Err(ServiceError::validation("Budget must be greater than zero"));
        }
        if input.deadline < start_of_day(Utc::now()) {
            return Err(ServiceError::validation("Deadline cannot be in the past"));
        }

        let project = self
            .db_client
            .create_project(
                client.id,
                title,
                input.description.trim(),
                input.budget,
                input.deadline,
            )
            .await?
            .ok_or_else(|| ServiceError::conflict("You already have a project with this title"))?;

        tracing::info!("Client {} created project {}", client.id, project.id);
        self.notification_service
            .log_activity(client.id, format!("Created project \"{}\"", project.title))
            .await?;

        Ok(project)
    }

    pub async fn update_project(
        &self,
        client: &User,
        project_id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Project, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("Nothing to update"));
        }

        let project = self.get_project(project_id).await?;
        ensure_client(&project, client)?;

        if project.state()?.is_engaged() {
            return Err(ServiceError::invalid_state(
                "Project cannot be edited once a freelancer is accepted",
            ));
        }
        if !self
            .db_client
            .get_project_direct_hires(project.id)
            .await?
            .is_empty()
        {
            return Err(ServiceError::invalid_state(
                "Project cannot be edited while a direct hire offer is open",
            ));
        }
        if let Some(deadline) = changes.deadline {
            if deadline < start_of_day(Utc::now()) {
                return Err(ServiceError::validation("Deadline cannot be in the past"));
            }
        }
        if let Some(budget) = changes.budget {
            if budget.is_nan() || budget <= 0.0 {
                return Err(ServiceError::validation("Budget must be greater than zero"));
            }
            let bids = self.db_client.get_project_bids(project.id).await?;
            if bids.iter().any(|bid| bid.amount > budget) {
                return Err(ServiceError::validation(
                    "Budget cannot be lower than an existing bid",
                ));
            }
        }

        let updated = self
            .db_client
            .update_project_details(project.id, project.version, &changes)
            .await?
            .ok_or_else(ServiceError::concurrent_update)?;

        self.notification_service
            .log_activity(client.id, format!("Updated project \"{}\"", updated.title))
            .await?;

        Ok(updated)
    }

    /// Deletes an open, unfunded project. Admins may delete any such project.
    pub async fn delete_project(&self, caller: &User, project_id: Uuid) -> Result<(), ServiceError> {
        let project = self.get_project(project_id).await?;

        if !project.state()?.is_deletable() {
            return Err(ServiceError::invalid_state(
                "Project can only be deleted while pending with no funded escrow",
            ));
        }
        if !caller.is_admin() {
            ensure_client(&project, caller)?;
        }

        if !self.db_client.delete_project_if_open(project.id).await? {
            return Err(ServiceError::invalid_state(
                "Project can only be deleted while pending with no funded escrow",
            ));
        }

        tracing::info!("Project {} deleted by {}", project.id, caller.id);
        self.notification_service
            .log_activity(caller.id, format!("Deleted project \"{}\"", project.title))
            .await?;

        Ok(())
    }

    pub async fn update_completion(
        &self,
        freelancer: &User,
        project_id: Uuid,
        percentage: i32,
    ) -> Result<Project, ServiceError> {
        let project = self.get_project(project_id).await?;
        let state = project.state()?;
        ensure_freelancer(&state, freelancer)?;

        let next = state.update_progress(percentage)?;
        let updated = save_state(self.db_client.as_ref(), &project, &next).await?;

        self.notification_service
            .log_activity(
                freelancer.id,
                format!("Updated \"{}\" progress to {}%", project.title, percentage),
            )
            .await?;

        Ok(updated)
    }

    pub async fn submit_completion(
        &self,
        freelancer: &User,
        project_id: Uuid,
        completion_url: &str,
    ) -> Result<Project, ServiceError> {
        let project = self.get_project(project_id).await?;
        let state = project.state()?;
        ensure_freelancer(&state, freelancer)?;

        let next = state.submit_work(completion_url.trim())?;
        let updated = save_state(self.db_client.as_ref(), &project, &next).await?;

        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!("Work on \"{}\" was submitted for your approval", project.title),
            )
            .await?;

        Ok(updated)
    }

    pub async fn approve_completion(
        &self,
        client: &User,
        project_id: Uuid,
    ) -> Result<Project, ServiceError> {
        let project = self.get_project(project_id).await?;
        ensure_client(&project, client)?;
        let state = project.state()?;

        let next = state.approve()?;
        let updated = save_state(self.db_client.as_ref(), &project, &next).await?;

        if let Some(engagement) = next.engagement() {
            self.db_client
                .increment_projects_completed(engagement.freelancer)
                .await?;
            self.notification_service
                .notify(
                    engagement.freelancer,
                    Some(project.id),
                    format!("Your work on \"{}\" was approved", project.title),
                )
                .await?;
        }

        Ok(updated)
    }

    pub async fn reject_completion(
        &self,
        client: &User,
        project_id: Uuid,
        comment: &str,
        percentage: Option<i32>,
    ) -> Result<Project, ServiceError> {
        let project = self.get_project(project_id).await?;
        ensure_client(&project, client)?;
        let state = project.state()?;

        let next = state.reject(comment.trim(), percentage)?;
        let updated = save_state(self.db_client.as_ref(), &project, &next).await?;

        if let Some(engagement) = next.engagement() {
            self.notification_service
                .notify(
                    engagement.freelancer,
                    Some(project.id),
                    format!("Your work on \"{}\" needs changes: {}", project.title, comment),
                )
                .await?;
        }

        Ok(updated)
    }

    /// Notifies the client of every project whose deadline is before
    /// `cutoff`. Running it twice notifies twice.
    pub async fn run_deadline_sweep(&self, cutoff: DateTime<Utc>) -> Result<usize, ServiceError> {
        let overdue = self.db_client.get_projects_due_before(cutoff).await?;

        for project in &overdue {
            self.notification_service
                .notify(
                    project.client_id,
                    Some(project.id),
                    format!("The deadline for project \"{}\" has passed", project.title),
                )
                .await?;
        }

        tracing::info!("Deadline sweep notified {} overdue projects", overdue.len());
        Ok(overdue.len())
    }
}
