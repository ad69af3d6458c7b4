use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        projectstate::WorkSubmission,
        reviewmodel::{Review, ReviewerType},
        usermodel::User,
    },
    service::{
        error::ServiceError, notification_service::NotificationService,
        project_service::load_project,
    },
};

/// Rounds to one decimal place, half away from zero.
pub fn round_rating(average: f64) -> f64 {
    (average * 10.0).round() / 10.0
}

#[derive(Clone)]
pub struct ReviewService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
}

impl ReviewService {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    /// Records one review per reviewer per project, after approval. Client
    /// reviews refresh the freelancer's published rating.
    pub async fn create_review(
        &self,
        reviewer: &User,
        project_id: Uuid,
        receiver_id: Uuid,
        rating: i32,
        comment: &str,
    ) -> Result<Review, ServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::validation("Rating must be between 1 and 5"));
        }

        let project = load_project(self.db_client.as_ref(), project_id).await?;
        let state = project.state()?;
        let engagement = match state.engagement() {
            Some(e) if matches!(e.work, WorkSubmission::Approved { .. }) => e,
            _ => {
                return Err(ServiceError::invalid_state(
                    "Reviews are only allowed once the work is approved",
                ))
            }
        };

        let (reviewer_type, counterpart) = if project.is_client(reviewer.id) {
            (ReviewerType::Client, engagement.freelancer)
        } else if engagement.freelancer == reviewer.id {
            (ReviewerType::Freelancer, project.client_id)
        } else {
            return Err(ServiceError::forbidden(
                "Only the client or the accepted freelancer can review this project",
            ));
        };
        if receiver_id != counterpart {
            return Err(ServiceError::forbidden(
                "Reviews can only be given to the other party of the project",
            ));
        }

        let review = self
            .db_client
            .create_review(
                project.id,
                reviewer.id,
                receiver_id,
                rating,
                comment.trim(),
                reviewer_type,
            )
            .await?
            .ok_or_else(|| ServiceError::conflict("You have already reviewed this project"))?;

        if reviewer_type == ReviewerType::Client {
            self.refresh_freelancer_rating(receiver_id).await?;
        }

        let receiver_side = match reviewer_type {
            ReviewerType::Client => "freelancer",
            ReviewerType::Freelancer => "client",
        };
        self.notification_service
            .log_activity(
                reviewer.id,
                format!(
                    "Reviewed the {} of \"{}\" with {} stars",
                    receiver_side, project.title, rating
                ),
            )
            .await?;
        self.notification_service
            .notify(
                receiver_id,
                Some(project.id),
                format!(
                    "{} left you a {}-star review on \"{}\"",
                    reviewer.name, rating, project.title
                ),
            )
            .await?;

        Ok(review)
    }

    async fn refresh_freelancer_rating(&self, freelancer_id: Uuid) -> Result<f64, ServiceError> {
        let average = self
            .db_client
            .get_average_rating(freelancer_id, Some(ReviewerType::Client))
            .await?
            .map(round_rating)
            .unwrap_or(0.0);

        self.db_client
            .set_freelancer_rating(freelancer_id, average)
            .await?;

        tracing::info!("Freelancer {} rating is now {}", freelancer_id, average);
        Ok(average)
    }

    /// Mean over every review a user received, from either side.
    pub async fn average_rating(&self, user_id: Uuid) -> Result<Option<f64>, ServiceError> {
        Ok(self
            .db_client
            .get_average_rating(user_id, None)
            .await?
            .map(round_rating))
    }
}
