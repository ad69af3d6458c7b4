use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::activitymodel::{Activity, Notification},
    service::error::ServiceError,
};

/// Writes user-facing notifications and the per-user activity log. Called
/// before a response is produced, so a failure here surfaces to the caller.
#[derive(Clone)]
pub struct NotificationService {
    db_client: Arc<dyn MarketStore>,
}

impl NotificationService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    pub async fn notify(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
        message: impl Into<String>,
    ) -> Result<Notification, ServiceError> {
        let message = message.into();
        tracing::info!("Notification for user {}: {}", user_id, message);

        Ok(self
            .db_client
            .create_notification(user_id, project_id, &message)
            .await?)
    }

    pub async fn log_activity(
        &self,
        user_id: Uuid,
        action: impl Into<String>,
    ) -> Result<Activity, ServiceError> {
        let action = action.into();
        tracing::debug!("Activity for user {}: {}", user_id, action);

        Ok(self.db_client.record_activity(user_id, &action).await?)
    }
}
