use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::activitymodel::{Activity, LearningMaterial, Notification};

/// Entries kept per user in the activity log.
pub const ACTIVITY_LOG_LIMIT: i64 = 10;

#[async_trait]
pub trait NotificationExt {
    async fn create_notification(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
        message: &str,
    ) -> Result<Notification, sqlx::Error>;

    async fn get_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, sqlx::Error>;

    async fn mark_notifications_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn delete_notification(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>;

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

#[async_trait]
pub trait ActivityExt {
    /// Appends an entry and trims the user's log to the newest
    /// [`ACTIVITY_LOG_LIMIT`] entries.
    async fn record_activity(&self, user_id: Uuid, action: &str) -> Result<Activity, sqlx::Error>;

    async fn get_activities(&self, user_id: Uuid) -> Result<Vec<Activity>, sqlx::Error>;
}

#[async_trait]
pub trait LearningExt {
    async fn create_learning_material(
        &self,
        title: &str,
        description: &str,
        link: &str,
        posted_by: Uuid,
    ) -> Result<LearningMaterial, sqlx::Error>;

    async fn get_learning_materials(&self) -> Result<Vec<LearningMaterial>, sqlx::Error>;

    async fn delete_learning_material(&self, material_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn create_notification(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
        message: &str,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, project_id, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_notifications_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM notifications WHERE id = $1 AND user_id = $2"#)
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl ActivityExt for DBClient {
    async fn record_activity(&self, user_id: Uuid, action: &str) -> Result<Activity, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (user_id, action)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(action)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM activities
            WHERE user_id = $1 AND id NOT IN (
                SELECT id FROM activities
                WHERE user_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            )
            "#,
        )
        .bind(user_id)
        .bind(ACTIVITY_LOG_LIMIT)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(activity)
    }

    async fn get_activities(&self, user_id: Uuid) -> Result<Vec<Activity>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(ACTIVITY_LOG_LIMIT)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl LearningExt for DBClient {
    async fn create_learning_material(
        &self,
        title: &str,
        description: &str,
        link: &str,
        posted_by: Uuid,
    ) -> Result<LearningMaterial, sqlx::Error> {
        sqlx::query_as::<_, LearningMaterial>(
            r#"
            INSERT INTO learning_materials (title, description, link, posted_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(link)
        .bind(posted_by)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_learning_materials(&self) -> Result<Vec<LearningMaterial>, sqlx::Error> {
        sqlx::query_as::<_, LearningMaterial>(
            r#"SELECT * FROM learning_materials ORDER BY created_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_learning_material(&self, material_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM learning_materials WHERE id = $1"#)
            .bind(material_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
