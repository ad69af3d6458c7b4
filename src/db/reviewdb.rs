use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::reviewmodel::{Review, ReviewerType};

#[async_trait]
pub trait ReviewExt {
    /// `None` when the reviewer already reviewed this project.
    async fn create_review(
        &self,
        project_id: Uuid,
        reviewer_id: Uuid,
        receiver_id: Uuid,
        rating: i32,
        comment: &str,
        reviewer_type: ReviewerType,
    ) -> Result<Option<Review>, sqlx::Error>;

    async fn get_review_by_reviewer(
        &self,
        project_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<Review>, sqlx::Error>;

    async fn get_received_reviews(&self, receiver_id: Uuid) -> Result<Vec<Review>, sqlx::Error>;

    async fn get_submitted_reviews(&self, reviewer_id: Uuid) -> Result<Vec<Review>, sqlx::Error>;

    async fn get_project_reviews(&self, project_id: Uuid) -> Result<Vec<Review>, sqlx::Error>;

    /// Mean rating over received reviews, optionally restricted to one
    /// reviewer side. `None` when there are none.
    async fn get_average_rating(
        &self,
        receiver_id: Uuid,
        reviewer_type: Option<ReviewerType>,
    ) -> Result<Option<f64>, sqlx::Error>;
}

#[async_trait]
impl ReviewExt for DBClient {
    async fn create_review(
        &self,
        project_id: Uuid,
        reviewer_id: Uuid,
        receiver_id: Uuid,
        rating: i32,
        comment: &str,
        reviewer_type: ReviewerType,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (project_id, reviewer_id, receiver_id, rating, comment, reviewer_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (project_id, reviewer_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(reviewer_id)
        .bind(receiver_id)
        .bind(rating)
        .bind(comment)
        .bind(reviewer_type)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_review_by_reviewer(
        &self,
        project_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"SELECT * FROM reviews WHERE project_id = $1 AND reviewer_id = $2"#,
        )
        .bind(project_id)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_received_reviews(&self, receiver_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"SELECT * FROM reviews WHERE receiver_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_submitted_reviews(&self, reviewer_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"SELECT * FROM reviews WHERE reviewer_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(reviewer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_project_reviews(&self, project_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"SELECT * FROM reviews WHERE project_id = $1 ORDER BY created_at"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_average_rating(
        &self,
        receiver_id: Uuid,
        reviewer_type: Option<ReviewerType>,
    ) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<f64>>(
            r#"
            SELECT AVG(rating)::DOUBLE PRECISION FROM reviews
            WHERE receiver_id = $1 AND ($2::reviewer_type IS NULL OR reviewer_type = $2)
            "#,
        )
        .bind(receiver_id)
        .bind(reviewer_type)
        .fetch_one(&self.pool)
        .await
    }
}
