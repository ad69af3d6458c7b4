use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::freelancermodel::FreelancerInformation;

#[async_trait]
pub trait FreelancerExt {
    async fn get_freelancer_information(
        &self,
        user_id: Uuid,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error>;

    /// `None` when the user already has a profile.
    async fn create_freelancer_information(
        &self,
        user_id: Uuid,
        skills: Vec<String>,
        portfolio: &str,
        experience: &str,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error>;

    async fn update_freelancer_information(
        &self,
        user_id: Uuid,
        skills: Option<Vec<String>>,
        portfolio: Option<String>,
        experience: Option<String>,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error>;

    async fn set_freelancer_rating(&self, user_id: Uuid, rating: f64) -> Result<(), sqlx::Error>;

    async fn increment_projects_completed(&self, user_id: Uuid) -> Result<(), sqlx::Error>;

    async fn add_freelancer_earnings(&self, user_id: Uuid, amount: f64) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl FreelancerExt for DBClient {
    async fn get_freelancer_information(
        &self,
        user_id: Uuid,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error> {
        sqlx::query_as::<_, FreelancerInformation>(
            r#"SELECT * FROM freelancer_information WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_freelancer_information(
        &self,
        user_id: Uuid,
        skills: Vec<String>,
        portfolio: &str,
        experience: &str,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error> {
        sqlx::query_as::<_, FreelancerInformation>(
            r#"
            INSERT INTO freelancer_information (user_id, skills, portfolio, experience)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(skills)
        .bind(portfolio)
        .bind(experience)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_freelancer_information(
        &self,
        user_id: Uuid,
        skills: Option<Vec<String>>,
        portfolio: Option<String>,
        experience: Option<String>,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error> {
        sqlx::query_as::<_, FreelancerInformation>(
            r#"
            UPDATE freelancer_information
            SET skills = COALESCE($2, skills),
                portfolio = COALESCE($3, portfolio),
                experience = COALESCE($4, experience)
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(skills)
        .bind(portfolio)
        .bind(experience)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_freelancer_rating(&self, user_id: Uuid, rating: f64) -> Result<(), sqlx::Error> {
        sqlx::query(r#"UPDATE freelancer_information SET reviews = $2 WHERE user_id = $1"#)
            .bind(user_id)
            .bind(rating)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_projects_completed(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE freelancer_information
            SET projects_completed = projects_completed + 1
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_freelancer_earnings(&self, user_id: Uuid, amount: f64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE freelancer_information
            SET earnings = earnings + $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
