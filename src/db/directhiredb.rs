use async_trait::async_trait;
use uuid::Uuid;

use super::biddb::lock_open_project;
use super::db::DBClient;
use crate::models::bidmodel::DirectHire;

#[async_trait]
pub trait DirectHireExt {
    /// `None` when the same (freelancer, client, project) offer already exists
    /// or the project is no longer open.
    async fn create_direct_hire(
        &self,
        freelancer_id: Uuid,
        client_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<DirectHire>, sqlx::Error>;

    async fn get_direct_hire(&self, direct_hire_id: Uuid) -> Result<Option<DirectHire>, sqlx::Error>;

    async fn get_client_direct_hires(&self, client_id: Uuid) -> Result<Vec<DirectHire>, sqlx::Error>;

    /// Offers to a freelancer on projects that are still open.
    async fn get_freelancer_direct_hires(
        &self,
        freelancer_id: Uuid,
    ) -> Result<Vec<DirectHire>, sqlx::Error>;

    async fn get_project_direct_hires(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<DirectHire>, sqlx::Error>;

    async fn delete_direct_hire(
        &self,
        direct_hire_id: Uuid,
    ) -> Result<Option<DirectHire>, sqlx::Error>;
}

#[async_trait]
impl DirectHireExt for DBClient {
    async fn create_direct_hire(
        &self,
        freelancer_id: Uuid,
        client_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<DirectHire>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if !lock_open_project(&mut tx, project_id).await? {
            return Ok(None);
        }

        let hire = sqlx::query_as::<_, DirectHire>(
            r#"
            INSERT INTO direct_hires (freelancer_id, client_id, project_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (freelancer_id, client_id, project_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(freelancer_id)
        .bind(client_id)
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(hire)
    }

    async fn get_direct_hire(&self, direct_hire_id: Uuid) -> Result<Option<DirectHire>, sqlx::Error> {
        sqlx::query_as::<_, DirectHire>(r#"SELECT * FROM direct_hires WHERE id = $1"#)
            .bind(direct_hire_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_client_direct_hires(&self, client_id: Uuid) -> Result<Vec<DirectHire>, sqlx::Error> {
        sqlx::query_as::<_, DirectHire>(
            r#"SELECT * FROM direct_hires WHERE client_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_freelancer_direct_hires(
        &self,
        freelancer_id: Uuid,
    ) -> Result<Vec<DirectHire>, sqlx::Error> {
        sqlx::query_as::<_, DirectHire>(
            r#"
            SELECT d.* FROM direct_hires d
            JOIN projects p ON p.id = d.project_id
            WHERE d.freelancer_id = $1
              AND p.status IN ('pending'::project_status, 'selected'::project_status)
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(freelancer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_project_direct_hires(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<DirectHire>, sqlx::Error> {
        sqlx::query_as::<_, DirectHire>(
            r#"SELECT * FROM direct_hires WHERE project_id = $1 ORDER BY created_at"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_direct_hire(
        &self,
        direct_hire_id: Uuid,
    ) -> Result<Option<DirectHire>, sqlx::Error> {
        sqlx::query_as::<_, DirectHire>(r#"DELETE FROM direct_hires WHERE id = $1 RETURNING *"#)
            .bind(direct_hire_id)
            .fetch_optional(&self.pool)
            .await
    }
}
