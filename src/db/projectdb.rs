use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgArguments, query::QueryAs, Postgres};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    bidmodel::EngagementOffer,
    projectmodel::{Project, ProjectChanges, ProjectLifecycle},
};

#[async_trait]
pub trait ProjectExt {
    /// `None` when the client already owns a project with this title.
    async fn create_project(
        &self,
        client_id: Uuid,
        title: &str,
        description: &str,
        budget: f64,
        deadline: DateTime<Utc>,
    ) -> Result<Option<Project>, sqlx::Error>;

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, sqlx::Error>;

    async fn get_projects(&self) -> Result<Vec<Project>, sqlx::Error>;

    async fn get_latest_projects(&self, limit: i64) -> Result<Vec<Project>, sqlx::Error>;

    async fn get_client_projects(&self, client_id: Uuid) -> Result<Vec<Project>, sqlx::Error>;

    async fn get_projects_due_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Project>, sqlx::Error>;

    /// Compare-and-swap on `version`; `None` when the project changed meanwhile.
    async fn update_project_details(
        &self,
        project_id: Uuid,
        expected_version: i64,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, sqlx::Error>;

    /// Compare-and-swap on `version`; `None` when the project changed meanwhile.
    async fn update_project_lifecycle(
        &self,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<Project>, sqlx::Error>;

    /// Writes the engaged lifecycle and removes every bid and direct hire of
    /// the project in one transaction. `None` when the project changed or the
    /// offer is no longer there.
    async fn finalize_engagement(
        &self,
        project_id: Uuid,
        expected_version: i64,
        offer: EngagementOffer,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<Project>, sqlx::Error>;

    /// Deletes the project only while it is open with no funds in escrow.
    async fn delete_project_if_open(&self, project_id: Uuid) -> Result<bool, sqlx::Error>;
}

pub(crate) const UPDATE_LIFECYCLE_SQL: &str = r#"
    UPDATE projects
    SET status = $3,
        escrow_status = $4,
        approval_status = $5,
        claim_status = $6,
        accepted_freelancer = $7,
        accepted_money = $8,
        completed_percentage = $9,
        completion_url = $10,
        rejection_comment = $11,
        payment_intent_id = $12,
        version = version + 1,
        updated_at = NOW()
    WHERE id = $1 AND version = $2
    RETURNING *
"#;

pub(crate) fn bind_lifecycle<'q>(
    query: QueryAs<'q, Postgres, Project, PgArguments>,
    lifecycle: &ProjectLifecycle,
) -> QueryAs<'q, Postgres, Project, PgArguments> {
    query
        .bind(lifecycle.status)
        .bind(lifecycle.escrow_status)
        .bind(lifecycle.approval_status)
        .bind(lifecycle.claim_status)
        .bind(lifecycle.accepted_freelancer)
        .bind(lifecycle.accepted_money)
        .bind(lifecycle.completed_percentage)
        .bind(lifecycle.completion_url.clone())
        .bind(lifecycle.rejection_comment.clone())
        .bind(lifecycle.payment_intent_id.clone())
}

#[async_trait]
impl ProjectExt for DBClient {
    async fn create_project(
        &self,
        client_id: Uuid,
        title: &str,
        description: &str,
        budget: f64,
        deadline: DateTime<Utc>,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (client_id, title, description, budget, deadline)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (client_id, title) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(client_id)
        .bind(title)
        .bind(description)
        .bind(budget)
        .bind(deadline)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(r#"SELECT * FROM projects WHERE id = $1"#)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(r#"SELECT * FROM projects ORDER BY created_at DESC"#)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_latest_projects(&self, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT * FROM projects ORDER BY created_at DESC LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_client_projects(&self, client_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT * FROM projects WHERE client_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_projects_due_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"SELECT * FROM projects WHERE deadline < $1 ORDER BY deadline"#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_project_details(
        &self,
        project_id: Uuid,
        expected_version: i64,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET description = COALESCE($3, description),
                budget = COALESCE($4, budget),
                deadline = COALESCE($5, deadline),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(expected_version)
        .bind(changes.description.clone())
        .bind(changes.budget)
        .bind(changes.deadline)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_project_lifecycle(
        &self,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = sqlx::query_as::<_, Project>(UPDATE_LIFECYCLE_SQL)
            .bind(project_id)
            .bind(expected_version);

        bind_lifecycle(query, lifecycle)
            .fetch_optional(&self.pool)
            .await
    }

    async fn finalize_engagement(
        &self,
        project_id: Uuid,
        expected_version: i64,
        offer: EngagementOffer,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let query = sqlx::query_as::<_, Project>(UPDATE_LIFECYCLE_SQL)
            .bind(project_id)
            .bind(expected_version);
        let project = match bind_lifecycle(query, lifecycle)
            .fetch_optional(&mut *tx)
            .await?
        {
            Some(project) => project,
            None => return Ok(None),
        };

        // a concurrent withdrawal or rejection either committed already or
        // waits on this row lock
        let offer_sql = match offer {
            EngagementOffer::SelectedBid(_) => {
                r#"
                SELECT id FROM bids
                WHERE id = $1 AND project_id = $2 AND status = 'selected'::bid_status
                FOR UPDATE
                "#
            }
            EngagementOffer::DirectHire(_) => {
                r#"SELECT id FROM direct_hires WHERE id = $1 AND project_id = $2 FOR UPDATE"#
            }
        };
        let offer_id = match offer {
            EngagementOffer::SelectedBid(id) | EngagementOffer::DirectHire(id) => id,
        };
        let still_offered = sqlx::query_scalar::<_, Uuid>(offer_sql)
            .bind(offer_id)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?;
        if still_offered.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(r#"DELETE FROM bids WHERE project_id = $1"#)
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(r#"DELETE FROM direct_hires WHERE project_id = $1"#)
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(project))
    }

    async fn delete_project_if_open(&self, project_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM projects
            WHERE id = $1
              AND status = 'pending'::project_status
              AND escrow_status IN ('Not Funded'::escrow_status, 'Refunded'::escrow_status)
            "#,
        )
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
