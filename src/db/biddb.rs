use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::db::DBClient;
use super::projectdb::{bind_lifecycle, UPDATE_LIFECYCLE_SQL};
use crate::models::{
    bidmodel::{Bid, BidRemoval},
    projectmodel::{Project, ProjectLifecycle},
};

#[async_trait]
pub trait BidExt {
    /// `None` when the freelancer already bid on this project or the project
    /// no longer takes bids.
    async fn create_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
        amount: f64,
    ) -> Result<Option<Bid>, sqlx::Error>;

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, sqlx::Error>;

    async fn get_project_bids(&self, project_id: Uuid) -> Result<Vec<Bid>, sqlx::Error>;

    async fn get_freelancer_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
    ) -> Result<Option<Bid>, sqlx::Error>;

    async fn get_selected_bids(&self, freelancer_id: Uuid) -> Result<Vec<Bid>, sqlx::Error>;

    /// Re-prices a bid that is still pending.
    async fn update_bid_amount(&self, bid_id: Uuid, amount: f64) -> Result<Option<Bid>, sqlx::Error>;

    /// Moves the project to its selected lifecycle (CAS on `version`) and marks
    /// the bid selected, atomically.
    async fn select_bid(
        &self,
        bid_id: Uuid,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<(Project, Bid)>, sqlx::Error>;

    /// Deletes the bid; a selected project whose last bid left falls back to
    /// pending in the same transaction.
    async fn remove_bid(&self, bid_id: Uuid) -> Result<Option<BidRemoval>, sqlx::Error>;
}

/// Share-locks the project while it is still pending or selected, so an
/// engagement cannot be finalized until the caller's transaction ends.
pub(crate) async fn lock_open_project(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let open = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM projects
        WHERE id = $1
          AND status IN ('pending'::project_status, 'selected'::project_status)
        FOR SHARE
        "#,
    )
    .bind(project_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(open.is_some())
}

#[async_trait]
impl BidExt for DBClient {
    async fn create_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
        amount: f64,
    ) -> Result<Option<Bid>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if !lock_open_project(&mut tx, project_id).await? {
            return Ok(None);
        }

        let bid = sqlx::query_as::<_, Bid>(
            r#"
            INSERT INTO bids (project_id, freelancer_id, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, freelancer_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(freelancer_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(bid)
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, sqlx::Error> {
        sqlx::query_as::<_, Bid>(r#"SELECT * FROM bids WHERE id = $1"#)
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_project_bids(&self, project_id: Uuid) -> Result<Vec<Bid>, sqlx::Error> {
        sqlx::query_as::<_, Bid>(
            r#"SELECT * FROM bids WHERE project_id = $1 ORDER BY created_at"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_freelancer_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
    ) -> Result<Option<Bid>, sqlx::Error> {
        sqlx::query_as::<_, Bid>(
            r#"SELECT * FROM bids WHERE project_id = $1 AND freelancer_id = $2"#,
        )
        .bind(project_id)
        .bind(freelancer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_selected_bids(&self, freelancer_id: Uuid) -> Result<Vec<Bid>, sqlx::Error> {
        sqlx::query_as::<_, Bid>(
            r#"
            SELECT * FROM bids
            WHERE freelancer_id = $1 AND status = 'selected'::bid_status
            ORDER BY updated_at DESC
            "#,
        )
        .bind(freelancer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn update_bid_amount(&self, bid_id: Uuid, amount: f64) -> Result<Option<Bid>, sqlx::Error> {
        sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids SET amount = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'::bid_status
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
    }

    async fn select_bid(
        &self,
        bid_id: Uuid,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<(Project, Bid)>, sqlx::Error> {
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

        let bid = sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids SET status = 'selected'::bid_status, updated_at = NOW()
            WHERE id = $1 AND project_id = $2
            RETURNING *
            "#,
        )
        .bind(bid_id)
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(bid) = bid else {
            return Ok(None);
        };

        tx.commit().await?;

        Ok(Some((project, bid)))
    }

    async fn remove_bid(&self, bid_id: Uuid) -> Result<Option<BidRemoval>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // serialize with finalize_engagement on the project row
        sqlx::query(
            r#"
            SELECT id FROM projects
            WHERE id = (SELECT project_id FROM bids WHERE id = $1)
            FOR UPDATE
            "#,
        )
        .bind(bid_id)
        .fetch_optional(&mut *tx)
        .await?;

        let bid = sqlx::query_as::<_, Bid>(r#"DELETE FROM bids WHERE id = $1 RETURNING *"#)
            .bind(bid_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(bid) = bid else {
            return Ok(None);
        };

        let reverted = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET status = 'pending'::project_status,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
              AND status = 'selected'::project_status
              AND NOT EXISTS (SELECT 1 FROM bids WHERE project_id = $1)
            RETURNING *
            "#,
        )
        .bind(bid.project_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (project, reverted) = match reverted {
            Some(project) => (project, true),
            None => {
                let project =
                    sqlx::query_as::<_, Project>(r#"SELECT * FROM projects WHERE id = $1"#)
                        .bind(bid.project_id)
                        .fetch_one(&mut *tx)
                        .await?;
                (project, false)
            }
        };

        tx.commit().await?;

        Ok(Some(BidRemoval {
            bid,
            project,
            reverted,
        }))
    }
}
