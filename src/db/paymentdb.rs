use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::{Payment, PaymentStatus};

#[async_trait]
pub trait PaymentExt {
    /// Insert or overwrite the single ledger entry of a project.
    async fn upsert_payment(
        &self,
        project_id: Uuid,
        client_id: Uuid,
        freelancer_id: Option<Uuid>,
        amount: f64,
        status: PaymentStatus,
        payment_intent_id: &str,
    ) -> Result<Payment, sqlx::Error>;

    async fn update_payment_status(
        &self,
        project_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_project_payment(&self, project_id: Uuid) -> Result<Option<Payment>, sqlx::Error>;

    async fn get_client_payments(&self, client_id: Uuid) -> Result<Vec<Payment>, sqlx::Error>;
}

#[async_trait]
impl PaymentExt for DBClient {
    async fn upsert_payment(
        &self,
        project_id: Uuid,
        client_id: Uuid,
        freelancer_id: Option<Uuid>,
        amount: f64,
        status: PaymentStatus,
        payment_intent_id: &str,
    ) -> Result<Payment, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (project_id, client_id, freelancer_id, amount, status, payment_intent_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (project_id) DO UPDATE
            SET freelancer_id = COALESCE(EXCLUDED.freelancer_id, payments.freelancer_id),
                amount = EXCLUDED.amount,
                status = EXCLUDED.status,
                payment_intent_id = EXCLUDED.payment_intent_id,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(client_id)
        .bind(freelancer_id)
        .bind(amount)
        .bind(status)
        .bind(payment_intent_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_payment_status(
        &self,
        project_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET status = $2, updated_at = NOW()
            WHERE project_id = $1
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_project_payment(&self, project_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(r#"SELECT * FROM payments WHERE project_id = $1"#)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_client_payments(&self, client_id: Uuid) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"SELECT * FROM payments WHERE client_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }
}
