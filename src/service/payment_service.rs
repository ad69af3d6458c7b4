use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        paymentmodel::{CheckoutAction, Payment, PaymentStatus},
        projectmodel::Project,
        projectstate::{LifecycleError, ProjectState},
        usermodel::User,
    },
    service::{
        error::ServiceError,
        notification_service::NotificationService,
        payment_provider::{CheckoutRequest, CheckoutSession, GatewayEvent, PaymentGateway},
        project_service::{load_project, save_state},
    },
};

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied { action: CheckoutAction, project_id: Uuid },
    Ignored { reason: String },
}

/// Escrow workflow: opens gateway checkouts and applies confirmed gateway
/// events to the project lifecycle.
#[derive(Clone)]
pub struct PaymentService {
    db_client: Arc<dyn MarketStore>,
    gateway: Arc<dyn PaymentGateway>,
    notification_service: Arc<NotificationService>,
}

impl PaymentService {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        gateway: Arc<dyn PaymentGateway>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            gateway,
            notification_service,
        }
    }

    async fn open_checkout(
        &self,
        project: &Project,
        party: (&str, Uuid),
        amount: f64,
        action: CheckoutAction,
        product_name: String,
    ) -> Result<CheckoutSession, ServiceError> {
        let mut metadata = BTreeMap::new();
        metadata.insert("projectId".to_string(), project.id.to_string());
        metadata.insert(party.0.to_string(), party.1.to_string());
        metadata.insert("amount".to_string(), amount.to_string());
        metadata.insert("action".to_string(), action.to_string());

        let session = self
            .gateway
            .create_checkout_session(CheckoutRequest {
                product_name,
                amount,
                metadata,
            })
            .await?;

        tracing::info!(
            "Opened {} checkout {} for project {}",
            action,
            session.id,
            project.id
        );
        Ok(session)
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

    /// Checkout that funds the escrow. Defaults to the full budget.
    pub async fn create_funding_checkout(
        &self,
        client: &User,
        project_id: Uuid,
        amount: Option<f64>,
    ) -> Result<CheckoutSession, ServiceError> {
        let project = load_project(self.db_client.as_ref(), project_id).await?;
        Self::ensure_client(&project, client)?;
        project.state()?.ensure_fundable()?;

        let amount = amount.unwrap_or(project.budget);
        if amount.is_nan() || amount <= 0.0 {
            return Err(ServiceError::validation("Amount must be greater than zero"));
        }

        self.open_checkout(
            &project,
            ("clientId", client.id),
            amount,
            CheckoutAction::CreatePaymentIntent,
            format!("Escrow for {}", project.title),
        )
        .await
    }

    pub async fn create_claim_money_checkout(
        &self,
        freelancer: &User,
        project_id: Uuid,
    ) -> Result<CheckoutSession, ServiceError> {
        let project = load_project(self.db_client.as_ref(), project_id).await?;
        let state = project.state()?;
        let engagement = match state.engagement() {
            Some(e) if e.freelancer == freelancer.id => e,
            _ => {
                return Err(ServiceError::forbidden(
                    "Only the accepted freelancer can claim this payment",
                ))
            }
        };
        state.release_payout()?;

        self.open_checkout(
            &project,
            ("freelancerId", freelancer.id),
            engagement.amount,
            CheckoutAction::ClaimMoney,
            format!("Payout for {}", project.title),
        )
        .await
    }

    pub async fn create_claim_remaining_checkout(
        &self,
        client: &User,
        project_id: Uuid,
    ) -> Result<CheckoutSession, ServiceError> {
        let project = load_project(self.db_client.as_ref(), project_id).await?;
        Self::ensure_client(&project, client)?;
        let state = project.state()?;
        state.claim_remaining(project.budget)?;
        let remaining = state.remaining_budget(project.budget).unwrap_or_default();

        self.open_checkout(
            &project,
            ("clientId", client.id),
            remaining,
            CheckoutAction::ClaimRemaining,
            format!("Remaining budget of {}", project.title),
        )
        .await
    }

    pub async fn create_refund_checkout(
        &self,
        client: &User,
        project_id: Uuid,
    ) -> Result<CheckoutSession, ServiceError> {
        let project = load_project(self.db_client.as_ref(), project_id).await?;
        Self::ensure_client(&project, client)?;
        project.state()?.refund()?;

        let amount = self
            .db_client
            .get_project_payment(project.id)
            .await?
            .map(|payment| payment.amount)
            .unwrap_or(project.budget);

        self.open_checkout(
            &project,
            ("clientId", client.id),
            amount,
            CheckoutAction::RefundEscrow,
            format!("Escrow refund for {}", project.title),
        )
        .await
    }

    pub async fn get_client_payments(&self, client: &User) -> Result<Vec<Payment>, ServiceError> {
        Ok(self.db_client.get_client_payments(client.id).await?)
    }

    /// Verifies and applies a gateway callback. An event whose transition is
    /// no longer legal, such as a replay, is acknowledged without effect.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, ServiceError> {
        let event = self.gateway.verify_webhook(payload, signature)?;

        if event.event_type != CHECKOUT_COMPLETED {
            tracing::info!("Unhandled webhook event type: {}", event.event_type);
            return Err(ServiceError::validation(format!(
                "Unhandled event type: {}",
                event.event_type
            )));
        }

        let action = event
            .metadata
            .get("action")
            .ok_or_else(|| ServiceError::validation("Webhook metadata has no action"))
            .and_then(|a| CheckoutAction::from_str(a).map_err(ServiceError::Validation))?;
        let project_id = event
            .metadata
            .get("projectId")
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| ServiceError::validation("Webhook metadata has no valid projectId"))?;

        let project = load_project(self.db_client.as_ref(), project_id).await?;
        let state = project.state()?;

        let applied = match action {
            CheckoutAction::CreatePaymentIntent => self.apply_funding(&project, &state, &event).await,
            CheckoutAction::ClaimMoney => self.apply_payout(&project, &state).await,
            CheckoutAction::ClaimRemaining => self.apply_remaining_claim(&project, &state).await,
            CheckoutAction::RefundEscrow => self.apply_refund(&project, &state).await,
        };

        match applied {
            Ok(()) => Ok(WebhookOutcome::Applied { action, project_id }),
            Err(Transition::Illegal(e)) => {
                tracing::warn!(
                    "Ignoring {} event {} for project {}: {}",
                    action,
                    event.session_id,
                    project_id,
                    e
                );
                Ok(WebhookOutcome::Ignored {
                    reason: e.to_string(),
                })
            }
            Err(Transition::Failed(e)) => Err(e),
        }
    }

    async fn apply_funding(
        &self,
        project: &Project,
        state: &ProjectState,
        event: &GatewayEvent,
    ) -> Result<(), Transition> {
        let next = state.fund(&event.session_id)?;
        save_state(self.db_client.as_ref(), project, &next).await?;

        let amount = event
            .metadata
            .get("amount")
            .and_then(|a| a.parse::<f64>().ok())
            .unwrap_or(project.budget);
        self.db_client
            .upsert_payment(
                project.id,
                project.client_id,
                None,
                amount,
                PaymentStatus::Succeeded,
                &event.session_id,
            )
            .await
            .map_err(ServiceError::from)?;

        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!("Escrow for \"{}\" is funded", project.title),
            )
            .await?;
        self.notification_service
            .log_activity(project.client_id, format!("Funded escrow for \"{}\"", project.title))
            .await?;

        Ok(())
    }

    async fn apply_payout(&self, project: &Project, state: &ProjectState) -> Result<(), Transition> {
        let next = state.release_payout()?;
        let Some(engagement) = next.engagement() else {
            return Err(Transition::Illegal(LifecycleError::InvalidTransition(
                "Project has no accepted freelancer".to_string(),
            )));
        };
        save_state(self.db_client.as_ref(), project, &next).await?;

        self.db_client
            .upsert_payment(
                project.id,
                project.client_id,
                Some(engagement.freelancer),
                engagement.amount,
                PaymentStatus::FreelancerPaid,
                &engagement.payment_intent_id,
            )
            .await
            .map_err(ServiceError::from)?;
        self.db_client
            .add_freelancer_earnings(engagement.freelancer, engagement.amount)
            .await
            .map_err(ServiceError::from)?;

        self.notification_service
            .notify(
                engagement.freelancer,
                Some(project.id),
                format!(
                    "Payment of {} for \"{}\" has been released",
                    engagement.amount, project.title
                ),
            )
            .await?;
        self.notification_service
            .log_activity(
                engagement.freelancer,
                format!("Received payment for \"{}\"", project.title),
            )
            .await?;

        Ok(())
    }

    async fn apply_remaining_claim(
        &self,
        project: &Project,
        state: &ProjectState,
    ) -> Result<(), Transition> {
        let next = state.claim_remaining(project.budget)?;
        save_state(self.db_client.as_ref(), project, &next).await?;

        let remaining = next.remaining_budget(project.budget).unwrap_or_default();
        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!(
                    "Remaining budget of {} for \"{}\" has been returned",
                    remaining, project.title
                ),
            )
            .await?;

        Ok(())
    }

    async fn apply_refund(&self, project: &Project, state: &ProjectState) -> Result<(), Transition> {
        let next = state.refund()?;
        save_state(self.db_client.as_ref(), project, &next).await?;

        self.db_client
            .update_payment_status(project.id, PaymentStatus::Failed)
            .await
            .map_err(ServiceError::from)?;

        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!("Escrow for \"{}\" has been refunded", project.title),
            )
            .await?;

        Ok(())
    }
}

/// Distinguishes a stale event (acknowledged) from a real failure.
enum Transition {
    Illegal(LifecycleError),
    Failed(ServiceError),
}

impl From<LifecycleError> for Transition {
    fn from(error: LifecycleError) -> Self {
        match error {
            LifecycleError::Corrupt(_) => Transition::Failed(error.into()),
            _ => Transition::Illegal(error),
        }
    }
}

impl From<ServiceError> for Transition {
    fn from(error: ServiceError) -> Self {
        Transition::Failed(error)
    }
}
