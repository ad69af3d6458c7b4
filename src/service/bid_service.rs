use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        bidmodel::{Bid, BidRemoval, BidStatus, DirectHire, EngagementOffer},
        projectmodel::Project,
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        notification_service::NotificationService,
        project_service::load_project,
    },
};

/// Who is taking a bid off the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidRemovalKind {
    Rejected,
    Withdrawn,
}

fn validate_amount(amount: f64, project: &Project) -> Result<(), ServiceError> {
    if amount.is_nan() || amount <= 0.0 {
        return Err(ServiceError::validation("Bid amount must be greater than zero"));
    }
    if amount > project.budget {
        return Err(ServiceError::validation(
            "Bid amount cannot exceed the project budget",
        ));
    }
    Ok(())
}

/// Keeps at most one winning engagement per project across bids and direct
/// hires.
#[derive(Clone)]
pub struct BidService {
    db_client: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
}

impl BidService {
    pub fn new(
        db_client: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
        }
    }

    async fn load_bid(&self, bid_id: Uuid) -> Result<Bid, ServiceError> {
        self.db_client
            .get_bid(bid_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Bid"))
    }

    async fn load_direct_hire(&self, direct_hire_id: Uuid) -> Result<DirectHire, ServiceError> {
        self.db_client
            .get_direct_hire(direct_hire_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Direct hire"))
    }

    /// Explains why the store refused a new offer: the project was engaged in
    /// the meantime, or the offer is a duplicate.
    async fn refused_offer(&self, project_id: Uuid, duplicate: &str) -> ServiceError {
        match load_project(self.db_client.as_ref(), project_id).await {
            Ok(project) if project.state().map(|s| s.is_engaged()).unwrap_or(true) => {
                ServiceError::invalid_state("Project already has an accepted freelancer")
            }
            Ok(_) => ServiceError::conflict(duplicate),
            Err(e) => e,
        }
    }

    pub async fn submit_bid(
        &self,
        freelancer: &User,
        project_id: Uuid,
        amount: f64,
    ) -> Result<Bid, ServiceError> {
        let project = load_project(self.db_client.as_ref(), project_id).await?;
        if project.is_client(freelancer.id) {
            return Err(ServiceError::forbidden("You cannot bid on your own project"));
        }
        if project.state()?.is_engaged() {
            return Err(ServiceError::invalid_state(
                "Project already has an accepted freelancer",
            ));
        }
        validate_amount(amount, &project)?;

        let bid = match self
            .db_client
            .create_bid(project.id, freelancer.id, amount)
            .await?
        {
            Some(bid) => bid,
            None => {
                return Err(self
                    .refused_offer(project.id, "You have already placed a bid on this project")
                    .await)
            }
        };

        tracing::info!(
            "Freelancer {} bid {} on project {}",
            freelancer.id,
            amount,
            project.id
        );
        self.notification_service
            .log_activity(
                freelancer.id,
                format!("Placed a bid of {} on \"{}\"", amount, project.title),
            )
            .await?;
        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!(
                    "{} placed a bid of {} on \"{}\"",
                    freelancer.name, amount, project.title
                ),
            )
            .await?;

        Ok(bid)
    }

    pub async fn update_bid(
        &self,
        freelancer: &User,
        bid_id: Uuid,
        amount: f64,
    ) -> Result<Bid, ServiceError> {
        let bid = self.load_bid(bid_id).await?;
        if bid.freelancer_id != freelancer.id {
            return Err(ServiceError::forbidden("You can only change your own bid"));
        }
        let project = load_project(self.db_client.as_ref(), bid.project_id).await?;
        if project.state()?.is_engaged() {
            return Err(ServiceError::invalid_state(
                "Bids cannot be changed once a freelancer is accepted",
            ));
        }
        if bid.status == BidStatus::Selected {
            return Err(ServiceError::invalid_state("A selected bid cannot be changed"));
        }
        validate_amount(amount, &project)?;

        let updated = self
            .db_client
            .update_bid_amount(bid.id, amount)
            .await?
            .ok_or_else(|| ServiceError::invalid_state("A selected bid cannot be changed"))?;

        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!(
                    "{} changed their bid on \"{}\" to {}",
                    freelancer.name, project.title, amount
                ),
            )
            .await?;

        Ok(updated)
    }

    /// Marks a bid as the client's pick. Other bids stay until acceptance.
    pub async fn select_bid(&self, client: &User, bid_id: Uuid) -> Result<(Project, Bid), ServiceError> {
        let bid = self.load_bid(bid_id).await?;
        let project = load_project(self.db_client.as_ref(), bid.project_id).await?;
        if !project.is_client(client.id) {
            return Err(ServiceError::forbidden("Only the project's client can select a bid"));
        }

        let next = project.state()?.select()?;
        let (project, bid) = self
            .db_client
            .select_bid(bid.id, project.id, project.version, &next.to_lifecycle())
            .await?
            .ok_or_else(ServiceError::concurrent_update)?;

        tracing::info!("Bid {} selected on project {}", bid.id, project.id);
        self.notification_service
            .log_activity(
                client.id,
                format!("Selected a bid of {} on \"{}\"", bid.amount, project.title),
            )
            .await?;
        self.notification_service
            .notify(
                bid.freelancer_id,
                Some(project.id),
                format!("Your bid on \"{}\" has been selected", project.title),
            )
            .await?;

        Ok((project, bid))
    }

    /// Engages the bidder and clears every bid and direct hire of the project.
    pub async fn accept_bid(&self, caller: &User, bid_id: Uuid) -> Result<(Project, Bid), ServiceError> {
        let bid = self.load_bid(bid_id).await?;
        let project = load_project(self.db_client.as_ref(), bid.project_id).await?;
        if bid.freelancer_id != caller.id && !project.is_client(caller.id) {
            return Err(ServiceError::forbidden(
                "Only the bidder or the project's client can accept this bid",
            ));
        }
        if bid.status != BidStatus::Selected {
            return Err(ServiceError::invalid_state(
                "Bid must be selected before it can be accepted",
            ));
        }

        let next = project.state()?.accept(bid.freelancer_id, bid.amount)?;
        let project = self
            .db_client
            .finalize_engagement(
                project.id,
                project.version,
                EngagementOffer::SelectedBid(bid.id),
                &next.to_lifecycle(),
            )
            .await?
            .ok_or_else(ServiceError::concurrent_update)?;

        tracing::info!(
            "Bid {} accepted; freelancer {} engaged on project {} for {}",
            bid.id,
            bid.freelancer_id,
            project.id,
            bid.amount
        );
        self.notification_service
            .log_activity(
                bid.freelancer_id,
                format!("Started working on \"{}\"", project.title),
            )
            .await?;
        self.notification_service
            .log_activity(
                project.client_id,
                format!("Accepted a bid of {} on \"{}\"", bid.amount, project.title),
            )
            .await?;
        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!("A bid of {} on \"{}\" was accepted", bid.amount, project.title),
            )
            .await?;

        Ok((project, bid))
    }

    /// Deletes a bid; a selected project with no bids left reopens.
    pub async fn remove_bid(
        &self,
        caller: &User,
        bid_id: Uuid,
        kind: BidRemovalKind,
    ) -> Result<BidRemoval, ServiceError> {
        let bid = self.load_bid(bid_id).await?;
        let project = load_project(self.db_client.as_ref(), bid.project_id).await?;
        if bid.freelancer_id != caller.id && !project.is_client(caller.id) {
            return Err(ServiceError::forbidden(
                "Only the bidder or the project's client can remove this bid",
            ));
        }
        if project.state()?.is_engaged() {
            return Err(ServiceError::invalid_state(
                "Bids cannot be changed once a freelancer is accepted",
            ));
        }

        let removal = self
            .db_client
            .remove_bid(bid.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Bid"))?;

        if removal.reverted {
            tracing::info!(
                "Last bid left project {}; reverted to pending",
                removal.project.id
            );
        }

        let verb = match kind {
            BidRemovalKind::Rejected => "rejected",
            BidRemovalKind::Withdrawn => "withdrawn",
        };
        let action = match kind {
            BidRemovalKind::Rejected => format!("Rejected a bid on \"{}\"", project.title),
            BidRemovalKind::Withdrawn => format!("Withdrew your bid on \"{}\"", project.title),
        };
        self.notification_service
            .log_activity(caller.id, action)
            .await?;
        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!("A bid on \"{}\" was {}", project.title, verb),
            )
            .await?;
        if kind == BidRemovalKind::Rejected && bid.freelancer_id != caller.id {
            self.notification_service
                .notify(
                    bid.freelancer_id,
                    Some(project.id),
                    format!("Your bid on \"{}\" was rejected", project.title),
                )
                .await?;
        }

        Ok(removal)
    }

    pub async fn create_direct_hire(
        &self,
        client: &User,
        freelancer_id: Uuid,
        project_id: Uuid,
    ) -> Result<DirectHire, ServiceError> {
        let project = load_project(self.db_client.as_ref(), project_id).await?;
        if !project.is_client(client.id) {
            return Err(ServiceError::forbidden(
                "Only the project's client can hire directly",
            ));
        }
        let freelancer = self
            .db_client
            .get_user(Some(freelancer_id), None)
            .await?
            .filter(|user| user.role == UserRole::Freelancer)
            .ok_or_else(|| ServiceError::not_found("Freelancer"))?;

        let state = project.state()?;
        if state.is_engaged() {
            return Err(ServiceError::invalid_state(
                "Project already has an accepted freelancer",
            ));
        }
        if !state.is_funded() {
            return Err(ServiceError::invalid_state(
                "Escrow must be funded before hiring directly",
            ));
        }

        let hire = match self
            .db_client
            .create_direct_hire(freelancer.id, client.id, project.id)
            .await?
        {
            Some(hire) => hire,
            None => {
                return Err(self
                    .refused_offer(
                        project.id,
                        "This freelancer already has a direct hire offer for the project",
                    )
                    .await)
            }
        };

        self.notification_service
            .log_activity(
                client.id,
                format!("Offered \"{}\" to {}", project.title, freelancer.name),
            )
            .await?;
        self.notification_service
            .notify(
                freelancer.id,
                Some(project.id),
                format!("You have a direct hire offer for \"{}\"", project.title),
            )
            .await?;

        Ok(hire)
    }

    /// Engages the named freelancer for the full budget.
    pub async fn accept_direct_hire(
        &self,
        freelancer: &User,
        direct_hire_id: Uuid,
    ) -> Result<Project, ServiceError> {
        let hire = self.load_direct_hire(direct_hire_id).await?;
        if hire.freelancer_id != freelancer.id {
            return Err(ServiceError::forbidden(
                "Only the hired freelancer can accept this offer",
            ));
        }
        let project = load_project(self.db_client.as_ref(), hire.project_id).await?;

        let next = project.state()?.accept(freelancer.id, project.budget)?;
        let project = self
            .db_client
            .finalize_engagement(
                project.id,
                project.version,
                EngagementOffer::DirectHire(hire.id),
                &next.to_lifecycle(),
            )
            .await?
            .ok_or_else(ServiceError::concurrent_update)?;

        tracing::info!(
            "Direct hire {} accepted; freelancer {} engaged on project {}",
            hire.id,
            freelancer.id,
            project.id
        );
        self.notification_service
            .log_activity(freelancer.id, format!("Started working on \"{}\"", project.title))
            .await?;
        self.notification_service
            .log_activity(
                project.client_id,
                format!("{} accepted \"{}\"", freelancer.name, project.title),
            )
            .await?;
        self.notification_service
            .notify(
                project.client_id,
                Some(project.id),
                format!("{} accepted your offer for \"{}\"", freelancer.name, project.title),
            )
            .await?;

        Ok(project)
    }

    pub async fn reject_direct_hire(
        &self,
        freelancer: &User,
        direct_hire_id: Uuid,
    ) -> Result<DirectHire, ServiceError> {
        let hire = self.load_direct_hire(direct_hire_id).await?;
        if hire.freelancer_id != freelancer.id {
            return Err(ServiceError::forbidden(
                "Only the hired freelancer can reject this offer",
            ));
        }

        let removed = self
            .db_client
            .delete_direct_hire(hire.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Direct hire"))?;

        self.notification_service
            .notify(
                hire.client_id,
                Some(hire.project_id),
                format!("{} declined your direct hire offer", freelancer.name),
            )
            .await?;

        Ok(removed)
    }
}
