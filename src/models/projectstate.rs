use thiserror::Error;
use uuid::Uuid;

use super::projectmodel::{
    ApprovalStatus, ClaimStatus, EscrowStatus, ProjectLifecycle, ProjectStatus,
};

#[derive(Debug, Error, PartialEq)]
pub enum LifecycleError {
    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Project lifecycle record is inconsistent: {0}")]
    Corrupt(String),
}

fn invalid_transition(msg: &str) -> LifecycleError {
    LifecycleError::InvalidTransition(msg.to_string())
}

fn corrupt(msg: &str) -> LifecycleError {
    LifecycleError::Corrupt(msg.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpenEscrow {
    Unfunded,
    Funded { payment_intent_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkSubmission {
    InProgress,
    Submitted { url: String },
    Rejected { comment: String },
    Approved { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payout {
    Held,
    Released,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Engagement {
    pub freelancer: Uuid,
    pub amount: f64,
    pub payment_intent_id: String,
    pub progress: u8,
    pub work: WorkSubmission,
    pub payout: Payout,
    pub remaining_claimed: bool,
}

/// Lifecycle of a project. Status, escrow and completion are one value here so
/// that combinations such as "engaged without funds" cannot be expressed.
///
/// ```text
/// Open{Unfunded} --fund--> Open{Funded} --select--> Selected
///       ^                      |                       |
///       +-------refund---------+        accept (bid or direct hire)
///                              +----------accept-------+--> Engaged{Held}
/// Engaged: InProgress -> Submitted -> Approved | Rejected -> Submitted ...
/// Engaged{Approved, Held} --release--> Engaged{Approved, Released}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectState {
    Open { escrow: OpenEscrow },
    Selected { payment_intent_id: String },
    Engaged(Engagement),
}

impl ProjectState {
    pub fn new_open() -> Self {
        ProjectState::Open {
            escrow: OpenEscrow::Unfunded,
        }
    }

    pub fn engagement(&self) -> Option<&Engagement> {
        match self {
            ProjectState::Engaged(engagement) => Some(engagement),
            _ => None,
        }
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self, ProjectState::Engaged(_))
    }

    pub fn is_funded(&self) -> bool {
        match self {
            ProjectState::Open { escrow } => matches!(escrow, OpenEscrow::Funded { .. }),
            ProjectState::Selected { .. } => true,
            ProjectState::Engaged(e) => e.payout == Payout::Held,
        }
    }

    /// Only an open project that holds no client money may be deleted.
    pub fn is_deletable(&self) -> bool {
        matches!(
            self,
            ProjectState::Open {
                escrow: OpenEscrow::Unfunded
            }
        )
    }

    fn held_intent(&self) -> Result<String, LifecycleError> {
        match self {
            ProjectState::Open {
                escrow: OpenEscrow::Funded { payment_intent_id },
            }
            | ProjectState::Selected { payment_intent_id } => Ok(payment_intent_id.clone()),
            ProjectState::Open {
                escrow: OpenEscrow::Unfunded,
            } => Err(invalid_transition(
                "Escrow must be funded before a freelancer can be engaged",
            )),
            ProjectState::Engaged(_) => Err(invalid_transition(
                "Project already has an accepted freelancer",
            )),
        }
    }

    pub fn ensure_fundable(&self) -> Result<(), LifecycleError> {
        match self {
            ProjectState::Open {
                escrow: OpenEscrow::Unfunded,
            } => Ok(()),
            ProjectState::Engaged(_) => Err(invalid_transition(
                "Project already has an accepted freelancer",
            )),
            _ => Err(invalid_transition("Escrow is already funded")),
        }
    }

    pub fn fund(&self, payment_intent_id: &str) -> Result<Self, LifecycleError> {
        self.ensure_fundable()?;
        Ok(ProjectState::Open {
            escrow: OpenEscrow::Funded {
                payment_intent_id: payment_intent_id.to_string(),
            },
        })
    }

    pub fn refund(&self) -> Result<Self, LifecycleError> {
        match self {
            ProjectState::Open {
                escrow: OpenEscrow::Funded { .. },
            } => Ok(ProjectState::new_open()),
            ProjectState::Open {
                escrow: OpenEscrow::Unfunded,
            } => Err(invalid_transition("Escrow is not funded")),
            _ => Err(invalid_transition(
                "Escrow can only be refunded while the project is open",
            )),
        }
    }

    pub fn select(&self) -> Result<Self, LifecycleError> {
        let payment_intent_id = self.held_intent()?;
        Ok(ProjectState::Selected { payment_intent_id })
    }

    /// Move to `Engaged`, either from a selected bid or from a direct hire.
    pub fn accept(&self, freelancer: Uuid, amount: f64) -> Result<Self, LifecycleError> {
        let payment_intent_id = self.held_intent()?;
        if amount.is_nan() || amount <= 0.0 {
            return Err(LifecycleError::Invalid(
                "Accepted amount must be greater than zero".to_string(),
            ));
        }
        Ok(ProjectState::Engaged(Engagement {
            freelancer,
            amount,
            payment_intent_id,
            progress: 0,
            work: WorkSubmission::InProgress,
            payout: Payout::Held,
            remaining_claimed: false,
        }))
    }

    fn engaged(&self) -> Result<&Engagement, LifecycleError> {
        self.engagement()
            .ok_or_else(|| invalid_transition("Project has no accepted freelancer"))
    }

    fn with_engagement(engagement: Engagement) -> Result<Self, LifecycleError> {
        Ok(ProjectState::Engaged(engagement))
    }

    pub fn update_progress(&self, percentage: i32) -> Result<Self, LifecycleError> {
        let engagement = self.engaged()?;
        let progress = checked_percentage(percentage)?;
        match engagement.work {
            WorkSubmission::InProgress | WorkSubmission::Rejected { .. } => {}
            WorkSubmission::Submitted { .. } => {
                return Err(invalid_transition(
                    "Work has been submitted and is awaiting review",
                ))
            }
            WorkSubmission::Approved { .. } => {
                return Err(invalid_transition("Work has already been approved"))
            }
        }
        Self::with_engagement(Engagement {
            progress,
            ..engagement.clone()
        })
    }

    pub fn submit_work(&self, url: &str) -> Result<Self, LifecycleError> {
        let engagement = self.engaged()?;
        if url.trim().is_empty() {
            return Err(LifecycleError::Invalid(
                "Completion URL is required".to_string(),
            ));
        }
        match engagement.work {
            WorkSubmission::InProgress | WorkSubmission::Rejected { .. } => {}
            WorkSubmission::Submitted { .. } => {
                return Err(invalid_transition("Work has already been submitted"))
            }
            WorkSubmission::Approved { .. } => {
                return Err(invalid_transition("Work has already been approved"))
            }
        }
        if engagement.progress != 100 {
            return Err(invalid_transition(
                "Project must be 100% complete before submission",
            ));
        }
        Self::with_engagement(Engagement {
            work: WorkSubmission::Submitted {
                url: url.to_string(),
            },
            ..engagement.clone()
        })
    }

    pub fn approve(&self) -> Result<Self, LifecycleError> {
        let engagement = self.engaged()?;
        match &engagement.work {
            WorkSubmission::Submitted { url } => Self::with_engagement(Engagement {
                work: WorkSubmission::Approved { url: url.clone() },
                ..engagement.clone()
            }),
            _ => Err(invalid_transition("There is no submitted work to approve")),
        }
    }

    /// Reject submitted work. Progress falls back to `progress` or 0.
    pub fn reject(&self, comment: &str, progress: Option<i32>) -> Result<Self, LifecycleError> {
        let engagement = self.engaged()?;
        let progress = checked_percentage(progress.unwrap_or(0))?;
        match engagement.work {
            WorkSubmission::Submitted { .. } => Self::with_engagement(Engagement {
                work: WorkSubmission::Rejected {
                    comment: comment.to_string(),
                },
                progress,
                ..engagement.clone()
            }),
            _ => Err(invalid_transition("There is no submitted work to reject")),
        }
    }

    pub fn release_payout(&self) -> Result<Self, LifecycleError> {
        let engagement = self.engaged()?;
        if engagement.payout == Payout::Released {
            return Err(invalid_transition("Payout has already been released"));
        }
        if !matches!(engagement.work, WorkSubmission::Approved { .. }) {
            return Err(invalid_transition(
                "Work must be approved before the payout is released",
            ));
        }
        Self::with_engagement(Engagement {
            payout: Payout::Released,
            ..engagement.clone()
        })
    }

    /// Budget left over after the accepted amount, if the project is engaged.
    pub fn remaining_budget(&self, budget: f64) -> Option<f64> {
        self.engagement().map(|e| budget - e.amount)
    }

    pub fn claim_remaining(&self, budget: f64) -> Result<Self, LifecycleError> {
        let engagement = self.engaged()?;
        if engagement.remaining_claimed {
            return Err(invalid_transition(
                "Remaining budget has already been claimed",
            ));
        }
        if budget - engagement.amount <= 0.0 {
            return Err(invalid_transition("No remaining budget to claim"));
        }
        Self::with_engagement(Engagement {
            remaining_claimed: true,
            ..engagement.clone()
        })
    }

    pub fn to_lifecycle(&self) -> ProjectLifecycle {
        match self {
            ProjectState::Open { escrow } => {
                let (escrow_status, payment_intent_id) = match escrow {
                    OpenEscrow::Unfunded => (EscrowStatus::NotFunded, None),
                    OpenEscrow::Funded { payment_intent_id } => {
                        (EscrowStatus::Funded, Some(payment_intent_id.clone()))
                    }
                };
                unengaged(ProjectStatus::Pending, escrow_status, payment_intent_id)
            }
            ProjectState::Selected { payment_intent_id } => unengaged(
                ProjectStatus::Selected,
                EscrowStatus::Funded,
                Some(payment_intent_id.clone()),
            ),
            ProjectState::Engaged(e) => {
                let (status, escrow_status) = match e.payout {
                    Payout::Held => (ProjectStatus::Accepted, EscrowStatus::Funded),
                    Payout::Released => (ProjectStatus::Done, EscrowStatus::Released),
                };
                let (approval_status, completion_url, rejection_comment) = match &e.work {
                    WorkSubmission::InProgress => (ApprovalStatus::Pending, None, None),
                    WorkSubmission::Submitted { url } => {
                        (ApprovalStatus::Pending, Some(url.clone()), None)
                    }
                    WorkSubmission::Rejected { comment } => {
                        (ApprovalStatus::Rejected, None, Some(comment.clone()))
                    }
                    WorkSubmission::Approved { url } => {
                        (ApprovalStatus::Approved, Some(url.clone()), None)
                    }
                };
                ProjectLifecycle {
                    status,
                    escrow_status,
                    approval_status,
                    claim_status: if e.remaining_claimed {
                        ClaimStatus::Claimed
                    } else {
                        ClaimStatus::Pending
                    },
                    accepted_freelancer: Some(e.freelancer),
                    accepted_money: Some(e.amount),
                    completed_percentage: i32::from(e.progress),
                    completion_url,
                    rejection_comment,
                    payment_intent_id: Some(e.payment_intent_id.clone()),
                }
            }
        }
    }
}

fn unengaged(
    status: ProjectStatus,
    escrow_status: EscrowStatus,
    payment_intent_id: Option<String>,
) -> ProjectLifecycle {
    ProjectLifecycle {
        status,
        escrow_status,
        approval_status: ApprovalStatus::Pending,
        claim_status: ClaimStatus::Pending,
        accepted_freelancer: None,
        accepted_money: None,
        completed_percentage: 0,
        completion_url: None,
        rejection_comment: None,
        payment_intent_id,
    }
}

fn checked_percentage(percentage: i32) -> Result<u8, LifecycleError> {
    u8::try_from(percentage)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| {
            LifecycleError::Invalid("Completion percentage must be between 0 and 100".to_string())
        })
}

fn held_intent_of(record: &ProjectLifecycle) -> Result<String, LifecycleError> {
    record
        .payment_intent_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| corrupt("funded escrow without a payment reference"))
}

impl TryFrom<&ProjectLifecycle> for ProjectState {
    type Error = LifecycleError;

    fn try_from(record: &ProjectLifecycle) -> Result<Self, Self::Error> {
        match record.status {
            ProjectStatus::Pending => {
                let escrow = match record.escrow_status {
                    // a refunded escrow is open for funding again
                    EscrowStatus::NotFunded | EscrowStatus::Refunded => OpenEscrow::Unfunded,
                    EscrowStatus::Funded => OpenEscrow::Funded {
                        payment_intent_id: held_intent_of(record)?,
                    },
                    EscrowStatus::Released => {
                        return Err(corrupt("open project with released escrow"))
                    }
                };
                Ok(ProjectState::Open { escrow })
            }
            ProjectStatus::Selected => match record.escrow_status {
                EscrowStatus::Funded => Ok(ProjectState::Selected {
                    payment_intent_id: held_intent_of(record)?,
                }),
                _ => Err(corrupt("selected project without funded escrow")),
            },
            ProjectStatus::Accepted | ProjectStatus::Done => {
                let payout = match (record.status, record.escrow_status) {
                    (ProjectStatus::Accepted, EscrowStatus::Funded) => Payout::Held,
                    (ProjectStatus::Done, EscrowStatus::Released) => Payout::Released,
                    _ => return Err(corrupt("engaged project with mismatched escrow")),
                };
                let freelancer = record
                    .accepted_freelancer
                    .ok_or_else(|| corrupt("engaged project without a freelancer"))?;
                let amount = record
                    .accepted_money
                    .ok_or_else(|| corrupt("engaged project without an accepted amount"))?;
                let progress = checked_percentage(record.completed_percentage)
                    .map_err(|_| corrupt("completion percentage out of range"))?;
                let submitted_url = record
                    .completion_url
                    .clone()
                    .filter(|url| !url.is_empty());
                let work = match record.approval_status {
                    ApprovalStatus::Approved => WorkSubmission::Approved {
                        url: submitted_url.unwrap_or_default(),
                    },
                    ApprovalStatus::Rejected => WorkSubmission::Rejected {
                        comment: record.rejection_comment.clone().unwrap_or_default(),
                    },
                    ApprovalStatus::Pending => match submitted_url {
                        Some(url) => WorkSubmission::Submitted { url },
                        None => WorkSubmission::InProgress,
                    },
                };
                if payout == Payout::Released && !matches!(work, WorkSubmission::Approved { .. }) {
                    return Err(corrupt("payout released before approval"));
                }
                Ok(ProjectState::Engaged(Engagement {
                    freelancer,
                    amount,
                    payment_intent_id: held_intent_of(record)?,
                    progress,
                    work,
                    payout,
                    remaining_claimed: record.claim_status == ClaimStatus::Claimed,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded() -> ProjectState {
        ProjectState::new_open().fund("cs_test_1").unwrap()
    }

    fn engaged(amount: f64) -> ProjectState {
        funded().select().unwrap().accept(Uuid::new_v4(), amount).unwrap()
    }

    fn round_trip(state: &ProjectState) -> ProjectState {
        ProjectState::try_from(&state.to_lifecycle()).unwrap()
    }

    #[test]
    fn new_project_is_open_unfunded_and_deletable() {
        let state = ProjectState::new_open();
        let record = state.to_lifecycle();
        assert_eq!(record.status, ProjectStatus::Pending);
        assert_eq!(record.escrow_status, EscrowStatus::NotFunded);
        assert!(state.is_deletable());
        assert!(!state.is_funded());
    }

    #[test]
    fn funded_project_is_not_deletable() {
        assert!(!funded().is_deletable());
        assert!(funded().is_funded());
    }

    #[test]
    fn cannot_fund_twice() {
        assert!(matches!(
            funded().fund("cs_test_2"),
            Err(LifecycleError::InvalidTransition(_))
        ));
    }

    #[test]
    fn refund_only_while_open_and_funded() {
        assert_eq!(funded().refund().unwrap(), ProjectState::new_open());
        assert!(ProjectState::new_open().refund().is_err());
        assert!(funded().select().unwrap().refund().is_err());
        assert!(engaged(50.0).refund().is_err());
    }

    #[test]
    fn select_and_accept_require_funded_escrow() {
        let open = ProjectState::new_open();
        assert!(open.select().is_err());
        assert!(open.accept(Uuid::new_v4(), 10.0).is_err());
    }

    #[test]
    fn direct_hire_accepts_from_open_funded() {
        let freelancer = Uuid::new_v4();
        let state = funded().accept(freelancer, 80.0).unwrap();
        let engagement = state.engagement().unwrap();
        assert_eq!(engagement.freelancer, freelancer);
        assert_eq!(engagement.amount, 80.0);
        assert_eq!(engagement.payment_intent_id, "cs_test_1");
        assert_eq!(engagement.payout, Payout::Held);
    }

    #[test]
    fn cannot_accept_twice() {
        assert!(engaged(50.0).accept(Uuid::new_v4(), 10.0).is_err());
        assert!(engaged(50.0).select().is_err());
    }

    #[test]
    fn progress_is_bounded() {
        let state = engaged(50.0);
        assert!(matches!(
            state.update_progress(101),
            Err(LifecycleError::Invalid(_))
        ));
        assert!(state.update_progress(-1).is_err());
        let state = state.update_progress(60).unwrap();
        assert_eq!(state.engagement().unwrap().progress, 60);
    }

    #[test]
    fn submission_requires_full_progress() {
        let state = engaged(50.0).update_progress(90).unwrap();
        assert!(state.submit_work("https://example.com/work").is_err());
        let state = state.update_progress(100).unwrap();
        let state = state.submit_work("https://example.com/work").unwrap();
        assert!(matches!(
            state.engagement().unwrap().work,
            WorkSubmission::Submitted { .. }
        ));
        // progress is frozen while review is pending
        assert!(state.update_progress(50).is_err());
    }

    #[test]
    fn rejection_resets_progress_and_allows_resubmission() {
        let state = engaged(50.0)
            .update_progress(100)
            .unwrap()
            .submit_work("https://example.com/v1")
            .unwrap()
            .reject("needs more tests", Some(70))
            .unwrap();
        let engagement = state.engagement().unwrap();
        assert_eq!(engagement.progress, 70);
        assert_eq!(
            engagement.work,
            WorkSubmission::Rejected {
                comment: "needs more tests".to_string()
            }
        );
        let record = state.to_lifecycle();
        assert_eq!(record.approval_status, ApprovalStatus::Rejected);
        assert_eq!(record.completion_url, None);

        let state = state
            .update_progress(100)
            .unwrap()
            .submit_work("https://example.com/v2")
            .unwrap();
        assert_eq!(round_trip(&state), state);
    }

    #[test]
    fn reject_without_progress_falls_back_to_zero() {
        let state = engaged(50.0)
            .update_progress(100)
            .unwrap()
            .submit_work("https://example.com/v1")
            .unwrap()
            .reject("", None)
            .unwrap();
        assert_eq!(state.engagement().unwrap().progress, 0);
    }

    #[test]
    fn approve_and_release() {
        let state = engaged(50.0).update_progress(100).unwrap();
        assert!(state.approve().is_err());
        assert!(state.release_payout().is_err());
        let state = state
            .submit_work("https://example.com/final")
            .unwrap()
            .approve()
            .unwrap();
        assert!(state.update_progress(10).is_err());
        let done = state.release_payout().unwrap();
        let record = done.to_lifecycle();
        assert_eq!(record.status, ProjectStatus::Done);
        assert_eq!(record.escrow_status, EscrowStatus::Released);
        assert_eq!(record.approval_status, ApprovalStatus::Approved);
        assert!(done.release_payout().is_err());
        assert_eq!(round_trip(&done), done);
    }

    #[test]
    fn claim_remaining_once_when_budget_left() {
        let state = engaged(60.0);
        assert_eq!(state.remaining_budget(100.0), Some(40.0));
        let claimed = state.claim_remaining(100.0).unwrap();
        assert_eq!(claimed.to_lifecycle().claim_status, ClaimStatus::Claimed);
        assert!(claimed.claim_remaining(100.0).is_err());
        assert!(engaged(100.0).claim_remaining(100.0).is_err());
        assert!(funded().claim_remaining(100.0).is_err());
    }

    #[test]
    fn refunded_escrow_reads_as_unfunded() {
        let mut record = ProjectState::new_open().to_lifecycle();
        record.escrow_status = EscrowStatus::Refunded;
        assert_eq!(
            ProjectState::try_from(&record).unwrap(),
            ProjectState::new_open()
        );
    }

    #[test]
    fn inconsistent_records_are_rejected() {
        let mut record = ProjectState::new_open().to_lifecycle();
        record.status = ProjectStatus::Accepted;
        assert!(matches!(
            ProjectState::try_from(&record),
            Err(LifecycleError::Corrupt(_))
        ));

        let mut record = funded().select().unwrap().to_lifecycle();
        record.escrow_status = EscrowStatus::NotFunded;
        assert!(ProjectState::try_from(&record).is_err());

        let mut record = engaged(10.0).to_lifecycle();
        record.completed_percentage = 140;
        assert!(ProjectState::try_from(&record).is_err());
    }

    #[test]
    fn persisted_form_round_trips() {
        for state in [
            ProjectState::new_open(),
            funded(),
            funded().select().unwrap(),
            engaged(25.0),
            engaged(25.0).update_progress(40).unwrap(),
        ] {
            assert_eq!(round_trip(&state), state);
        }
    }
}
