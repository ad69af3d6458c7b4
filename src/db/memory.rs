use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    activitydb::{ActivityExt, LearningExt, NotificationExt, ACTIVITY_LOG_LIMIT},
    biddb::BidExt,
    directhiredb::DirectHireExt,
    freelancerdb::FreelancerExt,
    paymentdb::PaymentExt,
    projectdb::ProjectExt,
    reviewdb::ReviewExt,
    userdb::UserExt,
};
use crate::models::{
    activitymodel::{Activity, LearningMaterial, Notification},
    bidmodel::{Bid, BidRemoval, BidStatus, DirectHire, EngagementOffer},
    freelancermodel::{FreelancerDirectoryEntry, FreelancerInformation},
    paymentmodel::{Payment, PaymentStatus},
    projectmodel::{Project, ProjectChanges, ProjectLifecycle, ProjectStatus},
    projectstate::ProjectState,
    reviewmodel::{Review, ReviewerType},
    usermodel::{User, UserRole},
};

#[derive(Default)]
struct Tables {
    clock: i64,
    users: Vec<User>,
    freelancers: Vec<FreelancerInformation>,
    projects: Vec<Project>,
    bids: Vec<Bid>,
    direct_hires: Vec<DirectHire>,
    payments: Vec<Payment>,
    reviews: Vec<Review>,
    notifications: Vec<Notification>,
    activities: Vec<Activity>,
    materials: Vec<LearningMaterial>,
}

impl Tables {
    /// Strictly increasing timestamps so "latest first" ordering is stable.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000) + Duration::milliseconds(self.clock)
    }

    fn cas_project(
        &mut self,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Option<Project> {
        let now = self.tick();
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == project_id && p.version == expected_version)?;
        project.lifecycle = lifecycle.clone();
        project.version += 1;
        project.updated_at = now;
        Some(project.clone())
    }

    fn takes_offers(&self, project_id: Uuid) -> bool {
        self.projects.iter().any(|p| {
            p.id == project_id
                && matches!(
                    p.lifecycle.status,
                    ProjectStatus::Pending | ProjectStatus::Selected
                )
        })
    }

    fn has_offer(&self, project_id: Uuid, offer: EngagementOffer) -> bool {
        match offer {
            EngagementOffer::SelectedBid(id) => self.bids.iter().any(|b| {
                b.id == id && b.project_id == project_id && b.status == BidStatus::Selected
            }),
            EngagementOffer::DirectHire(id) => self
                .direct_hires
                .iter()
                .any(|d| d.id == id && d.project_id == project_id),
        }
    }
}

/// Single-lock in-memory store with the same atomicity as the Postgres one.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a project row as-is, for arranging fixtures.
    pub async fn put_project(&self, project: Project) {
        let mut t = self.tables.write().await;
        t.projects.retain(|p| p.id != project.id);
        t.projects.push(project);
    }

    pub async fn all_notifications(&self) -> Vec<Notification> {
        self.tables.read().await.notifications.clone()
    }
}

fn latest_first<T: Clone>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|r| std::cmp::Reverse(key(r)));
    rows
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(match (user_id, email) {
            (Some(id), _) => t.users.iter().find(|u| u.id == id).cloned(),
            (None, Some(email)) => t
                .users
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .cloned(),
            _ => None,
        })
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(t.users.iter().cloned(), |u| u.created_at))
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Ok(None);
        }
        let now = t.tick();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_lowercase(),
            password: password.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(Some(user))
    }

    async fn update_user_name(&self, user_id: Uuid, name: &str) -> Result<User, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.name = name.to_string();
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: &str,
    ) -> Result<User, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.password = password.to_string();
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.write().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != user_id);
        if t.users.len() == before {
            return Ok(false);
        }
        t.freelancers.retain(|f| f.user_id != user_id);
        let owned: Vec<Uuid> = t
            .projects
            .iter()
            .filter(|p| p.client_id == user_id)
            .map(|p| p.id)
            .collect();
        t.projects.retain(|p| p.client_id != user_id);
        t.bids
            .retain(|b| b.freelancer_id != user_id && !owned.contains(&b.project_id));
        t.direct_hires.retain(|d| {
            d.freelancer_id != user_id && d.client_id != user_id && !owned.contains(&d.project_id)
        });
        t.notifications.retain(|n| n.user_id != user_id);
        t.activities.retain(|a| a.user_id != user_id);
        Ok(true)
    }

    async fn get_freelancer_directory(&self) -> Result<Vec<FreelancerDirectoryEntry>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.users
            .iter()
            .filter(|u| u.role == UserRole::Freelancer)
            .filter_map(|u| {
                t.freelancers
                    .iter()
                    .find(|f| f.user_id == u.id)
                    .map(|f| FreelancerDirectoryEntry {
                        id: u.id,
                        name: u.name.clone(),
                        email: u.email.clone(),
                        skills: f.skills.clone(),
                        portfolio: f.portfolio.clone(),
                        experience: f.experience.clone(),
                    })
            })
            .collect())
    }
}

#[async_trait]
impl FreelancerExt for MemoryStore {
    async fn get_freelancer_information(
        &self,
        user_id: Uuid,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.freelancers.iter().find(|f| f.user_id == user_id).cloned())
    }

    async fn create_freelancer_information(
        &self,
        user_id: Uuid,
        skills: Vec<String>,
        portfolio: &str,
        experience: &str,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if t.freelancers.iter().any(|f| f.user_id == user_id) {
            return Ok(None);
        }
        let info = FreelancerInformation {
            id: Uuid::new_v4(),
            user_id,
            skills,
            portfolio: portfolio.to_string(),
            experience: experience.to_string(),
            earnings: 0.0,
            reviews: 0.0,
            projects_completed: 0,
        };
        t.freelancers.push(info.clone());
        Ok(Some(info))
    }

    async fn update_freelancer_information(
        &self,
        user_id: Uuid,
        skills: Option<Vec<String>>,
        portfolio: Option<String>,
        experience: Option<String>,
    ) -> Result<Option<FreelancerInformation>, sqlx::Error> {
        let mut t = self.tables.write().await;
        let Some(info) = t.freelancers.iter_mut().find(|f| f.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(skills) = skills {
            info.skills = skills;
        }
        if let Some(portfolio) = portfolio {
            info.portfolio = portfolio;
        }
        if let Some(experience) = experience {
            info.experience = experience;
        }
        Ok(Some(info.clone()))
    }

    async fn set_freelancer_rating(&self, user_id: Uuid, rating: f64) -> Result<(), sqlx::Error> {
        let mut t = self.tables.write().await;
        if let Some(info) = t.freelancers.iter_mut().find(|f| f.user_id == user_id) {
            info.reviews = rating;
        }
        Ok(())
    }

    async fn increment_projects_completed(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        let mut t = self.tables.write().await;
        if let Some(info) = t.freelancers.iter_mut().find(|f| f.user_id == user_id) {
            info.projects_completed += 1;
        }
        Ok(())
    }

    async fn add_freelancer_earnings(&self, user_id: Uuid, amount: f64) -> Result<(), sqlx::Error> {
        let mut t = self.tables.write().await;
        if let Some(info) = t.freelancers.iter_mut().find(|f| f.user_id == user_id) {
            info.earnings += amount;
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectExt for MemoryStore {
    async fn create_project(
        &self,
        client_id: Uuid,
        title: &str,
        description: &str,
        budget: f64,
        deadline: DateTime<Utc>,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if t
            .projects
            .iter()
            .any(|p| p.client_id == client_id && p.title == title)
        {
            return Ok(None);
        }
        let now = t.tick();
        let project = Project {
            id: Uuid::new_v4(),
            client_id,
            title: title.to_string(),
            description: description.to_string(),
            budget,
            deadline,
            lifecycle: ProjectState::new_open().to_lifecycle(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        t.projects.push(project.clone());
        Ok(Some(project))
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn get_projects(&self) -> Result<Vec<Project>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(t.projects.iter().cloned(), |p| p.created_at))
    }

    async fn get_latest_projects(&self, limit: i64) -> Result<Vec<Project>, sqlx::Error> {
        let mut projects = self.get_projects().await?;
        projects.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(projects)
    }

    async fn get_client_projects(&self, client_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.projects.iter().filter(|p| p.client_id == client_id).cloned(),
            |p| p.created_at,
        ))
    }

    async fn get_projects_due_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let t = self.tables.read().await;
        let mut projects: Vec<Project> = t
            .projects
            .iter()
            .filter(|p| p.deadline < cutoff)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.deadline);
        Ok(projects)
    }

    async fn update_project_details(
        &self,
        project_id: Uuid,
        expected_version: i64,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let Some(project) = t
            .projects
            .iter_mut()
            .find(|p| p.id == project_id && p.version == expected_version)
        else {
            return Ok(None);
        };
        if let Some(description) = &changes.description {
            project.description = description.clone();
        }
        if let Some(budget) = changes.budget {
            project.budget = budget;
        }
        if let Some(deadline) = changes.deadline {
            project.deadline = deadline;
        }
        project.version += 1;
        project.updated_at = now;
        Ok(Some(project.clone()))
    }

    async fn update_project_lifecycle(
        &self,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut t = self.tables.write().await;
        Ok(t.cas_project(project_id, expected_version, lifecycle))
    }

    async fn finalize_engagement(
        &self,
        project_id: Uuid,
        expected_version: i64,
        offer: EngagementOffer,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if !t.has_offer(project_id, offer) {
            return Ok(None);
        }
        let Some(project) = t.cas_project(project_id, expected_version, lifecycle) else {
            return Ok(None);
        };
        t.bids.retain(|b| b.project_id != project_id);
        t.direct_hires.retain(|d| d.project_id != project_id);
        Ok(Some(project))
    }

    async fn delete_project_if_open(&self, project_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.write().await;
        let deletable = t.projects.iter().any(|p| {
            p.id == project_id
                && ProjectState::try_from(&p.lifecycle)
                    .map(|s| s.is_deletable())
                    .unwrap_or(false)
        });
        if !deletable {
            return Ok(false);
        }
        t.projects.retain(|p| p.id != project_id);
        t.bids.retain(|b| b.project_id != project_id);
        t.direct_hires.retain(|d| d.project_id != project_id);
        t.payments.retain(|p| p.project_id != project_id);
        t.reviews.retain(|r| r.project_id != project_id);
        Ok(true)
    }
}

#[async_trait]
impl BidExt for MemoryStore {
    async fn create_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
        amount: f64,
    ) -> Result<Option<Bid>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if !t.takes_offers(project_id)
            || t.bids
                .iter()
                .any(|b| b.project_id == project_id && b.freelancer_id == freelancer_id)
        {
            return Ok(None);
        }
        let now = t.tick();
        let bid = Bid {
            id: Uuid::new_v4(),
            project_id,
            freelancer_id,
            amount,
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        t.bids.push(bid.clone());
        Ok(Some(bid))
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.bids.iter().find(|b| b.id == bid_id).cloned())
    }

    async fn get_project_bids(&self, project_id: Uuid) -> Result<Vec<Bid>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.bids
            .iter()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_freelancer_bid(
        &self,
        project_id: Uuid,
        freelancer_id: Uuid,
    ) -> Result<Option<Bid>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.bids
            .iter()
            .find(|b| b.project_id == project_id && b.freelancer_id == freelancer_id)
            .cloned())
    }

    async fn get_selected_bids(&self, freelancer_id: Uuid) -> Result<Vec<Bid>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.bids
                .iter()
                .filter(|b| b.freelancer_id == freelancer_id && b.status == BidStatus::Selected)
                .cloned(),
            |b| b.updated_at,
        ))
    }

    async fn update_bid_amount(&self, bid_id: Uuid, amount: f64) -> Result<Option<Bid>, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let Some(bid) = t
            .bids
            .iter_mut()
            .find(|b| b.id == bid_id && b.status == BidStatus::Pending)
        else {
            return Ok(None);
        };
        bid.amount = amount;
        bid.updated_at = now;
        Ok(Some(bid.clone()))
    }

    async fn select_bid(
        &self,
        bid_id: Uuid,
        project_id: Uuid,
        expected_version: i64,
        lifecycle: &ProjectLifecycle,
    ) -> Result<Option<(Project, Bid)>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if !t
            .bids
            .iter()
            .any(|b| b.id == bid_id && b.project_id == project_id)
        {
            return Ok(None);
        }
        let Some(project) = t.cas_project(project_id, expected_version, lifecycle) else {
            return Ok(None);
        };
        let now = t.tick();
        let Some(bid) = t.bids.iter_mut().find(|b| b.id == bid_id) else {
            return Ok(None);
        };
        bid.status = BidStatus::Selected;
        bid.updated_at = now;
        Ok(Some((project, bid.clone())))
    }

    async fn remove_bid(&self, bid_id: Uuid) -> Result<Option<BidRemoval>, sqlx::Error> {
        let mut t = self.tables.write().await;
        let Some(index) = t.bids.iter().position(|b| b.id == bid_id) else {
            return Ok(None);
        };
        let bid = t.bids.remove(index);
        let none_left = !t.bids.iter().any(|b| b.project_id == bid.project_id);
        let now = t.tick();
        let project = t
            .projects
            .iter_mut()
            .find(|p| p.id == bid.project_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        let reverted = none_left && project.lifecycle.status == ProjectStatus::Selected;
        if reverted {
            project.lifecycle.status = ProjectStatus::Pending;
            project.version += 1;
            project.updated_at = now;
        }
        Ok(Some(BidRemoval {
            bid,
            project: project.clone(),
            reverted,
        }))
    }
}

#[async_trait]
impl DirectHireExt for MemoryStore {
    async fn create_direct_hire(
        &self,
        freelancer_id: Uuid,
        client_id: Uuid,
        project_id: Uuid,
    ) -> Result<Option<DirectHire>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if !t.takes_offers(project_id) || t.direct_hires.iter().any(|d| {
            d.freelancer_id == freelancer_id && d.client_id == client_id && d.project_id == project_id
        }) {
            return Ok(None);
        }
        let now = t.tick();
        let hire = DirectHire {
            id: Uuid::new_v4(),
            freelancer_id,
            client_id,
            project_id,
            created_at: now,
        };
        t.direct_hires.push(hire.clone());
        Ok(Some(hire))
    }

    async fn get_direct_hire(&self, direct_hire_id: Uuid) -> Result<Option<DirectHire>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.direct_hires.iter().find(|d| d.id == direct_hire_id).cloned())
    }

    async fn get_client_direct_hires(&self, client_id: Uuid) -> Result<Vec<DirectHire>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.direct_hires.iter().filter(|d| d.client_id == client_id).cloned(),
            |d| d.created_at,
        ))
    }

    async fn get_freelancer_direct_hires(
        &self,
        freelancer_id: Uuid,
    ) -> Result<Vec<DirectHire>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.direct_hires
                .iter()
                .filter(|d| d.freelancer_id == freelancer_id)
                .filter(|d| {
                    t.projects.iter().any(|p| {
                        p.id == d.project_id
                            && matches!(
                                p.lifecycle.status,
                                ProjectStatus::Pending | ProjectStatus::Selected
                            )
                    })
                })
                .cloned(),
            |d| d.created_at,
        ))
    }

    async fn get_project_direct_hires(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<DirectHire>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.direct_hires
            .iter()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn delete_direct_hire(
        &self,
        direct_hire_id: Uuid,
    ) -> Result<Option<DirectHire>, sqlx::Error> {
        let mut t = self.tables.write().await;
        let Some(index) = t.direct_hires.iter().position(|d| d.id == direct_hire_id) else {
            return Ok(None);
        };
        Ok(Some(t.direct_hires.remove(index)))
    }
}

#[async_trait]
impl PaymentExt for MemoryStore {
    async fn upsert_payment(
        &self,
        project_id: Uuid,
        client_id: Uuid,
        freelancer_id: Option<Uuid>,
        amount: f64,
        status: PaymentStatus,
        payment_intent_id: &str,
    ) -> Result<Payment, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        if let Some(payment) = t.payments.iter_mut().find(|p| p.project_id == project_id) {
            payment.freelancer_id = freelancer_id.or(payment.freelancer_id);
            payment.amount = amount;
            payment.status = status;
            payment.payment_intent_id = payment_intent_id.to_string();
            payment.updated_at = now;
            return Ok(payment.clone());
        }
        let payment = Payment {
            id: Uuid::new_v4(),
            project_id,
            client_id,
            freelancer_id,
            amount,
            status,
            payment_intent_id: payment_intent_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.payments.push(payment.clone());
        Ok(payment)
    }

    async fn update_payment_status(
        &self,
        project_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let Some(payment) = t.payments.iter_mut().find(|p| p.project_id == project_id) else {
            return Ok(None);
        };
        payment.status = status;
        payment.updated_at = now;
        Ok(Some(payment.clone()))
    }

    async fn get_project_payment(&self, project_id: Uuid) -> Result<Option<Payment>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.payments.iter().find(|p| p.project_id == project_id).cloned())
    }

    async fn get_client_payments(&self, client_id: Uuid) -> Result<Vec<Payment>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.payments.iter().filter(|p| p.client_id == client_id).cloned(),
            |p| p.created_at,
        ))
    }
}

#[async_trait]
impl ReviewExt for MemoryStore {
    async fn create_review(
        &self,
        project_id: Uuid,
        reviewer_id: Uuid,
        receiver_id: Uuid,
        rating: i32,
        comment: &str,
        reviewer_type: ReviewerType,
    ) -> Result<Option<Review>, sqlx::Error> {
        let mut t = self.tables.write().await;
        if t
            .reviews
            .iter()
            .any(|r| r.project_id == project_id && r.reviewer_id == reviewer_id)
        {
            return Ok(None);
        }
        let now = t.tick();
        let review = Review {
            id: Uuid::new_v4(),
            project_id,
            reviewer_id,
            receiver_id,
            rating,
            comment: comment.to_string(),
            reviewer_type,
            created_at: now,
        };
        t.reviews.push(review.clone());
        Ok(Some(review))
    }

    async fn get_review_by_reviewer(
        &self,
        project_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<Option<Review>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.reviews
            .iter()
            .find(|r| r.project_id == project_id && r.reviewer_id == reviewer_id)
            .cloned())
    }

    async fn get_received_reviews(&self, receiver_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.reviews.iter().filter(|r| r.receiver_id == receiver_id).cloned(),
            |r| r.created_at,
        ))
    }

    async fn get_submitted_reviews(&self, reviewer_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.reviews.iter().filter(|r| r.reviewer_id == reviewer_id).cloned(),
            |r| r.created_at,
        ))
    }

    async fn get_project_reviews(&self, project_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.reviews
            .iter()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_average_rating(
        &self,
        receiver_id: Uuid,
        reviewer_type: Option<ReviewerType>,
    ) -> Result<Option<f64>, sqlx::Error> {
        let t = self.tables.read().await;
        let ratings: Vec<f64> = t
            .reviews
            .iter()
            .filter(|r| r.receiver_id == receiver_id)
            .filter(|r| reviewer_type.map_or(true, |kind| r.reviewer_type == kind))
            .map(|r| f64::from(r.rating))
            .collect();
        if ratings.is_empty() {
            return Ok(None);
        }
        Ok(Some(ratings.iter().sum::<f64>() / ratings.len() as f64))
    }
}

#[async_trait]
impl NotificationExt for MemoryStore {
    async fn create_notification(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
        message: &str,
    ) -> Result<Notification, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            project_id,
            message: message.to_string(),
            read: false,
            created_at: now,
        };
        t.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn get_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(
            t.notifications.iter().filter(|n| n.user_id == user_id).cloned(),
            |n| n.created_at,
        ))
    }

    async fn mark_notifications_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let mut t = self.tables.write().await;
        let mut updated = 0;
        for n in t
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_notification(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.write().await;
        let before = t.notifications.len();
        t.notifications
            .retain(|n| !(n.id == notification_id && n.user_id == user_id));
        Ok(t.notifications.len() < before)
    }

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(t.notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }
}

#[async_trait]
impl ActivityExt for MemoryStore {
    async fn record_activity(&self, user_id: Uuid, action: &str) -> Result<Activity, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let activity = Activity {
            id: Uuid::new_v4(),
            user_id,
            action: action.to_string(),
            created_at: now,
        };
        t.activities.push(activity.clone());

        let mut mine: Vec<(DateTime<Utc>, Uuid)> = t
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| (a.created_at, a.id))
            .collect();
        mine.sort_by_key(|(created_at, _)| std::cmp::Reverse(*created_at));
        let keep: Vec<Uuid> = mine
            .into_iter()
            .take(ACTIVITY_LOG_LIMIT as usize)
            .map(|(_, id)| id)
            .collect();
        t.activities
            .retain(|a| a.user_id != user_id || keep.contains(&a.id));

        Ok(activity)
    }

    async fn get_activities(&self, user_id: Uuid) -> Result<Vec<Activity>, sqlx::Error> {
        let t = self.tables.read().await;
        let mut activities =
            latest_first(t.activities.iter().filter(|a| a.user_id == user_id).cloned(), |a| {
                a.created_at
            });
        activities.truncate(ACTIVITY_LOG_LIMIT as usize);
        Ok(activities)
    }
}

#[async_trait]
impl LearningExt for MemoryStore {
    async fn create_learning_material(
        &self,
        title: &str,
        description: &str,
        link: &str,
        posted_by: Uuid,
    ) -> Result<LearningMaterial, sqlx::Error> {
        let mut t = self.tables.write().await;
        let now = t.tick();
        let material = LearningMaterial {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            link: link.to_string(),
            posted_by: Some(posted_by),
            created_at: now,
        };
        t.materials.push(material.clone());
        Ok(material)
    }

    async fn get_learning_materials(&self) -> Result<Vec<LearningMaterial>, sqlx::Error> {
        let t = self.tables.read().await;
        Ok(latest_first(t.materials.iter().cloned(), |m| m.created_at))
    }

    async fn delete_learning_material(&self, material_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut t = self.tables.write().await;
        let before = t.materials.len();
        t.materials.retain(|m| m.id != material_id);
        Ok(t.materials.len() < before)
    }
}
