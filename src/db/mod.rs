pub mod activitydb;
pub mod biddb;
pub mod db;
pub mod directhiredb;
pub mod freelancerdb;
#[cfg(test)]
pub mod memory;
pub mod paymentdb;
pub mod projectdb;
pub mod reviewdb;
pub mod userdb;

pub use activitydb::{ActivityExt, LearningExt, NotificationExt};
pub use biddb::BidExt;
pub use db::DBClient;
pub use directhiredb::DirectHireExt;
pub use freelancerdb::FreelancerExt;
pub use paymentdb::PaymentExt;
pub use projectdb::ProjectExt;
pub use reviewdb::ReviewExt;
pub use userdb::UserExt;

/// Every persistence capability the marketplace needs, usable as
/// `Arc<dyn MarketStore>`.
pub trait MarketStore:
    UserExt
    + FreelancerExt
    + ProjectExt
    + BidExt
    + DirectHireExt
    + PaymentExt
    + ReviewExt
    + NotificationExt
    + ActivityExt
    + LearningExt
    + Send
    + Sync
{
}

impl<T> MarketStore for T where
    T: UserExt
        + FreelancerExt
        + ProjectExt
        + BidExt
        + DirectHireExt
        + PaymentExt
        + ReviewExt
        + NotificationExt
        + ActivityExt
        + LearningExt
        + Send
        + Sync
{
}
