pub mod activities;
pub mod bids;
pub mod direct_hire;
pub mod freelancers;
pub mod learning_materials;
pub mod notifications;
pub mod payments;
pub mod projects;
pub mod reviews;
pub mod users;
