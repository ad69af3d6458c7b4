pub mod background_jobs;
pub mod bid_service;
pub mod error;
pub mod notification_service;
pub mod otp_store;
pub mod payment_provider;
pub mod payment_service;
pub mod project_service;
pub mod review_service;
