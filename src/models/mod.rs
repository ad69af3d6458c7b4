pub mod activitymodel;
pub mod bidmodel;
pub mod freelancermodel;
pub mod paymentmodel;
pub mod projectmodel;
pub mod projectstate;
pub mod reviewmodel;
pub mod usermodel;
