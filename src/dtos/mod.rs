pub mod activitydtos;
pub mod biddtos;
pub mod freelancerdtos;
pub mod paymentdtos;
pub mod projectdtos;
pub mod reviewdtos;
pub mod userdtos;

pub use activitydtos::*;
pub use biddtos::*;
pub use freelancerdtos::*;
pub use paymentdtos::*;
pub use projectdtos::*;
pub use reviewdtos::*;
pub use userdtos::*;

use serde::Serialize;

/// `{"status":"success","data":...}` envelope shared by most routes.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            status: "success",
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: "success",
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Response {
            status: "success",
            message: message.into(),
        }
    }
}
