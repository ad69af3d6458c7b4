use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::usermodel::{User, UserRole};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    pub role: UserRole,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(equal = 6, message = "Verification code must be 6 digits"))]
    pub otp: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
    pub role: UserRole,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CheckEmailDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmailCheckResponseDto {
    pub status: String,
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountDto {
    pub status: String,
    #[serde(rename = "unreadCount")]
    pub unread_count: i64,
}

/// Name and/or password change. A password change needs the current one.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserUpdateDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[serde(rename = "currentPassword")]
    pub current_password: Option<String>,

    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,

    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password_confirm: &str) -> RegisterUserDto {
        RegisterUserDto {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
            password_confirm: password_confirm.to_string(),
            role: UserRole::Client,
        }
    }

    #[test]
    fn register_requires_matching_passwords() {
        assert!(register("secret1").validate().is_ok());
        assert!(register("secret2").validate().is_err());
    }

    #[test]
    fn role_accepts_both_casings() {
        let dto: LoginUserDto = serde_json::from_str(
            r#"{"email":"a@b.co","password":"secret1","role":"Freelancer"}"#,
        )
        .unwrap();
        assert_eq!(dto.role, UserRole::Freelancer);
    }

    #[test]
    fn update_skips_absent_fields() {
        assert!(UserUpdateDto::default().validate().is_ok());
        let dto = UserUpdateDto {
            new_password: Some("abc".to_string()),
            ..UserUpdateDto::default()
        };
        assert!(dto.validate().is_err());
    }
}
