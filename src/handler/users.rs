use std::sync::Arc;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        ApiResponse, CheckEmailDto, DeleteAccountDto, EmailCheckResponseDto, FilterUserDto,
        LoginUserDto, RegisterUserDto, Response, UnreadCountDto, UserData, UserListResponseDto,
        UserLoginResponseDto, UserResponseDto, UserUpdateDto, VerifyOtpDto,
    },
    error::{ErrorMessage, HttpError},
    mail::mails::send_otp_email,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::otp_store::PendingRegistration,
    utils::{otp_generator::generate_otp, password, token},
    AppState,
};

pub fn users_handler() -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/login", post(login))
        .route("/check-email", post(check_email));

    Router::new()
        .route("/", get(get_users))
        .route("/me", get(get_me))
        .route("/update", put(update_user))
        .route("/delete", delete(delete_account))
        .route("/check/:id", get(check_user))
        .route("/allfreelancers", get(get_all_freelancers))
        .route("/unread-count", get(get_unread_count))
        .route(
            "/admin/:id",
            delete(admin_delete_user).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route_layer(middleware::from_fn(auth))
        .merge(public)
}

fn token_cookie(token: String, max_age_minutes: i64) -> Result<HeaderMap, HttpError> {
    let cookie = Cookie::build(("token", token))
        .path("/")
        .max_age(time::Duration::minutes(max_age_minutes))
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );
    Ok(headers)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }
    if body.role == UserRole::Admin {
        return Err(HttpError::forbidden("Admin accounts cannot be self-registered"));
    }

    let hashed_password = password::hash(&body.password)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let otp = generate_otp();
    let email = body.email.trim().to_lowercase();
    app_state
        .otp_store
        .put(PendingRegistration {
            code: otp.clone(),
            name: body.name.trim().to_string(),
            email: email.clone(),
            password_hash: hashed_password,
            role: body.role,
        })
        .await;

    let expires_in_minutes = app_state.otp_store.ttl().as_secs() / 60;
    send_otp_email(&app_state.mailer, &email, &body.name, &otp, expires_in_minutes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send verification code to {}: {}", email, e);
            HttpError::server_error("Failed to send verification email")
        })?;

    Ok(Json(Response::success(
        "A verification code has been sent to your email",
    )))
}

pub async fn verify_otp(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<VerifyOtpDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let pending = app_state.otp_store.verify(&body.email, &body.otp).await?;

    let user = app_state
        .db_client
        .save_user(&pending.name, &pending.email, &pending.password_hash, pending.role)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::EmailExist.to_string()))?;

    tracing::info!("User {} registered as {}", user.id, user.role.to_str());
    app_state
        .notification_service
        .log_activity(user.id, "Created an account")
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }
    if user.role != body.role {
        return Err(HttpError::forbidden(format!(
            "This account is not registered as a {}",
            body.role.to_str()
        )));
    }

    let token = token::create_token(
        &user.id.to_string(),
        user.role.to_str(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let headers = token_cookie(token.clone(), app_state.env.jwt_maxage)?;

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}

pub async fn check_email(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CheckEmailDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(EmailCheckResponseDto {
        status: "success".to_string(),
        exists: user.is_some(),
    }))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user.user),
        },
    }))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state
        .db_client
        .get_users()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UserListResponseDto {
        status: "success".to_string(),
        results: users.len(),
        users: FilterUserDto::filter_users(&users),
    }))
}

pub async fn check_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn get_all_freelancers(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let freelancers = app_state
        .db_client
        .get_freelancer_directory()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(freelancers)))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state
        .db_client
        .get_unread_count(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UnreadCountDto {
        status: "success".to_string(),
        unread_count,
    }))
}

pub async fn update_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UserUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.name.is_none() && body.new_password.is_none() {
        return Err(HttpError::bad_request("Nothing to update"));
    }

    let mut current = user.user;

    if let Some(new_password) = &body.new_password {
        let current_password = body
            .current_password
            .as_deref()
            .ok_or_else(|| HttpError::bad_request("Current password is required"))?;

        let password_match = password::compare(current_password, &current.password)
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        if !password_match {
            return Err(HttpError::bad_request("Current password is incorrect"));
        }
        if new_password == current_password {
            return Err(HttpError::bad_request(
                "New password must differ from the current password",
            ));
        }
        if body.confirm_password.as_deref() != Some(new_password.as_str()) {
            return Err(HttpError::bad_request("New passwords do not match"));
        }

        let hash_password = password::hash(new_password)
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        current = app_state
            .db_client
            .update_user_password(current.id, &hash_password)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
    }

    if let Some(name) = &body.name {
        current = app_state
            .db_client
            .update_user_name(current.id, name.trim())
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
    }

    app_state
        .notification_service
        .log_activity(current.id, "Updated account details")
        .await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&current),
        },
    }))
}

pub async fn delete_account(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<DeleteAccountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = user.user;
    if !user.email.eq_ignore_ascii_case(body.email.trim()) {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }
    let password_match = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;
    if !password_match {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    app_state
        .db_client
        .delete_user(user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("User {} deleted their account", user.id);

    let headers = token_cookie(String::new(), 0)?;
    let mut response = Json(Response::success("Account deleted")).into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}

pub async fn admin_delete_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddeware>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    if admin.user.id == user_id {
        return Err(HttpError::bad_request("Admins cannot delete themselves here"));
    }

    let deleted = app_state
        .db_client
        .delete_user(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !deleted {
        return Err(HttpError::not_found("User not found"));
    }

    tracing::info!("Admin {} deleted user {}", admin.user.id, user_id);
    Ok(Json(Response::success("User deleted")))
}
