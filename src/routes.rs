use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::{
    dtos::Response,
    handler::{
        activities::activities_handler, bids::bids_handler, direct_hire::direct_hire_handler,
        freelancers::freelancers_handler, learning_materials::learning_materials_handler,
        notifications::notifications_handler, payments::payments_handler,
        projects::projects_handler, reviews::reviews_handler, users::users_handler,
    },
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/users", users_handler())
        .nest("/freelancers", freelancers_handler())
        .nest("/projects", projects_handler())
        .nest("/bids", bids_handler())
        .nest("/direct-hire", direct_hire_handler())
        .nest("/payments", payments_handler())
        .nest("/reviews", reviews_handler())
        .nest("/notifications", notifications_handler())
        .nest("/activities", activities_handler())
        .nest("/learning-materials", learning_materials_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/api/healthchecker", get(health_checker))
        .nest("/api", api_route)
}

async fn health_checker() -> impl IntoResponse {
    Json(Response::success("Freelance marketplace API is running"))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config,
        db::{memory::MemoryStore, FreelancerExt, MarketStore, UserExt},
        mail::sendmail::Mailer,
        models::usermodel::{User, UserRole},
        service::payment_provider::fake::FakeGateway,
        utils::{password, token},
    };

    const SECRET: &str = "router-test-secret";

    fn test_config() -> Config {
        Config {
            database_url: "postgres://unused".to_string(),
            jwt_secret: SECRET.to_string(),
            jwt_maxage: 60,
            client_url: "http://localhost:5173".to_string(),
            port: 8000,
            stripe_secret_key: "sk_test".to_string(),
            stripe_webhook_secret: "whsec_test".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: "no-reply@localhost".to_string(),
            otp_ttl_seconds: 600,
            deadline_sweep_interval_seconds: 86_400,
        }
    }

    fn app() -> (Router, Arc<MemoryStore>) {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let db: Arc<dyn MarketStore> = store.clone();
        let mailer = Mailer::from_config(&config).unwrap();
        let state = AppState::new(config, db, Arc::new(FakeGateway::default()), mailer);
        (create_router(Arc::new(state)), store)
    }

    async fn signed_in(store: &MemoryStore, role: UserRole) -> (User, String) {
        let email = format!("{}@example.com", uuid::Uuid::new_v4());
        let user = store
            .save_user("Tester", &email, "hashed", role)
            .await
            .unwrap()
            .unwrap();
        let token =
            token::create_token(&user.id.to_string(), role.to_str(), SECRET.as_bytes(), 60).unwrap();
        (user, token)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let (app, _) = app();
        let response = app
            .oneshot(request(Method::GET, "/api/healthchecker", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_valid_token() {
        let (app, _) = app();

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/projects", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["status"], "fail");

        let response = app
            .oneshot(request(Method::GET, "/api/projects", Some("garbage"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_token_resolves_the_caller() {
        let (app, store) = app();
        let (user, token) = signed_in(&store, UserRole::Client).await;

        let response = app
            .oneshot(request(Method::GET, "/api/users/me", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["user"]["email"], user.email.as_str());
        assert_eq!(body["data"]["user"]["role"], "client");
    }

    #[tokio::test]
    async fn role_checks_guard_admin_and_client_routes() {
        let (app, store) = app();
        let (client, client_token) = signed_in(&store, UserRole::Client).await;
        let (_, freelancer_token) = signed_in(&store, UserRole::Freelancer).await;

        let response = app
            .clone()
            .oneshot(request(
                Method::DELETE,
                &format!("/api/users/admin/{}", client.id),
                Some(&client_token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let project = json!({
            "title": "Landing page",
            "description": "One page",
            "budget": 100.0,
            "deadline": Utc::now() + Duration::days(7),
        });
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/projects/create",
                Some(&freelancer_token),
                Some(project.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/projects/create",
                Some(&client_token),
                Some(project),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["escrowStatus"], "Not Funded");
    }

    #[tokio::test]
    async fn service_errors_map_to_status_codes() {
        let (app, store) = app();
        let (_, token) = signed_in(&store, UserRole::Client).await;

        let response = app
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/projects/{}", uuid::Uuid::new_v4()),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/bids/00000000-0000-0000-0000-000000000000/bid",
                Some(&token),
                Some(json!({"amount": 10.0})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn webhook_is_public_but_signed() {
        let (app, _) = app();
        let event = json!({
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1", "metadata": {
                "projectId": uuid::Uuid::new_v4().to_string(),
                "action": "create-payment-intent"
            }}}
        });

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/payments/webhook", None, Some(event.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut signed = request(Method::POST, "/api/payments/webhook", None, Some(event));
        signed
            .headers_mut()
            .insert("Stripe-Signature", "valid".parse().unwrap());
        let response = app.oneshot(signed).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn learning_materials_are_public_to_read_admin_to_write() {
        let (app, store) = app();
        let (_, client_token) = signed_in(&store, UserRole::Client).await;
        let (_, admin_token) = signed_in(&store, UserRole::Admin).await;
        let material = json!({"title": "Escrow 101", "link": "https://example.com/escrow"});

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/learning-materials", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/learning-materials",
                Some(&client_token),
                Some(material.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/learning-materials",
                Some(&admin_token),
                Some(material),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn freelancer_can_delete_own_profile_and_account() {
        let (app, store) = app();
        let hashed = password::hash("correct-horse").unwrap();
        let freelancer = store
            .save_user("Xavier", "xavier@example.com", &hashed, UserRole::Freelancer)
            .await
            .unwrap()
            .unwrap();
        store
            .create_freelancer_information(freelancer.id, vec!["rust".to_string()], "", "")
            .await
            .unwrap();
        let token = token::create_token(
            &freelancer.id.to_string(),
            UserRole::Freelancer.to_str(),
            SECRET.as_bytes(),
            60,
        )
        .unwrap();
        let (_, client_token) = signed_in(&store, UserRole::Client).await;

        let response = app
            .clone()
            .oneshot(request(
                Method::DELETE,
                "/api/freelancers/delete",
                Some(&client_token),
                Some(json!({"email": "someone@example.com", "password": "whatever"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(request(
                Method::DELETE,
                "/api/freelancers/delete",
                Some(&token),
                Some(json!({"email": "xavier@example.com", "password": "wrong-horse"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                Method::DELETE,
                "/api/freelancers/delete",
                Some(&token),
                Some(json!({"email": "xavier@example.com", "password": "correct-horse"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store
            .get_freelancer_information(freelancer.id)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_user(Some(freelancer.id), None)
            .await
            .unwrap()
            .is_none());
    }
}
