mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::{sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{DBClient, MarketStore};
use dotenv::dotenv;
use mail::sendmail::Mailer;
use routes::create_router;
use service::{
    background_jobs::start_deadline_sweep_job,
    bid_service::BidService,
    notification_service::NotificationService,
    otp_store::OtpStore,
    payment_provider::{PaymentGateway, StripeGateway},
    payment_service::PaymentService,
    project_service::ProjectService,
    review_service::ReviewService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn MarketStore>,
    pub mailer: Mailer,
    pub otp_store: OtpStore,
    pub notification_service: Arc<NotificationService>,
    pub project_service: ProjectService,
    pub bid_service: BidService,
    pub review_service: ReviewService,
    pub payment_service: PaymentService,
}

impl AppState {
    pub fn new(
        env: Config,
        db_client: Arc<dyn MarketStore>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Mailer,
    ) -> Self {
        let notification_service = Arc::new(NotificationService::new(db_client.clone()));
        let otp_store = OtpStore::new(Duration::from_secs(env.otp_ttl_seconds));

        AppState {
            project_service: ProjectService::new(db_client.clone(), notification_service.clone()),
            bid_service: BidService::new(db_client.clone(), notification_service.clone()),
            review_service: ReviewService::new(db_client.clone(), notification_service.clone()),
            payment_service: PaymentService::new(
                db_client.clone(),
                gateway,
                notification_service.clone(),
            ),
            notification_service,
            otp_store,
            mailer,
            db_client,
            env,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("🔥 Failed to run migrations: {:?}", err);
        std::process::exit(1);
    }

    let mailer = match Mailer::from_config(&config) {
        Ok(mailer) => mailer,
        Err(err) => {
            tracing::error!("🔥 Failed to configure the mail transport: {}", err);
            std::process::exit(1);
        }
    };

    let allowed_origins: Vec<HeaderValue> = [config.client_url.as_str(), "http://localhost:5173"]
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let db_client: Arc<dyn MarketStore> = Arc::new(DBClient::new(pool));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeGateway::new(&config));
    let app_state = Arc::new(AppState::new(config.clone(), db_client, gateway, mailer));

    tokio::spawn(start_deadline_sweep_job(app_state.clone()));

    let app = create_router(app_state).layer(cors);

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("🔥 Server error: {}", err);
    }
}
