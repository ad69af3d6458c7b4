use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Credential lifetime in minutes.
    pub jwt_maxage: i64,
    pub client_url: String,
    pub port: u16,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
    pub otp_ttl_seconds: u64,
    pub deadline_sweep_interval_seconds: u64,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let stripe_secret_key = required("STRIPE_SECRET_KEY")?;
        let stripe_webhook_secret = required("STRIPE_WEBHOOK_SECRET")?;

        let jwt_maxage = parsed("JWT_MAXAGE", 60)?;
        let port = parsed("PORT", 8000)?;
        let otp_ttl_seconds = parsed("OTP_TTL_SECONDS", 600)?;
        let deadline_sweep_interval_seconds =
            parsed("DEADLINE_SWEEP_INTERVAL_SECONDS", 24 * 60 * 60)?;

        // Email service configuration (with defaults)
        let smtp_host = or_default("SMTP_HOST", "localhost");
        let smtp_username = or_default("SMTP_USERNAME", "");
        let smtp_password = or_default("SMTP_PASSWORD", "");
        let smtp_from = or_default("SMTP_FROM", "no-reply@localhost");

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            client_url: or_default("CLIENT_URL", "http://localhost:5173"),
            port,
            stripe_secret_key,
            stripe_webhook_secret,
            smtp_host,
            smtp_username,
            smtp_password,
            smtp_from,
            otp_ttl_seconds,
            deadline_sweep_interval_seconds,
        })
    }
}
