use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tokio::time::{sleep, Duration};

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed after {retries} retries: {message}")]
    Exhausted { retries: u32, message: String },
}

/// SMTP relay used for transactional mail.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer").field("from", &self.from).finish()
    }
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self, MailError> {
        let transport = if config.smtp_username.is_empty() {
            // local relay without auth, e.g. mailhog in development
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host).build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
                .credentials(Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                ))
                .build()
        };

        Ok(Mailer {
            transport,
            from: config.smtp_from.clone(),
        })
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        template: &str,
        placeholders: &[(String, String)],
    ) -> Result<(), MailError> {
        if !to_email.contains('@') {
            return Err(MailError::InvalidAddress(to_email.to_string()));
        }

        let html_body = render(template, placeholders);
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from.clone()))?,
            )
            .to(to_email
                .parse()
                .map_err(|_| MailError::InvalidAddress(to_email.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)?;

        self.send_with_retries(to_email, message).await
    }

    async fn send_with_retries(&self, to_email: &str, message: Message) -> Result<(), MailError> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_RETRIES {
            match self.transport.send(message.clone()).await {
                Ok(_) => {
                    tracing::info!("Email sent to {}", to_email);
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < MAX_RETRIES {
                        let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Email send attempt {} failed for {}. Retrying in {}ms...",
                            attempt,
                            to_email,
                            delay
                        );
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        tracing::error!("Email failed for {}: {}", to_email, last_error);
        Err(MailError::Exhausted {
            retries: MAX_RETRIES,
            message: last_error,
        })
    }
}

pub fn render(template: &str, placeholders: &[(String, String)]) -> String {
    placeholders
        .iter()
        .fold(template.to_string(), |html, (key, value)| html.replace(key, value))
}
