use super::sendmail::{MailError, Mailer};

const OTP_TEMPLATE: &str = include_str!("templates/OTP-email.html");

pub async fn send_otp_email(
    mailer: &Mailer,
    to_email: &str,
    name: &str,
    otp_code: &str,
    expires_in_minutes: u64,
) -> Result<(), MailError> {
    let subject = "Your verification code";
    let placeholders = vec![
        ("{{name}}".to_string(), name.to_string()),
        ("{{otp_code}}".to_string(), otp_code.to_string()),
        ("{{expires_in}}".to_string(), expires_in_minutes.to_string()),
    ];

    mailer
        .send_email(to_email, subject, OTP_TEMPLATE, &placeholders)
        .await
}
