//! Outgoing mail over SMTP
//!
//! With mail disabled in config, messages are logged instead of sent.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::error::{AppError, AppResult};

/// SMTP mail client
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let from = format!("\"Taskboard\" <{}>", config.from)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid mail from address: {}", e)))?;

        if !config.enabled {
            tracing::warn!("Mail delivery disabled; outgoing mail will be logged");
            return Ok(Self {
                transport: None,
                from,
            });
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::Internal(format!("Invalid SMTP relay: {}", e)))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport: Some(transport),
            from,
        })
    }

    /// Send an HTML message to a single recipient
    pub async fn send_html(&self, to: &str, subject: &str, html: String) -> AppResult<()> {
        let Some(transport) = &self.transport else {
            tracing::info!("[Mail disabled] to={} subject={:?}\n{}", to, subject, html);
            return Ok(());
        };

        let recipient = to
            .parse::<Mailbox>()
            .map_err(|_| AppError::validation("email", "Invalid recipient address"))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::Internal(format!("Failed to build mail: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("Mail delivery failed: {}", e)))?;

        tracing::info!("Mail sent to {}: {}", to, subject);
        Ok(())
    }
}

/// Body of the password-reset OTP mail
pub fn otp_mail(full_name: &str, otp: i32) -> String {
    format!(
        "<p>Hi {},</p>\
         <p>Your password reset code is <strong>{}</strong>.</p>\
         <p>It expires in 10 minutes. If you did not ask for it, ignore this mail.</p>",
        full_name, otp
    )
}

/// Body of the board invitation mail
pub fn board_invite_mail(inviter: &str, board_title: &str, accept_url: &str) -> String {
    format!(
        "<p>{} invited you to join the board <strong>{}</strong>.</p>\
         <p><a href=\"{}\">Accept invitation</a></p>",
        inviter, board_title, accept_url
    )
}
