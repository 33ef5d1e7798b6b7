use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

pub fn verification_email(frontend_url: &str, to: &str, token: &str) -> Email {
    let link = format!(
        "{}/verify-email?token={}",
        frontend_url.trim_end_matches('/'),
        token
    );
    let html = format!(
        r#"<html>
<body>
    <h2>Welcome to Meal Planner!</h2>
    <p>Please verify your email by clicking the button below:</p>
    <a href="{link}" style="background-color:#4CAF50;color:white;padding:10px 20px;text-decoration:none;border-radius:5px;">Verify Email</a>
</body>
</html>"#
    );
    Email {
        to: to.to_string(),
        subject: "Email Verification".into(),
        html,
    }
}

/// Brevo `/v3/smtp/email` client.
pub struct BrevoMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl BrevoMailer {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct Contact<'a> {
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendSmtpEmail<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let body = SendSmtpEmail {
            sender: Contact {
                name: Some(&self.config.sender_name),
                email: &self.config.sender_email,
            },
            to: vec![Contact {
                name: None,
                email: &email.to,
            }],
            subject: &email.subject,
            html_content: &email.html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Status { status, body });
        }

        debug!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}

/// Used when no email provider is configured: the message is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, html = %email.html, "email delivery disabled");
        Ok(())
    }
}
