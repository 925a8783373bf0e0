use std::future::Future;

use reqwest::Client;
use serde::Serialize;

use crate::config::Config;

/// Outbound mail seam. The newsletter fan-out and the password reset flow
/// only depend on this, so tests can swap in a recording implementation.
pub trait Notifier {
    fn deliver(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> impl Future<Output = Result<(), String>> + Send;
}

#[derive(Serialize)]
struct MailSender {
    name: String,
    email: String,
}

#[derive(Serialize)]
struct MailRecipient {
    email: String,
}

#[derive(Serialize)]
struct MailPayload {
    sender: MailSender,
    to: Vec<MailRecipient>,
    subject: String,
    #[serde(rename = "htmlContent")]
    html_content: String,
}

#[derive(Clone)]
pub struct EmailService {
    client: Client,
    is_enabled: bool,
    api_url: String,
    api_key: String,
    from_email: String,
    frontend_url: String,
}

impl EmailService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            is_enabled: !config.mail_api_key.is_empty(),
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from_email: config.smtp_from.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), String> {
        let reset_link = format!("{}/reset-password?token={}", self.frontend_url, token);

        let subject = "Reset your password";
        let html_body = format!(
            "<h3>Password reset requested</h3>
            <p>Click the link below to choose a new password. The link expires in 30 minutes.</p>
            <a href=\"{}\">Reset password</a>
            <p>If you did not request this, you can ignore this email.</p>",
            reset_link
        );

        self.deliver(to, subject, &html_body).await
    }

    pub fn post_url(&self, slug: &str) -> String {
        format!("{}/blogs/{}", self.frontend_url, slug)
    }

    async fn send_via_api(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
        let payload = MailPayload {
            sender: MailSender {
                name: "Pressroom".to_string(),
                email: self.from_email.clone(),
            },
            to: vec![MailRecipient {
                email: to.to_string(),
            }],
            subject: subject.to_string(),
            html_content: html.to_string(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Request error: {}", e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(format!("Mail API error: {}", error_text))
        }
    }
}

impl Notifier for EmailService {
    async fn deliver(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        if !self.is_enabled {
            tracing::info!(to, subject, "mail delivery disabled, logging instead");
            tracing::debug!(body = html_body, "mail body");
            return Ok(());
        }

        self.send_via_api(to, subject, html_body).await
    }
}
