//! Email delivery over SMTP using lettre
//!
//! Message composition lives here; queuing and scheduling live in `jobs`.

use crate::config::SmtpConfig;
use anyhow::{anyhow, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::SmtpTransport;
use lettre::{Message, Transport};
use std::sync::Arc;

pub struct EmailService {
    config: Arc<SmtpConfig>,
}

impl EmailService {
    pub fn new(config: SmtpConfig) -> Self {
        EmailService {
            config: Arc::new(config),
        }
    }

    fn create_transport(&self) -> Result<SmtpTransport> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        let mailer = SmtpTransport::builder_dangerous(&self.config.host)
            .port(self.config.port)
            .credentials(creds)
            .build();

        Ok(mailer)
    }

    /// Welcome mail sent after registration.
    pub fn send_registration_email(&self, to_email: &str, username: &str) -> Result<()> {
        let body = format!(
            "Thank you for registering, {username}.\n\
             Welcome to our site dedicated to notable people."
        );
        self.send_plain(to_email, "Welcome", &body)
    }

    /// Password-reset mail; subject and body are composed by the caller.
    pub fn send_password_reset_email(
        &self,
        to_email: &str,
        subject: &str,
        message: &str,
    ) -> Result<()> {
        self.send_plain(to_email, subject, message)
    }

    /// Daily greeting broadcast mail.
    pub fn send_greeting_email(
        &self,
        to_email: &str,
        username: &str,
        person_title: &str,
    ) -> Result<()> {
        let subject = format!("Greetings from {person_title}");
        let body = greeting_message(username, person_title);
        self.send_plain(to_email, &subject, &body)
    }

    fn send_plain(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        if to_email.is_empty() {
            return Err(anyhow!("Recipient email cannot be empty"));
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| anyhow!("Invalid from email address: {}", e))?;

        let to = to_email
            .parse()
            .map_err(|e| anyhow!("Invalid to email address: {}", e))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| anyhow!("Failed to build email message: {}", e))?;

        let mailer = self.create_transport()?;

        mailer
            .send(&message)
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }

    /// Check whether SMTP credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.config.username.is_empty()
            && !self.config.password.is_empty()
            && !self.config.host.is_empty()
    }
}

/// Body of the greeting mail, separate for testability.
pub fn greeting_message(username: &str, person_title: &str) -> String {
    format!("{username}, {person_title} says hello!")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@luminaries.dev".to_string(),
            from_name: "Luminaries Team".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn test_service_without_credentials_is_unconfigured() {
        let service = EmailService::new(test_config());
        assert!(!service.is_configured());
    }

    #[test]
    fn test_greeting_message() {
        assert_eq!(
            greeting_message("anna", "Marie Curie"),
            "anna, Marie Curie says hello!"
        );
    }
}
