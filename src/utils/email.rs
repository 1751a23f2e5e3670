use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

use crate::config::email::EmailConfig;
use crate::utils::errors::AppError;

/// Outbound SMTP mailer.
///
/// Callers spawn sends onto the runtime and log failures; delivery is never
/// awaited inside a request handler and a failed send is never surfaced to
/// the client.
#[derive(Clone, Debug)]
pub struct Mailer {
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    #[instrument(skip(self, activation_token))]
    pub async fn send_welcome_email(
        &self,
        to_email: &str,
        to_name: &str,
        activation_token: &str,
    ) -> Result<(), AppError> {
        let html_body = self.welcome_template(to_name, activation_token);
        let text_body = format!(
            "Hi {},\n\n\
             Thanks for signing up for a Marquee account. We're excited to have you on board!\n\n\
             Please send a request to the PUT /v1/users/activated endpoint with the following\n\
             token to activate your account:\n\n\
             {}\n\n\
             Please note that this is a one-time use token and it will expire in 3 days.\n\n\
             Thanks,\n\
             The Marquee Team",
            to_name, activation_token
        );

        self.send_email(to_email, "Welcome to Marquee!", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, activation_token))]
    pub async fn send_activation_token(
        &self,
        to_email: &str,
        to_name: &str,
        activation_token: &str,
    ) -> Result<(), AppError> {
        let html_body = self.activation_template(to_name, activation_token);
        let text_body = format!(
            "Hi {},\n\n\
             Please send a request to the PUT /v1/users/activated endpoint with the following\n\
             token to activate your account:\n\n\
             {}\n\n\
             Please note that this is a one-time use token and it will expire in 3 days.\n\n\
             Thanks,\n\
             The Marquee Team",
            to_name, activation_token
        );

        self.send_email(to_email, "Activate your Marquee account", &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            tracing::info!(to = %to_email, %subject, "email sending disabled, skipping");
            return Ok(());
        }

        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::server_error(anyhow::anyhow!("invalid from email: {e}")))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::server_error(anyhow::anyhow!("invalid to email: {e}")))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email)).await??;

        Ok(())
    }

    fn welcome_template(&self, name: &str, activation_token: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Welcome to Marquee</title></head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif;">
    <h2>Welcome, {name}!</h2>
    <p>Thanks for signing up for a Marquee account. We're excited to have you on board!</p>
    <p>Please send a request to the <code>PUT /v1/users/activated</code> endpoint with the
    following token to activate your account:</p>
    <pre style="background-color: #f4f4f4; padding: 12px;">{activation_token}</pre>
    <p>Please note that this is a one-time use token and it will expire in 3 days.</p>
    <p>Thanks,<br>The Marquee Team</p>
</body>
</html>"#
        )
    }

    fn activation_template(&self, name: &str, activation_token: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Activate your Marquee account</title></head>
<body style="margin: 0; padding: 20px; font-family: Arial, sans-serif;">
    <h2>Hi {name},</h2>
    <p>Please send a request to the <code>PUT /v1/users/activated</code> endpoint with the
    following token to activate your account:</p>
    <pre style="background-color: #f4f4f4; padding: 12px;">{activation_token}</pre>
    <p>Please note that this is a one-time use token and it will expire in 3 days.</p>
    <p>Thanks,<br>The Marquee Team</p>
</body>
</html>"#
        )
    }
}
