//! SMTP notifier

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::EmailSettings;
use crate::domain::ports::{EmailTemplate, Notifier};
use crate::{RelayError, Result};

#[derive(Clone)]
pub struct SmtpNotifier {
    settings: EmailSettings,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("smtp_host", &self.settings.smtp_host)
            .field("from_email", &self.settings.from_email)
            .field("enabled", &self.settings.enabled)
            .finish()
    }
}

impl SmtpNotifier {
    pub fn new(settings: &EmailSettings) -> Self {
        Self { settings: settings.clone() }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled && !self.settings.smtp_username.is_empty()
    }

    fn build_message(&self, recipients: &[String], subject: &str, body: String) -> Result<Message> {
        let from: Mailbox = format!("{} <{}>", self.settings.from_name, self.settings.from_email)
            .parse()
            .map_err(|e| RelayError::Notification(format!("invalid from address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(subject).header(ContentType::TEXT_HTML);
        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| RelayError::Notification(format!("invalid recipient {recipient}: {e}")))?;
            builder = builder.to(to);
        }

        builder
            .body(body)
            .map_err(|e| RelayError::Notification(format!("failed to build email: {e}")))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipients: &[String], subject: &str, template: &EmailTemplate) -> Result<()> {
        if recipients.is_empty() {
            return Err(RelayError::Notification("no notification recipients configured".to_string()));
        }
        if !self.is_enabled() {
            info!("Email delivery disabled, skipping \"{}\" to {}", subject, recipients.join(", "));
            return Ok(());
        }

        let email = self.build_message(recipients, subject, render_template(template))?;

        let credentials = Credentials::new(self.settings.smtp_username.clone(), self.settings.smtp_password.clone());
        let mailer: AsyncSmtpTransport<Tokio1Executor> = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.smtp_host)
            .map_err(|e| RelayError::Notification(e.to_string()))?
            .credentials(credentials)
            .port(self.settings.smtp_port)
            .build();

        match mailer.send(email).await {
            Ok(_) => {
                info!("📧 Email sent to {}: {}", recipients.join(", "), subject);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email to {}: {}", recipients.join(", "), e);
                Err(RelayError::Notification(e.to_string()))
            }
        }
    }
}

/// Render email template to HTML
pub fn render_template(template: &EmailTemplate) -> String {
    let (title, content) = match template {
        EmailTemplate::Recovery { orders, reattempt } => {
            let rows: String = orders
                .iter()
                .map(|order| {
                    let invoice = order.invoice_number().as_str();
                    let outcome = match reattempt.get(invoice) {
                        Some(true) => "re-sent",
                        Some(false) => "re-send failed",
                        None => "not re-sent",
                    };
                    format!(
                        r#"<tr><td style="padding: 8px; border: 1px solid #ddd;">{}</td><td style="padding: 8px; border: 1px solid #ddd;">{}</td><td style="padding: 8px; border: 1px solid #ddd;">{}</td><td style="padding: 8px; border: 1px solid #ddd;">{}</td></tr>"#,
                        escape(invoice),
                        order.creation_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
                        escape(order.email.as_deref().unwrap_or("")),
                        outcome
                    )
                })
                .collect();
            (
                "Recovered Snipcart Orders",
                format!(
                    r#"
                    <p>The following orders were not found in ShipStation.</p>
                    <table style="border-collapse: collapse; margin: 20px 0;">
                        <tr><th>Invoice</th><th>Created</th><th>Email</th><th>Re-feed</th></tr>
                        {rows}
                    </table>
                    "#
                ),
            )
        }
    };

    format!(
        r#"
        <!DOCTYPE html>
        <html>
        <head><meta charset="utf-8"><title>{title}</title></head>
        <body style="font-family: sans-serif; color: #333;">
            <h2>{title}</h2>
            {content}
        </body>
        </html>
        "#
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
